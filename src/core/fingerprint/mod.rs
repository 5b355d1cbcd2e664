//! # Fingerprint Module
//!
//! Content digests for exact-duplicate detection.
//!
//! The digest is XXH3-128 over the complete file bytes. It is stable across
//! runs and platforms and collision-resistant enough for deduplication; it
//! is not a cryptographic hash.
//!
//! Files of 1 MiB and above are memory-mapped and hashed in one pass; smaller
//! files are streamed through a fixed buffer. XXH3's streaming and one-shot
//! forms produce the same digest, so the read strategy never affects the
//! result.

use crate::error::FileError;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use xxhash_rust::xxh3::{xxh3_128, Xxh3};

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read buffer for the streaming path
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Longest path we try to open
#[cfg(windows)]
pub const MAX_PATH_LEN: usize = 260;
#[cfg(not(windows))]
pub const MAX_PATH_LEN: usize = 4096;

/// 128-bit content digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Digest of an in-memory byte slice
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(xxh3_128(bytes))
    }

    /// Raw digest value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// 32 lowercase hex characters
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }

    /// Leading `len` hex characters (clamped to 32)
    pub fn hex_prefix(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.min(32));
        hex
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Length of a path in the units the platform limit is expressed in
fn path_length(path: &Path) -> usize {
    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        path.as_os_str().encode_wide().count()
    }

    #[cfg(not(windows))]
    {
        path.as_os_str().len()
    }
}

/// Reject paths the platform cannot open.
pub fn check_path_length(path: &Path) -> Result<(), FileError> {
    let length = path_length(path);
    if length > MAX_PATH_LEN {
        return Err(FileError::PathTooLong {
            path: path.to_path_buf(),
            length,
            limit: MAX_PATH_LEN,
        });
    }
    Ok(())
}

/// Fingerprint the full contents of the file at `path`.
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint, FileError> {
    check_path_length(path)?;

    let hash_failure = |source| FileError::HashFailure {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(hash_failure)?;
    let len = file.metadata().map_err(hash_failure)?.len();

    if len >= MMAP_THRESHOLD {
        // SAFETY: the mapping is read-only and lives only for this call,
        // while we hold the file handle.
        let mmap = unsafe { Mmap::map(&file) }.map_err(hash_failure)?;
        return Ok(Fingerprint::of_bytes(&mmap));
    }

    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(hash_failure(e)),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(Fingerprint(hasher.digest128()))
}
