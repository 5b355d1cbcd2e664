//! "Media created" date from ISO base media files (MP4, MOV, 3GP).
//!
//! The creation time lives in the movie header box, `moov/mvhd`, as seconds
//! since 1904-01-01 UTC. Only box headers are read on the way there, so the
//! cost is a handful of seeks regardless of file size.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Seconds between 1904-01-01 and 1970-01-01
const QUICKTIME_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Extensions that use the ISO base media box layout
pub const ISO_BMFF_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "qt", "3gp", "3g2"];

/// Read the movie creation time of the file at `path`.
///
/// Returns `None` for other containers, unreadable files, and for the
/// zero timestamp encoders write when they do not know the date.
pub fn media_created(path: &Path) -> Option<DateTime<Utc>> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !ISO_BMFF_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }

    let mut file = File::open(path).ok()?;
    let len = file.metadata().ok()?.len();
    read_media_created(&mut file, len)
}

/// Walk `moov/mvhd` in any seekable reader of `len` bytes.
pub fn read_media_created<R: Read + Seek>(reader: &mut R, len: u64) -> Option<DateTime<Utc>> {
    let (moov_start, moov_end) = find_box(reader, 0, len, b"moov")?;
    let (mvhd_start, _) = find_box(reader, moov_start, moov_end, b"mvhd")?;

    reader.seek(SeekFrom::Start(mvhd_start)).ok()?;
    let mut version_and_flags = [0u8; 4];
    reader.read_exact(&mut version_and_flags).ok()?;

    let seconds = if version_and_flags[0] == 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).ok()?;
        u64::from_be_bytes(buf)
    } else {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).ok()?;
        u64::from(u32::from_be_bytes(buf))
    };

    if seconds == 0 {
        return None;
    }

    let unix = i64::try_from(seconds).ok()? - QUICKTIME_EPOCH_OFFSET;
    DateTime::from_timestamp(unix, 0)
}

/// Find the first box of `kind` between `start` and `end`.
///
/// Returns the payload range (after the header).
fn find_box<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    kind: &[u8; 4],
) -> Option<(u64, u64)> {
    let mut pos = start;

    while pos.checked_add(8)? <= end {
        reader.seek(SeekFrom::Start(pos)).ok()?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header).ok()?;

        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let (header_len, size) = match size32 {
            // 64-bit "largesize" follows the type
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large).ok()?;
                (16, u64::from_be_bytes(large))
            }
            // box runs to the end of its parent
            0 => (8, end - pos),
            n => (8, u64::from(n)),
        };

        if size < header_len {
            return None;
        }

        if &header[4..8] == kind {
            return Some((pos + header_len, pos.checked_add(size)?.min(end)));
        }

        pos = pos.checked_add(size)?;
    }

    None
}
