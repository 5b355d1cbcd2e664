//! Timestamp and attribute restoration on copied files.

use crate::core::scanner::FileAttributes;
use chrono::{DateTime, Local};
use filetime::FileTime;
use std::path::Path;
use std::time::SystemTime;

/// Set access, modification and (where the platform allows) creation time.
///
/// Filesystems store one UTC instant per timestamp, so writing it once
/// serves readers of both the local and the UTC form.
pub fn apply_timestamps(
    path: &Path,
    created: DateTime<Local>,
    modified: DateTime<Local>,
    accessed: SystemTime,
) -> std::io::Result<()> {
    let mtime = FileTime::from_system_time(SystemTime::from(modified));
    let atime = FileTime::from_system_time(accessed);
    filetime::set_file_times(path, atime, mtime)?;

    set_creation_time(path, SystemTime::from(created))
}

#[cfg(windows)]
fn set_creation_time(path: &Path, created: SystemTime) -> std::io::Result<()> {
    use std::fs::{FileTimes, OpenOptions};
    use std::os::windows::fs::FileTimesExt;

    let file = OpenOptions::new().write(true).open(path)?;
    file.set_times(FileTimes::new().set_created(created))
}

#[cfg(not(windows))]
fn set_creation_time(_path: &Path, _created: SystemTime) -> std::io::Result<()> {
    // Birth time is not settable here; the modification time carries the date.
    Ok(())
}

/// Make a freshly copied file writable so its timestamps can be set.
pub fn ensure_writable(path: &Path) -> std::io::Result<()> {
    #[cfg(windows)]
    {
        let mut perms = std::fs::metadata(path)?.permissions();
        if perms.readonly() {
            perms.set_readonly(false);
            std::fs::set_permissions(path, perms)?;
        }
        Ok(())
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let perms = std::fs::metadata(path)?.permissions();
        let mode = perms.mode();
        if mode & 0o200 == 0 {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode | 0o200))?;
        }
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = path;
        Ok(())
    }
}

/// Restore permission bits / attribute flags. Read-only lands last.
pub fn apply_attributes(path: &Path, attributes: &FileAttributes) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if let Some(mode) = attributes.mode {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
        }
        Ok(())
    }

    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{
            SetFileAttributesW, FILE_ATTRIBUTE_ARCHIVE, FILE_ATTRIBUTE_HIDDEN,
            FILE_ATTRIBUTE_NORMAL, FILE_ATTRIBUTE_READONLY, FILE_ATTRIBUTE_SYSTEM,
        };

        let Some(flags) = attributes.windows_flags else {
            return Ok(());
        };
        let settable = FILE_ATTRIBUTE_READONLY
            | FILE_ATTRIBUTE_HIDDEN
            | FILE_ATTRIBUTE_SYSTEM
            | FILE_ATTRIBUTE_ARCHIVE;
        let mut flags = flags & settable;
        if flags == 0 {
            flags = FILE_ATTRIBUTE_NORMAL;
        }

        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: `wide` is a NUL-terminated UTF-16 path that outlives the call.
        let ok = unsafe { SetFileAttributesW(wide.as_ptr(), flags) };
        if ok == 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (path, attributes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn timestamps_are_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("copy.jpg");
        fs::write(&path, b"bytes").unwrap();

        let created = Local.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap();
        let modified = Local.with_ymd_and_hms(2020, 1, 2, 10, 0, 0).unwrap();
        let accessed: SystemTime = Local.with_ymd_and_hms(2021, 5, 5, 5, 5, 5).unwrap().into();

        apply_timestamps(&path, created, modified, accessed).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert_eq!(meta.modified().unwrap(), SystemTime::from(modified));
        assert_eq!(
            FileTime::from_last_access_time(&meta),
            FileTime::from_system_time(accessed)
        );
    }

    #[cfg(unix)]
    #[test]
    fn read_only_mode_is_restored_after_ensure_writable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("copy.jpg");
        fs::write(&path, b"bytes").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

        ensure_writable(&path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);

        let attributes = FileAttributes {
            mode: Some(0o444),
            ..Default::default()
        };
        apply_attributes(&path, &attributes).unwrap();

        assert!(fs::metadata(&path).unwrap().permissions().readonly());
    }
}
