//! Integration tests for what a copy carries over from its source.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::{Local, TimeZone};
use filetime::FileTime;
use media_ingest::core::metadata::{DateField, MetadataProvider};
use media_ingest::core::pipeline::Pipeline;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

struct NoMetadata;

impl MetadataProvider for NoMetadata {
    fn capture_date(&self, _path: &Path, _field: DateField) -> Option<String> {
        None
    }
}

fn ingest(source: &Path, destination: &Path) -> Vec<PathBuf> {
    let result = Pipeline::builder()
        .source(source)
        .destination(destination)
        .metadata_provider(Arc::new(NoMetadata))
        .min_file_size(1)
        .build()
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(result.summary().errors, 0);

    let mut copied = Vec::new();
    let mut pending = vec![destination.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                copied.push(path);
            }
        }
    }
    copied
}

fn at(y: i32, m: u32, d: u32) -> SystemTime {
    Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().into()
}

#[test]
fn source_is_left_untouched() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let photo = src.child("IMG_0001.jpg");
    photo.write_binary(b"original pixels").unwrap();
    filetime::set_file_mtime(photo.path(), FileTime::from_system_time(at(2018, 8, 8))).unwrap();

    ingest(src.path(), dest.path());

    photo.assert(predicate::path::exists());
    photo.assert("original pixels");
    assert_eq!(fs::metadata(photo.path()).unwrap().modified().unwrap(), at(2018, 8, 8));
}

#[test]
fn copy_keeps_modification_and_access_times() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let photo = src.child("IMG_0002.jpg");
    photo.write_binary(b"pixels").unwrap();
    filetime::set_file_times(
        photo.path(),
        FileTime::from_system_time(at(2021, 2, 3)),
        FileTime::from_system_time(at(2020, 5, 6)),
    )
    .unwrap();

    let copied = ingest(src.path(), dest.path());

    assert_eq!(copied.len(), 1);
    let meta = fs::metadata(&copied[0]).unwrap();
    assert_eq!(meta.modified().unwrap(), at(2020, 5, 6));
    assert_eq!(
        FileTime::from_last_access_time(&meta),
        FileTime::from_system_time(at(2021, 2, 3))
    );
    dest.child("Images/2020-05").assert(predicate::path::is_dir());
}

#[cfg(unix)]
#[test]
fn copy_keeps_permission_bits() {
    use std::os::unix::fs::PermissionsExt;

    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let photo = src.child("IMG_0003.jpg");
    photo.write_binary(b"pixels").unwrap();
    fs::set_permissions(photo.path(), fs::Permissions::from_mode(0o440)).unwrap();

    let copied = ingest(src.path(), dest.path());

    let mode = fs::metadata(&copied[0]).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o440);
}
