//! Copier: moves bytes into the destination layout.

use super::attributes::{apply_attributes, apply_timestamps, ensure_writable};
use super::types::{CopyReport, Placement};
use crate::core::metadata::ResolvedDate;
use crate::core::scanner::MediaFile;
use crate::error::FileError;
use std::fs;
use std::path::{Path, PathBuf};

/// Copies unique files into `<root>/<Category>/<YYYY-MM>/<name>`.
///
/// Bytes go to a hidden `.partial` sibling first and are renamed into
/// place, so an interrupted copy never leaves a truncated file under its
/// final name.
pub struct OrganizeExecutor {
    root: PathBuf,
    preview: bool,
}

impl OrganizeExecutor {
    /// Executor writing under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            preview: false,
        }
    }

    /// Preview mode: report destinations, write nothing
    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Absolute destination for a placement
    pub fn destination_for(&self, placement: &Placement) -> PathBuf {
        self.root.join(placement.relative_path())
    }

    /// Copy `file` to its placement and restore its dates and attributes.
    ///
    /// Directory and copy failures are errors. Restoration failures are
    /// returned as warnings inside `CopyReport::Copied`; the copy stands.
    pub fn transfer(
        &self,
        file: &MediaFile,
        date: &ResolvedDate,
        placement: &Placement,
    ) -> Result<CopyReport, FileError> {
        let destination = self.destination_for(placement);

        if self.preview {
            return Ok(CopyReport::Planned { destination });
        }

        let copy_failure = |source: std::io::Error| FileError::CopyFailure {
            source_path: file.path.clone(),
            destination: destination.clone(),
            source,
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| FileError::DirectoryCreateFailure {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        if destination.exists() {
            return Err(copy_failure(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "destination already exists",
            )));
        }

        let staging = staging_path(&destination);
        if let Err(e) = fs::copy(&file.path, &staging) {
            let _ = fs::remove_file(&staging);
            return Err(copy_failure(e));
        }

        if let Err(e) = fs::rename(&staging, &destination) {
            let _ = fs::remove_file(&staging);
            return Err(copy_failure(e));
        }

        let warnings = restore(file, date, &destination)
            .into_iter()
            .map(|warning| {
                tracing::warn!(%warning, "attribute preservation failed");
                warning.to_string()
            })
            .collect();

        tracing::debug!(
            source = %file.path.display(),
            destination = %destination.display(),
            "copied"
        );

        Ok(CopyReport::Copied {
            destination,
            warnings,
        })
    }
}

/// `<dir>/.<name>.partial`
fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.partial"))
}

/// Reapply dates and attributes; every failure becomes a warning.
fn restore(file: &MediaFile, date: &ResolvedDate, destination: &Path) -> Vec<FileError> {
    let mut warnings = Vec::new();
    let warn = |what: &'static str, source: std::io::Error| FileError::AttributePreservationFailure {
        path: destination.to_path_buf(),
        what,
        source,
    };

    if let Err(e) = ensure_writable(destination) {
        warnings.push(warn("write permission", e));
    }

    if let Err(e) = apply_timestamps(destination, date.created, date.modified, file.accessed) {
        warnings.push(warn("timestamps", e));
    }

    if let Err(e) = apply_attributes(destination, &file.attributes) {
        warnings.push(warn("attributes", e));
    }

    warnings
}
