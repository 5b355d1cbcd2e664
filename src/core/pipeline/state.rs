//! Per-file lifecycle tracking.

use crate::error::FailureKind;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a file is in its trip through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Discovered,
    SizeChecked,
    SkippedSmall,
    Hashed,
    DuplicateRecorded,
    DateResolved,
    Classified,
    PreviewRecorded,
    Copied,
    AttributesApplied,
    Recorded,
    Failed(FailureKind),
}

impl FileState {
    /// No further transitions are allowed
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FileState::Recorded
                | FileState::PreviewRecorded
                | FileState::SkippedSmall
                | FileState::DuplicateRecorded
                | FileState::Failed(_)
        )
    }

    fn can_fail(self) -> bool {
        matches!(
            self,
            FileState::Discovered
                | FileState::SizeChecked
                | FileState::Hashed
                | FileState::DateResolved
                | FileState::Classified
        )
    }

    /// Whether `self -> next` is a legal edge
    pub fn allows(self, next: FileState) -> bool {
        use FileState::*;

        if let Failed(_) = next {
            return self.can_fail();
        }

        matches!(
            (self, next),
            (Discovered, SizeChecked)
                | (SizeChecked, SkippedSmall)
                | (SizeChecked, Hashed)
                | (Hashed, DuplicateRecorded)
                | (Hashed, DateResolved)
                | (DateResolved, Classified)
                | (Classified, PreviewRecorded)
                | (Classified, Copied)
                | (Copied, AttributesApplied)
                | (AttributesApplied, Recorded)
        )
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileState::Failed(kind) => write!(f, "Failed({kind:?})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A transition the state machine does not allow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition {from} -> {to} for {path}")]
pub struct IllegalTransition {
    pub path: PathBuf,
    pub from: FileState,
    pub to: FileState,
}

/// Follows one file through [`FileState`]s.
#[derive(Debug, Clone)]
pub struct FileTracker {
    path: PathBuf,
    state: FileState,
}

impl FileTracker {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: FileState::Discovered,
        }
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    /// Move to `next`, or refuse and stay put.
    pub fn advance(&mut self, next: FileState) -> Result<(), IllegalTransition> {
        if !self.state.allows(next) {
            return Err(IllegalTransition {
                path: self.path.clone(),
                from: self.state,
                to: next,
            });
        }

        tracing::trace!(path = %self.path.display(), from = %self.state, to = %next, "file state");
        self.state = next;
        Ok(())
    }

    /// Walk a sequence of states; stops at the first illegal one.
    pub fn advance_through(&mut self, states: &[FileState]) -> Result<(), IllegalTransition> {
        states.iter().try_for_each(|state| self.advance(*state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FileState::*;

    #[test]
    fn unique_live_file_walks_the_full_path() {
        let mut tracker = FileTracker::new(Path::new("/card/a.jpg"));
        tracker
            .advance_through(&[
                SizeChecked,
                Hashed,
                DateResolved,
                Classified,
                Copied,
                AttributesApplied,
                Recorded,
            ])
            .unwrap();
        assert!(tracker.state().is_terminal());
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [
            Recorded,
            PreviewRecorded,
            SkippedSmall,
            DuplicateRecorded,
            Failed(FailureKind::CopyFailure),
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.allows(SizeChecked));
            assert!(!terminal.allows(Failed(FailureKind::HashFailure)));
        }
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let mut tracker = FileTracker::new(Path::new("/card/a.jpg"));
        tracker.advance(SizeChecked).unwrap();

        let err = tracker.advance(DateResolved).unwrap_err();

        assert_eq!(err.from, SizeChecked);
        assert_eq!(tracker.state(), SizeChecked);
    }

    #[test]
    fn no_state_is_reentrant() {
        let mut tracker = FileTracker::new(Path::new("/card/a.jpg"));
        tracker.advance(SizeChecked).unwrap();
        assert!(tracker.advance(SizeChecked).is_err());
    }

    #[test]
    fn copied_files_cannot_fail() {
        // attribute problems after a copy are warnings, not failures
        assert!(!Copied.allows(Failed(FailureKind::AttributePreservationFailure)));
        assert!(Classified.allows(Failed(FailureKind::CopyFailure)));
    }
}
