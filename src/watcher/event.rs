use std::path::PathBuf;

/// A classified filesystem change for a supported source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The file was created or its content changed.
    Changed(PathBuf),
    /// The file no longer exists.
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &PathBuf {
        match self {
            WatchEvent::Changed(p) | WatchEvent::Removed(p) => p,
        }
    }
}
