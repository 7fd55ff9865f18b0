//! FileSystem trait definition

use std::path::Path;

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Other,
}

/// Read-only view of the file system used by project detection.
///
/// Detection never mutates anything, so the trait only answers type queries.
pub trait FileSystem: Send + Sync {
    /// Type of the entry at `path`, `None` if it does not exist
    fn file_type(&self, path: &Path) -> Option<FileType>;

    fn is_file(&self, path: &Path) -> bool {
        self.file_type(path) == Some(FileType::File)
    }
}
