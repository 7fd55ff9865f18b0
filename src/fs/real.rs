use super::{FileSystem, FileType};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn file_type(&self, path: &Path) -> Option<FileType> {
        let meta = fs::metadata(path).ok()?;

        Some(if meta.is_file() {
            FileType::File
        } else if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::Other
        })
    }
}
