use super::{FileSystem, FileType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// In-memory file tree. Relative paths are placed under the mock root.
pub struct MockFileSystem {
    entries: RwLock<HashMap<PathBuf, FileType>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let fs = Self {
            entries: RwLock::new(HashMap::new()),
            root,
        };
        let root = fs.root.clone();
        fs.add_dir(root);
        fs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut entries = self.entries.write();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut entries, parent);
        }
        entries.insert(path, FileType::File);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut entries = self.entries.write();
        Self::ensure_parents(&mut entries, &path);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parents(entries: &mut HashMap<PathBuf, FileType>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            entries
                .entry(current.clone())
                .or_insert(FileType::Directory);
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn file_type(&self, path: &Path) -> Option<FileType> {
        let path = self.normalize_path(path);
        self.entries.read().get(&path).copied()
    }
}
