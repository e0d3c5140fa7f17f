//! File storage for staged bundles and category images

pub mod disk;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

use crate::error::Result;

pub use disk::DiskFileStore;

/// Which set of files a scope belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileArea {
    /// Unpacked import bundles, keyed by a staging id
    Import,
    /// Category images, keyed by category id
    Images,
}

impl FileArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileArea::Import => "import",
            FileArea::Images => "images",
        }
    }
}

/// A file area plus the item id inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileScope {
    pub area: FileArea,
    pub item_id: i64,
}

impl FileScope {
    pub fn staging(item_id: i64) -> Self {
        Self {
            area: FileArea::Import,
            item_id,
        }
    }

    pub fn images(category_id: i64) -> Self {
        Self {
            area: FileArea::Images,
            item_id: category_id,
        }
    }
}

impl fmt::Display for FileScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.area.as_str(), self.item_id)
    }
}

/// Attribution attached to an image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub source: String,
    pub author: String,
    /// License short name (e.g. `cc-4.0`)
    pub license: String,
}

/// A file (or directory entry) held by a [`FileStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub scope: FileScope,
    /// Directory path, always starting and ending with `/`
    pub filepath: String,
    /// File name; `.` for directory entries
    pub filename: String,
    pub is_directory: bool,
    /// Hex encoded sha256 of the content (empty for directories)
    pub content_hash: String,
    pub metadata: Option<FileMetadata>,
}

impl StoredFile {
    /// Full logical path, e.g. `/icons/star.svg`
    pub fn logical_path(&self) -> String {
        format!("{}{}", self.filepath, self.filename)
    }
}

/// Where and under which name a new file is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub scope: FileScope,
    pub filepath: String,
    pub filename: String,
    pub metadata: Option<FileMetadata>,
}

/// Storage for files addressed by scope, directory path and name
pub trait FileStore {
    /// Unpack a zip archive into a scope, returning the number of files written
    fn extract_archive(&mut self, archive: &Path, scope: &FileScope) -> Result<usize>;

    fn get_file(&self, scope: &FileScope, filepath: &str, filename: &str)
        -> Result<Option<StoredFile>>;

    /// List files below `path_prefix`; directory entries are included
    fn list_files(
        &self,
        scope: &FileScope,
        path_prefix: &str,
        recursive: bool,
    ) -> Result<Vec<StoredFile>>;

    fn read_content(&self, file: &StoredFile) -> Result<Vec<u8>>;

    /// Create a new file with the content of `source`
    fn create_file(&mut self, file: &NewFile, source: &StoredFile) -> Result<StoredFile>;

    /// Overwrite the content of `existing` with the content of `source`
    fn replace_content(&mut self, existing: &StoredFile, source: &StoredFile) -> Result<()>;

    fn delete_scope(&mut self, scope: &FileScope) -> Result<()>;
}

/// Hex encoded sha256 of a byte slice
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Normalize a directory path to the `/a/b/` form
pub fn normalize_dir(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b"test content"),
            "6ae8a75555209fd6c44157c0aed8016e763ff435a19cf186f76863140143ff72"
        );
    }

    #[test]
    fn test_normalize_dir() {
        assert_eq!(normalize_dir(""), "/");
        assert_eq!(normalize_dir("/"), "/");
        assert_eq!(normalize_dir("a/b"), "/a/b/");
        assert_eq!(normalize_dir("/a/"), "/a/");
    }
}
