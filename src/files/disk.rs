use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::{content_hash, normalize_dir, FileMetadata, FileScope, FileStore, NewFile, StoredFile};
use crate::bundle::extract_zip;
use crate::error::Result;

/// Directory (per scope) holding the JSON metadata sidecars
const META_DIR: &str = ".meta";

/// File store backed by a plain directory tree.
///
/// Layout: `<root>/<area>/<item id>/<path>/<name>`, with attribution kept
/// next to it in `<root>/<area>/<item id>/.meta/<path>/<name>.json`.
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, scope: &FileScope) -> PathBuf {
        self.root
            .join(scope.area.as_str())
            .join(scope.item_id.to_string())
    }

    fn disk_path(&self, scope: &FileScope, filepath: &str, filename: &str) -> PathBuf {
        join_logical(&self.scope_dir(scope), filepath).join(filename)
    }

    fn meta_path(&self, scope: &FileScope, filepath: &str, filename: &str) -> PathBuf {
        join_logical(&self.scope_dir(scope).join(META_DIR), filepath)
            .join(format!("{}.json", filename))
    }

    fn read_metadata(&self, scope: &FileScope, filepath: &str, filename: &str) -> Result<Option<FileMetadata>> {
        let path = self.meta_path(scope, filepath, filename);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn stored_file(&self, scope: &FileScope, filepath: &str, filename: &str) -> Result<StoredFile> {
        let bytes = fs::read(self.disk_path(scope, filepath, filename))?;
        Ok(StoredFile {
            scope: *scope,
            filepath: normalize_dir(filepath),
            filename: filename.to_string(),
            is_directory: false,
            content_hash: content_hash(&bytes),
            metadata: self.read_metadata(scope, filepath, filename)?,
        })
    }
}

impl FileStore for DiskFileStore {
    fn extract_archive(&mut self, archive: &Path, scope: &FileScope) -> Result<usize> {
        extract_zip(archive, &self.scope_dir(scope))
    }

    fn get_file(
        &self,
        scope: &FileScope,
        filepath: &str,
        filename: &str,
    ) -> Result<Option<StoredFile>> {
        if !self.disk_path(scope, filepath, filename).is_file() {
            return Ok(None);
        }
        self.stored_file(scope, filepath, filename).map(Some)
    }

    fn list_files(
        &self,
        scope: &FileScope,
        path_prefix: &str,
        recursive: bool,
    ) -> Result<Vec<StoredFile>> {
        let scope_dir = self.scope_dir(scope);
        let start = join_logical(&scope_dir, path_prefix);
        if !start.is_dir() {
            return Ok(Vec::new());
        }

        let walker = WalkDir::new(&start)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| e.file_name() != META_DIR)
        {
            let entry = entry.map_err(io::Error::from)?;
            let Ok(relative) = entry.path().strip_prefix(&scope_dir) else {
                continue;
            };

            if entry.file_type().is_dir() {
                files.push(StoredFile {
                    scope: *scope,
                    filepath: normalize_dir(&logical(relative)),
                    filename: ".".to_string(),
                    is_directory: true,
                    content_hash: String::new(),
                    metadata: None,
                });
                continue;
            }

            let filename = entry.file_name().to_string_lossy().into_owned();
            let filepath = relative.parent().map(logical).unwrap_or_default();
            files.push(self.stored_file(scope, &filepath, &filename)?);
        }

        Ok(files)
    }

    fn read_content(&self, file: &StoredFile) -> Result<Vec<u8>> {
        Ok(fs::read(self.disk_path(&file.scope, &file.filepath, &file.filename))?)
    }

    fn create_file(&mut self, file: &NewFile, source: &StoredFile) -> Result<StoredFile> {
        let dest = self.disk_path(&file.scope, &file.filepath, &file.filename);
        if dest.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", dest.display()),
            )
            .into());
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, self.read_content(source)?)?;

        if let Some(metadata) = &file.metadata {
            let meta_path = self.meta_path(&file.scope, &file.filepath, &file.filename);
            if let Some(parent) = meta_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&meta_path, serde_json::to_vec_pretty(metadata)?)?;
        }

        debug!(scope = %file.scope, path = ?dest, "created file");
        self.stored_file(&file.scope, &file.filepath, &file.filename)
    }

    fn replace_content(&mut self, existing: &StoredFile, source: &StoredFile) -> Result<()> {
        let content = self.read_content(source)?;
        let dest = self.disk_path(&existing.scope, &existing.filepath, &existing.filename);
        fs::write(&dest, content)?;
        debug!(scope = %existing.scope, path = ?dest, "replaced file content");
        Ok(())
    }

    fn delete_scope(&mut self, scope: &FileScope) -> Result<()> {
        let dir = self.scope_dir(scope);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Append a `/a/b/` style logical path to a disk path
fn join_logical(base: &Path, logical_path: &str) -> PathBuf {
    logical_path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}

/// Render a relative disk path as a `/`-separated logical path
fn logical(relative: &Path) -> String {
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    normalize_dir(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(files: &[(&str, &[u8])]) -> (tempfile::TempDir, DiskFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path()).unwrap();
        let scope_dir = store.scope_dir(&FileScope::staging(1));
        for (path, content) in files {
            let full = scope_dir.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_list_files_recursive_includes_directories() {
        let (_dir, store) = store_with(&[
            ("boxes/a.png", b"a"),
            ("boxes/icons/b.svg", b"b"),
            ("other/c.png", b"c"),
        ]);

        let files = store
            .list_files(&FileScope::staging(1), "/boxes/", true)
            .unwrap();
        let paths: Vec<(String, bool)> = files
            .iter()
            .map(|f| (f.logical_path(), f.is_directory))
            .collect();

        assert_eq!(
            paths,
            vec![
                ("/boxes/a.png".to_string(), false),
                ("/boxes/icons/.".to_string(), true),
                ("/boxes/icons/b.svg".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_list_files_non_recursive() {
        let (_dir, store) = store_with(&[("boxes/a.png", b"a"), ("boxes/icons/b.svg", b"b")]);
        let files = store
            .list_files(&FileScope::staging(1), "/boxes/", false)
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.filepath == "/boxes/" || f.is_directory));
    }

    #[test]
    fn test_create_file_with_metadata() {
        let (_dir, mut store) = store_with(&[("boxes/a.png", b"png")]);
        let source = store
            .get_file(&FileScope::staging(1), "/boxes/", "a.png")
            .unwrap()
            .unwrap();

        let metadata = FileMetadata {
            source: "https://example.org".to_string(),
            author: "Jane".to_string(),
            license: "cc-4.0".to_string(),
        };
        let created = store
            .create_file(
                &NewFile {
                    scope: FileScope::images(9),
                    filepath: "/".to_string(),
                    filename: "a.png".to_string(),
                    metadata: Some(metadata.clone()),
                },
                &source,
            )
            .unwrap();

        assert_eq!(created.content_hash, source.content_hash);
        assert_eq!(created.metadata, Some(metadata));

        // Metadata sidecars never show up as files
        let listed = store.list_files(&FileScope::images(9), "/", true).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_create_file_refuses_existing() {
        let (_dir, mut store) = store_with(&[("boxes/a.png", b"png")]);
        let source = store
            .get_file(&FileScope::staging(1), "/boxes/", "a.png")
            .unwrap()
            .unwrap();
        let target = NewFile {
            scope: FileScope::staging(1),
            filepath: "/boxes/".to_string(),
            filename: "a.png".to_string(),
            metadata: None,
        };
        assert!(store.create_file(&target, &source).is_err());
    }

    #[test]
    fn test_replace_and_delete_scope() {
        let (_dir, mut store) = store_with(&[("a.png", b"old"), ("b.png", b"new")]);
        let scope = FileScope::staging(1);
        let a = store.get_file(&scope, "/", "a.png").unwrap().unwrap();
        let b = store.get_file(&scope, "/", "b.png").unwrap().unwrap();

        store.replace_content(&a, &b).unwrap();
        let a = store.get_file(&scope, "/", "a.png").unwrap().unwrap();
        assert_eq!(a.content_hash, b.content_hash);

        store.delete_scope(&scope).unwrap();
        assert!(store.get_file(&scope, "/", "a.png").unwrap().is_none());
    }

    #[test]
    fn test_join_logical_ignores_parent_segments() {
        let base = Path::new("/data");
        assert_eq!(join_logical(base, "/a/../b/"), PathBuf::from("/data/a/b"));
    }
}
