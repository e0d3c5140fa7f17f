//! Rendered stylesheet cache
//!
//! Editors load one combined stylesheet and one combined script instead of
//! querying every record. Both are rebuilt from the store after each import.

use anyhow::Context;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::{TableSchema, CATEGORIES, COMPONENTS, FLAVORS, VARIANTS};
use crate::store::RecordStore;

pub const STYLESHEET_FILE: &str = "elements.css";
pub const SCRIPT_FILE: &str = "elements.js";

/// Something derived from the records that must be rebuilt after an import
pub trait CacheRebuilder {
    fn invalidate_and_rebuild(&mut self, store: &dyn RecordStore) -> Result<()>;
}

/// Resolves the directory that holds cached output
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(custom_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "elements-import")
                    .context("Could not determine cache directory")?;
                proj_dirs.cache_dir().to_path_buf()
            }
        };

        fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn stylesheet_cache(&self) -> StylesheetCache {
        StylesheetCache::new(self.cache_dir.join("stylesheets"))
    }
}

/// Combined CSS and JS of all records, written to a directory
pub struct StylesheetCache {
    dir: PathBuf,
    rebuilds: usize,
}

impl StylesheetCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            rebuilds: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of rebuilds done by this instance
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    fn invalidate(&self) -> Result<()> {
        for name in [STYLESHEET_FILE, SCRIPT_FILE] {
            let path = self.dir.join(name);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

impl CacheRebuilder for StylesheetCache {
    fn invalidate_and_rebuild(&mut self, store: &dyn RecordStore) -> Result<()> {
        self.invalidate()?;
        fs::create_dir_all(&self.dir)?;

        let mut css = String::new();
        for table in [&CATEGORIES, &COMPONENTS, &FLAVORS, &VARIANTS] {
            append_column(&mut css, store, table, "css")?;
        }
        let mut js = String::new();
        append_column(&mut js, store, &COMPONENTS, "js")?;

        fs::write(self.dir.join(STYLESHEET_FILE), &css)?;
        fs::write(self.dir.join(SCRIPT_FILE), &js)?;
        self.rebuilds += 1;

        info!(dir = ?self.dir, css_bytes = css.len(), js_bytes = js.len(), "rebuilt stylesheet cache");
        Ok(())
    }
}

fn append_column(
    out: &mut String,
    store: &dyn RecordStore,
    table: &TableSchema,
    column: &str,
) -> Result<()> {
    for row in store.find_many(table, &[])? {
        let Some(value) = row.get(column).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        debug!(table = table.name, record = %row.text("name"), "adding {}", column);
        out.push_str(value);
        if !value.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Row, SqliteStore};

    #[test]
    fn test_rebuild_concatenates_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(&CATEGORIES, &Row::new().with("name", "boxes").with("css", ".boxes {}"))
            .unwrap();
        store
            .insert(
                &COMPONENTS,
                &Row::new()
                    .with("name", "tip")
                    .with("css", ".tip {}")
                    .with("js", "init();"),
            )
            .unwrap();
        store
            .insert(&FLAVORS, &Row::new().with("name", "red"))
            .unwrap();

        let mut cache = StylesheetCache::new(dir.path().join("out"));
        cache.invalidate_and_rebuild(&store).unwrap();

        let css = fs::read_to_string(dir.path().join("out").join(STYLESHEET_FILE)).unwrap();
        assert_eq!(css, ".boxes {}\n.tip {}\n");
        let js = fs::read_to_string(dir.path().join("out").join(SCRIPT_FILE)).unwrap();
        assert_eq!(js, "init();\n");
        assert_eq!(cache.rebuilds(), 1);
    }

    #[test]
    fn test_cache_manager_uses_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CacheManager::new(Some(dir.path().join("cache"))).unwrap();
        assert!(manager.cache_dir().is_dir());
        assert_eq!(
            manager.stylesheet_cache().dir(),
            dir.path().join("cache").join("stylesheets")
        );
    }
}
