//! Category images
//!
//! Staged files under `/<category>/` are matched against the category's
//! image scope by path and name, and compared by content hash.

use super::{Importer, Outcome, Subject};
use crate::bundle::is_bundle_document;
use crate::error::{ImportError, Result};
use crate::files::{FileScope, FileStore, NewFile, StoredFile};
use crate::parser::{find_metadata, MetadataEntry};
use crate::store::{RecordId, RecordStore};
use crate::ui::Ui;

/// Remove the leading `/<category>` segment from a staged directory path
pub fn strip_category(filepath: &str, category_name: &str) -> String {
    let prefix = format!("/{}/", category_name);
    match filepath.strip_prefix(&prefix) {
        Some(rest) => format!("/{}", rest),
        None => filepath.to_string(),
    }
}

impl<S: RecordStore, F: FileStore, U: Ui> Importer<S, F, U> {
    /// Import staged files into the image scope of a category.
    ///
    /// `metadata` holds the attribution rows of this category; a new file
    /// gets the row with the same file name attached.
    pub fn import_assets(
        &mut self,
        staged: &[StoredFile],
        category_id: RecordId,
        metadata: &[MetadataEntry],
        category_name: &str,
    ) -> Result<()> {
        let scope = FileScope::images(category_id.value());
        let dry_run = self.options.dry_run;

        for file in staged {
            if file.is_directory || is_bundle_document(&file.filename) {
                continue;
            }

            let filepath = strip_category(&file.filepath, category_name);
            let label = format!("{}{}", filepath, file.filename);

            match self.files.get_file(&scope, &filepath, &file.filename)? {
                Some(existing) if existing.content_hash != file.content_hash => {
                    if !dry_run {
                        self.files.replace_content(&existing, file)?;
                    }
                    self.record(Outcome::Replaced, Subject::File, label);
                }
                Some(_) => self.record(Outcome::Unchanged, Subject::File, label),
                None => {
                    if !dry_run {
                        let new_file = NewFile {
                            scope,
                            filepath,
                            filename: file.filename.clone(),
                            metadata: find_metadata(metadata, &file.filename).cloned(),
                        };
                        self.files
                            .create_file(&new_file, file)
                            .map_err(|source| ImportError::FileCreate {
                                path: label.clone(),
                                source: Box::new(source),
                            })?;
                    }
                    self.record(Outcome::Created, Subject::File, label);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_category() {
        assert_eq!(strip_category("/boxes/", "boxes"), "/");
        assert_eq!(strip_category("/boxes/icons/", "boxes"), "/icons/");
        assert_eq!(strip_category("/icons/boxes/", "boxes"), "/icons/boxes/");
        assert_eq!(strip_category("/boxes2/", "boxes"), "/boxes2/");
    }
}
