//! Export bundle handling: unpacking into staging and locating documents

pub mod extract;

pub use extract::*;

use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ImportError, Result};
use crate::files::{FileScope, FileStore};
use crate::parser::{parse_metadata, MetadataSet};

/// Descriptor file name written by current exports
pub const EXPORT_FILE: &str = "elements_export.xml";

/// Descriptor file name written by exports of the predecessor plugin
pub const LEGACY_EXPORT_FILE: &str = "c4l_export.xml";

/// Prefix of the per-category metadata documents
pub const METADATA_PREFIX: &str = "elements_filemetadata";

/// Name of the metadata document for a category
pub fn metadata_file_name(category_name: &str) -> String {
    format!("{}_{}.xml", METADATA_PREFIX, category_name)
}

/// Whether a staged file is one of the bundle's own documents rather than an image
pub fn is_bundle_document(filename: &str) -> bool {
    filename.ends_with(".xml")
        && (filename == EXPORT_FILE
            || filename == LEGACY_EXPORT_FILE
            || filename.starts_with(METADATA_PREFIX))
}

/// Unpack an archive into the staging scope and return the descriptor text
pub fn load_descriptor(
    files: &mut impl FileStore,
    archive: &Path,
    staging: &FileScope,
) -> Result<String> {
    let count = files.extract_archive(archive, staging)?;
    info!(archive = ?archive, staging = %staging, files = count, "bundle extracted");

    let descriptor = match files.get_file(staging, "/", EXPORT_FILE)? {
        Some(file) => file,
        None => files
            .get_file(staging, "/", LEGACY_EXPORT_FILE)?
            .ok_or(ImportError::MissingDescriptor)?,
    };
    debug!(name = %descriptor.filename, "found descriptor");

    let bytes = files.read_content(&descriptor)?;
    String::from_utf8(bytes)
        .map_err(|e| ImportError::Parse(format!("{} is not valid UTF-8: {}", descriptor.filename, e)))
}

/// Read the metadata document of a category from staging.
///
/// A missing or unreadable document is not an error: older exports have
/// none, and files are imported without attribution in that case.
pub fn load_metadata(
    files: &impl FileStore,
    staging: &FileScope,
    category_name: &str,
) -> MetadataSet {
    let dir = format!("/{}/", category_name);
    let name = metadata_file_name(category_name);

    let file = match files.get_file(staging, &dir, &name) {
        Ok(Some(file)) => file,
        Ok(None) => return MetadataSet::new(),
        Err(e) => {
            warn!(file = %name, error = %e, "could not read metadata document");
            return MetadataSet::new();
        }
    };

    match files.read_content(&file) {
        Ok(bytes) => parse_metadata(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            warn!(file = %name, error = %e, "could not read metadata document");
            MetadataSet::new()
        }
    }
}
