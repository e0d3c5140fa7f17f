//! Error types for the import engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Error, Debug)]
pub enum ImportError {
    /// The bundle contains neither the current nor the legacy descriptor
    #[error("Import bundle does not contain a descriptor document")]
    MissingDescriptor,

    /// Malformed descriptor document
    #[error("Failed to parse descriptor: {0}")]
    Parse(String),

    /// A mandatory table is absent from the descriptor
    #[error("Descriptor is missing table \"{0}\"")]
    MissingTable(String),

    /// The record store rejected a component insert
    #[error("Failed to import component \"{name}\"")]
    ComponentInsert {
        name: String,
        #[source]
        source: Box<ImportError>,
    },

    /// The file store refused to create an asset
    #[error("Failed to import file \"{path}\"")]
    FileCreate {
        path: String,
        #[source]
        source: Box<ImportError>,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl From<roxmltree::Error> for ImportError {
    fn from(e: roxmltree::Error) -> Self {
        ImportError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_insert_keeps_source() {
        let err = ImportError::ComponentInsert {
            name: "callout".to_string(),
            source: Box::new(ImportError::Parse("boom".to_string())),
        };
        assert_eq!(err.to_string(), "Failed to import component \"callout\"");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Failed to parse descriptor: boom");
    }
}
