pub mod bundle;
pub mod cache;
pub mod cli;
pub mod entity;
pub mod error;
pub mod files;
pub mod import;
pub mod parser;
pub mod schema;
pub mod store;
pub mod ui;

pub use cache::{CacheManager, CacheRebuilder, StylesheetCache};
pub use cli::{Cli, Commands};
pub use error::{ImportError, Result};
pub use files::{DiskFileStore, FileStore};
pub use import::{CategoryIdMap, ImportOptions, Importer, Outcome, ResultLog, Subject};
pub use store::{RecordId, RecordStore, SqliteStore};
pub use ui::{Phase, SilentUi, TracingUi, Ui, UiApp};
