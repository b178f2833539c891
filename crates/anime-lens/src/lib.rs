pub mod analyzer;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod intake;
pub mod logging;
pub mod present;
pub mod sanitize;
pub mod secrets;

pub use analyzer::Analyzer;
pub use batch::{
    AnimeRecord, BatchProcessor, BroadcastProgress, ItemEvent, ItemId, ItemStatus, Progress,
    WorkItem,
};
pub use catalog::{AnimeCatalog, AnimeDetails, CatalogError, GeminiClient, ImagePayload};
pub use config::{load_config, load_config_or_default, Config};
pub use error::{AnimeLensError, BatchError, ConfigError, ExportError, IntakeError, Result};
pub use export::{to_csv, write_csv};
pub use intake::{CandidateFile, FileIntake, ImageFile};
pub use present::{project, render_table, StatusGlyph, TableRow};
pub use secrets::{resolve_secret, SecretError};
