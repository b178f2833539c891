use std::path::PathBuf;
use thiserror::Error;

use crate::batch::{ItemStatus, TransitionError};

#[derive(Error, Debug)]
pub enum AnimeLensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Gemini API key is not configured: {0}")]
    MissingApiKey(#[source] crate::secrets::SecretError),
}

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("A batch is already being processed")]
    AlreadyRunning,

    #[error("No files have been submitted")]
    EmptyBatch,

    #[error("Item {0} is not part of the current batch")]
    UnknownItem(String),

    #[error("Illegal status change for item {item}: {source}")]
    Transition {
        item: String,
        #[source]
        source: TransitionError,
    },
}

impl BatchError {
    pub(crate) fn transition(item: impl ToString, from: ItemStatus, to: ItemStatus) -> Self {
        BatchError::Transition {
            item: item.to_string(),
            source: TransitionError { from, to },
        }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No results to export")]
    NothingToExport,

    #[error("Cannot export while a batch is being processed")]
    Busy,

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AnimeLensError>;
