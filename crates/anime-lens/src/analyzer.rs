//! Top-level session: selection, processing, the results table and export,
//! wired together over one batch.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::batch::{BatchProcessor, BatchSummary, BroadcastProgress, ItemEvent, Progress};
use crate::catalog::{AnimeCatalog, GeminiClient};
use crate::config::Config;
use crate::error::{ExportError, Result};
use crate::export;
use crate::intake::{CandidateFile, FileIntake, ImageFile};
use crate::present::{self, TableRow};

pub struct Analyzer<C> {
    intake: Mutex<FileIntake>,
    processor: BatchProcessor<C>,
    progress: BroadcastProgress,
    export_filename: String,
}

impl Analyzer<GeminiClient> {
    /// Production constructor. Fails with `MissingApiKey` when no credential
    /// can be resolved.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GeminiClient::from_config(config)?;
        info!("Using model {}", client.model());
        Ok(Self::new(config, client))
    }
}

impl<C: AnimeCatalog> Analyzer<C> {
    pub fn new(config: &Config, catalog: C) -> Self {
        let progress = BroadcastProgress::new(config.progress_channel_capacity);
        Self {
            intake: Mutex::new(FileIntake::new()),
            processor: BatchProcessor::with_reporter(catalog, Arc::new(progress.clone())),
            progress,
            export_filename: config.export.filename.clone(),
        }
    }

    pub fn processor(&self) -> &BatchProcessor<C> {
        &self.processor
    }

    pub fn is_running(&self) -> bool {
        self.processor.is_running()
    }

    pub fn intake_disabled(&self) -> bool {
        self.intake().is_disabled()
    }

    /// Intake, disabled exactly while a run is active.
    fn intake(&self) -> MutexGuard<'_, FileIntake> {
        let mut intake = self.intake.lock().unwrap_or_else(|e| e.into_inner());
        intake.set_disabled(self.processor.is_running());
        intake
    }

    /// Receives an [`ItemEvent`] for every status change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.progress.subscribe()
    }

    /// Offers a selection to intake. When it yields at least one image the
    /// current batch is replaced and the new item count returned; otherwise
    /// the batch is left alone and `None` returned.
    pub fn select_files<I>(&self, candidates: I) -> Result<Option<usize>>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let accepted = self.intake().accept(candidates);
        self.submit(accepted)
    }

    pub fn select_paths<I, P>(&self, paths: I) -> Result<Option<usize>>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let accepted = self.intake().accept_paths(paths);
        self.submit(accepted)
    }

    /// Selects every image at the top level of `dir`.
    pub fn select_directory(&self, dir: &Path) -> Result<Option<usize>> {
        let accepted = self.intake().scan_directory(dir)?;
        self.submit(accepted)
    }

    fn submit(&self, accepted: Option<Vec<ImageFile>>) -> Result<Option<usize>> {
        match accepted {
            Some(files) => Ok(Some(self.processor.submit(files)?)),
            None => Ok(None),
        }
    }

    /// Processes the current batch. Intake is disabled until the run ends.
    pub async fn start(&self, cancel: CancellationToken) -> Result<BatchSummary> {
        Ok(self.processor.process(cancel).await?)
    }

    pub fn progress(&self) -> Progress {
        self.processor.progress()
    }

    pub fn rows(&self) -> Vec<TableRow> {
        let state = self.processor.snapshot();
        present::project(&state.items, &state.records)
    }

    pub fn table(&self) -> String {
        present::render_table(&self.rows())
    }

    /// Writes the records to the configured file name inside `dir`.
    pub fn export_csv(&self, dir: &Path) -> Result<PathBuf> {
        self.export_csv_as(&dir.join(&self.export_filename))
    }

    /// Writes the records to `path`. Refused while running or when nothing
    /// has completed.
    pub fn export_csv_as(&self, path: &Path) -> Result<PathBuf> {
        if self.processor.is_running() {
            return Err(ExportError::Busy.into());
        }
        let records = self.processor.records();
        if records.is_empty() {
            return Err(ExportError::NothingToExport.into());
        }
        Ok(export::write_csv(&records, path)?)
    }
}
