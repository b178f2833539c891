use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::item::{ItemId, ItemStatus, WorkItem};
use super::progress::{ItemEvent, NoopProgress, Progress, ProgressReporter};
use super::record::AnimeRecord;
use crate::catalog::{AnimeCatalog, CatalogError, ImagePayload};
use crate::error::BatchError;
use crate::intake::ImageFile;

/// Items and results of the current batch.
#[derive(Debug, Clone, Default)]
pub struct BatchState {
    pub items: Vec<WorkItem>,
    /// Append-only during a run; one entry per `Complete` item.
    pub records: Vec<AnimeRecord>,
}

impl BatchState {
    pub fn progress(&self) -> Progress {
        Progress::from_items(&self.items)
    }
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub progress: Progress,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Outcome of awaiting a remote call under a cancellation token.
enum Stage<T> {
    Done(Result<T, CatalogError>),
    Cancelled,
}

/// Held for the length of a run. However the run ends, including when the
/// `process` future is dropped mid-await, items still in flight become
/// `Cancelled` and the running flag is cleared.
struct RunGuard<'a> {
    running: &'a AtomicBool,
    state: &'a RwLock<BatchState>,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> RunGuard<'a> {
    fn acquire(
        running: &'a AtomicBool,
        state: &'a RwLock<BatchState>,
        reporter: &'a dyn ProgressReporter,
    ) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                running,
                state,
                reporter,
            })
    }

    fn cancel_in_flight(&self) -> Vec<ItemEvent> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let mut stopped = Vec::new();
        for item in state
            .items
            .iter_mut()
            .filter(|item| matches!(item.status(), ItemStatus::Identifying | ItemStatus::Searching))
        {
            let message = Some("Cancelled when the run stopped".to_string());
            if item.transition(ItemStatus::Cancelled, message).is_ok() {
                stopped.push(item.clone());
            }
        }
        let progress = state.progress();
        stopped
            .iter()
            .map(|item| ItemEvent::new(item, progress))
            .collect()
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let events = self.cancel_in_flight();
        if !events.is_empty() {
            warn!("Run stopped with {} items in flight", events.len());
        }
        for event in events {
            self.reporter.report(event);
        }
        self.running.store(false, Ordering::Release);
    }
}

/// Drives each submitted image through identification and enrichment, one
/// at a time, in submission order.
pub struct BatchProcessor<C> {
    catalog: C,
    state: RwLock<BatchState>,
    running: AtomicBool,
    reporter: Arc<dyn ProgressReporter>,
}

impl<C: AnimeCatalog> BatchProcessor<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_reporter(catalog, Arc::new(NoopProgress))
    }

    pub fn with_reporter(catalog: C, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            catalog,
            state: RwLock::new(BatchState::default()),
            running: AtomicBool::new(false),
            reporter,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Replaces the current batch with `files`, discarding every prior item
    /// and record. Refused while a run is active.
    pub fn submit(&self, files: Vec<ImageFile>) -> Result<usize, BatchError> {
        let mut state = self.write_state();
        if self.is_running() {
            return Err(BatchError::AlreadyRunning);
        }

        *state = BatchState {
            items: files.into_iter().map(WorkItem::new).collect(),
            records: Vec::new(),
        };
        info!("Submitted batch of {} images", state.items.len());
        Ok(state.items.len())
    }

    pub fn snapshot(&self) -> BatchState {
        self.read_state().clone()
    }

    pub fn items(&self) -> Vec<WorkItem> {
        self.read_state().items.clone()
    }

    pub fn records(&self) -> Vec<AnimeRecord> {
        self.read_state().records.clone()
    }

    pub fn progress(&self) -> Progress {
        self.read_state().progress()
    }

    /// Runs every `Pending` item to a terminal status.
    ///
    /// Catalog failures end up on the item that caused them and never stop
    /// the batch. When `cancel` fires, the item in flight and all items not
    /// yet started become `Cancelled`.
    pub async fn process(&self, cancel: CancellationToken) -> Result<BatchSummary, BatchError> {
        let _guard = RunGuard::acquire(&self.running, &self.state, &*self.reporter)
            .ok_or(BatchError::AlreadyRunning)?;
        let started = Instant::now();

        let queue: Vec<(ItemId, ImageFile)> = {
            let state = self.read_state();
            if state.items.is_empty() {
                return Err(BatchError::EmptyBatch);
            }
            state
                .items
                .iter()
                .filter(|item| item.status() == ItemStatus::Pending)
                .map(|item| (item.id, item.file.clone()))
                .collect()
        };

        let span = info_span!("batch", items = queue.len());
        async {
            info!("Processing {} images", queue.len());
            for (id, file) in &queue {
                if cancel.is_cancelled() {
                    break;
                }
                self.process_item(*id, file, &cancel)
                    .instrument(info_span!("item", item_id = %id, file_name = %file.name))
                    .await?;
            }

            if cancel.is_cancelled() {
                self.cancel_pending()?;
            }
            Ok::<_, BatchError>(())
        }
        .instrument(span)
        .await?;

        let progress = self.progress();
        let summary = BatchSummary {
            progress,
            cancelled: cancel.is_cancelled(),
            elapsed: started.elapsed(),
        };
        info!(
            complete = progress.complete,
            errored = progress.errored,
            cancelled = progress.cancelled,
            "Batch finished in {:?}",
            summary.elapsed
        );
        Ok(summary)
    }

    async fn process_item(
        &self,
        id: ItemId,
        file: &ImageFile,
        cancel: &CancellationToken,
    ) -> Result<(), BatchError> {
        self.transition(id, ItemStatus::Identifying, None)?;

        let title = match race(cancel, self.identify(file)).await {
            Stage::Done(Ok(title)) => title,
            Stage::Done(Err(e)) => return self.fail(id, "Identification", e),
            Stage::Cancelled => {
                return self.transition(
                    id,
                    ItemStatus::Cancelled,
                    Some("Cancelled while identifying".to_string()),
                )
            }
        };

        debug!("Identified as '{}'", title);
        self.transition(id, ItemStatus::Searching, Some(format!("Found: {}", title)))?;

        let details = match race(cancel, self.catalog.enrich(&title)).await {
            Stage::Done(Ok(details)) => details,
            Stage::Done(Err(e)) => return self.fail(id, "Enrichment", e),
            Stage::Cancelled => {
                return self.transition(
                    id,
                    ItemStatus::Cancelled,
                    Some("Cancelled while searching".to_string()),
                )
            }
        };

        self.complete(id, details)
    }

    async fn identify(&self, file: &ImageFile) -> Result<String, CatalogError> {
        let bytes = file.read().await.map_err(CatalogError::ImageRead)?;
        let payload = ImagePayload {
            bytes,
            mime_type: file.mime_type.clone(),
        };
        self.catalog.identify(&payload).await
    }

    fn fail(&self, id: ItemId, stage: &str, error: CatalogError) -> Result<(), BatchError> {
        warn!(validation = error.is_validation(), "{} failed: {}", stage, error);
        self.transition(id, ItemStatus::Errored, Some(error.to_string()))
    }

    /// Appends the record and marks the item `Complete` under one lock, so no
    /// reader ever sees one without the other.
    fn complete(&self, id: ItemId, details: crate::catalog::AnimeDetails) -> Result<(), BatchError> {
        let event = {
            let mut state = self.write_state();
            let item = find_mut(&mut state.items, id)?;
            item.transition(ItemStatus::Complete, None)
                .map_err(|e| BatchError::transition(id, e.from, e.to))?;
            let record = AnimeRecord::new(item, details);
            let event_item = item.clone();
            info!("Completed as '{}'", record.title);
            state.records.push(record);
            ItemEvent::new(&event_item, state.progress())
        };
        self.reporter.report(event);
        Ok(())
    }

    fn transition(
        &self,
        id: ItemId,
        to: ItemStatus,
        message: Option<String>,
    ) -> Result<(), BatchError> {
        let event = {
            let mut state = self.write_state();
            let item = find_mut(&mut state.items, id)?;
            item.transition(to, message)
                .map_err(|e| BatchError::transition(id, e.from, e.to))?;
            let event_item = item.clone();
            ItemEvent::new(&event_item, state.progress())
        };
        self.reporter.report(event);
        Ok(())
    }

    fn cancel_pending(&self) -> Result<(), BatchError> {
        let pending: Vec<ItemId> = self
            .read_state()
            .items
            .iter()
            .filter(|item| item.status() == ItemStatus::Pending)
            .map(|item| item.id)
            .collect();

        if !pending.is_empty() {
            info!("Cancelling {} items not yet started", pending.len());
        }
        for id in pending {
            self.transition(
                id,
                ItemStatus::Cancelled,
                Some("Cancelled before processing".to_string()),
            )?;
        }
        Ok(())
    }

    // Mutations are single validated assignments or pushes, so a poisoned
    // lock still guards consistent state.
    fn read_state(&self) -> RwLockReadGuard<'_, BatchState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, BatchState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn find_mut(items: &mut [WorkItem], id: ItemId) -> Result<&mut WorkItem, BatchError> {
    items
        .iter_mut()
        .find(|item| item.id == id)
        .ok_or_else(|| BatchError::UnknownItem(id.to_string()))
}

async fn race<T, F>(cancel: &CancellationToken, call: F) -> Stage<T>
where
    F: Future<Output = Result<T, CatalogError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Stage::Cancelled,
        result = call => Stage::Done(result),
    }
}
