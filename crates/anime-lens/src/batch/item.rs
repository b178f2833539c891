use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::intake::ImageFile;

/// Identity of a work item, unique per submission even when file names repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-item processing status.
///
/// ```text
/// Pending ──▶ Identifying ──▶ Searching ──▶ Complete
///    │             │              │
///    │             ├──▶ Errored ◀─┤
///    └─────────────┴──▶ Cancelled ◀┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Identifying,
    Searching,
    Complete,
    Errored,
    Cancelled,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ItemStatus::Complete | ItemStatus::Errored | ItemStatus::Cancelled
        )
    }

    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, next),
            (Pending, Identifying)
                | (Identifying, Searching)
                | (Searching, Complete)
                | (Identifying, Errored)
                | (Searching, Errored)
                | (Pending, Cancelled)
                | (Identifying, Cancelled)
                | (Searching, Cancelled)
        )
    }

    /// Text shown in the results table.
    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Identifying => "Identifying Anime...",
            ItemStatus::Searching => "Searching Info...",
            ItemStatus::Complete => "Complete",
            ItemStatus::Errored => "Error",
            ItemStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: ItemStatus,
    pub to: ItemStatus,
}

/// One submitted file and where it is in the pipeline.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: ItemId,
    pub file: ImageFile,
    status: ItemStatus,
    message: Option<String>,
}

impl WorkItem {
    pub fn new(file: ImageFile) -> Self {
        Self {
            id: ItemId::new(),
            file,
            status: ItemStatus::Pending,
            message: None,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file.name
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Moves to `to`, replacing the message. Illegal moves leave the item untouched.
    pub fn transition(
        &mut self,
        to: ItemStatus,
        message: Option<String>,
    ) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.message = message;
        Ok(())
    }
}
