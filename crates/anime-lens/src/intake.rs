//! File intake: turns whatever the user picked into a batch of image files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::IntakeError;
use crate::sanitize;

/// Where an image's bytes come from.
#[derive(Clone)]
pub enum ImageSource {
    /// Uploaded content already held in memory.
    Memory(Arc<[u8]>),
    /// A file on disk, read when the item is identified.
    Path(PathBuf),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            ImageSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
        }
    }
}

/// A file offered to the intake, before type filtering.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    /// Declared or guessed content type; `None` when unknown.
    pub mime_type: Option<String>,
    pub source: ImageSource,
}

impl CandidateFile {
    /// Candidate for a file on disk; the MIME type is guessed from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = mime_guess::from_path(&path).first().map(|m| m.to_string());
        Self {
            name: sanitize::redact_path(&path),
            mime_type,
            source: ImageSource::Path(path),
        }
    }

    /// Candidate for uploaded bytes with a client-declared content type.
    pub fn from_bytes(name: impl Into<String>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.map(str::to_string),
            source: ImageSource::Memory(bytes.into()),
        }
    }

    fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.to_ascii_lowercase().starts_with("image/"))
    }
}

/// An accepted image, ready to become a work item.
#[derive(Debug, Clone)]
pub struct ImageFile {
    /// Display name. Not unique: two uploads may share it.
    pub name: String,
    pub mime_type: String,
    pub source: ImageSource,
}

impl ImageFile {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: ImageSource::Memory(bytes.into()),
        }
    }

    /// Loads the image content.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            ImageSource::Memory(bytes) => Ok(bytes.to_vec()),
            ImageSource::Path(path) => tokio::fs::read(path).await,
        }
    }
}

/// The selection surface. Keeps only a disabled flag and the size of the
/// last accepted selection.
#[derive(Debug, Default)]
pub struct FileIntake {
    disabled: bool,
    last_count: usize,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Number of images in the last non-empty selection.
    pub fn last_count(&self) -> usize {
        self.last_count
    }

    /// Filters `candidates` to images. Returns `None` while disabled or when
    /// nothing survives the filter; the previous selection then stays current.
    pub fn accept<I>(&mut self, candidates: I) -> Option<Vec<ImageFile>>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        if self.disabled {
            debug!("Intake disabled, ignoring selection");
            return None;
        }

        let images: Vec<ImageFile> = candidates
            .into_iter()
            .filter_map(|candidate| {
                if !candidate.is_image() {
                    debug!(
                        "Skipping non-image file: {} ({})",
                        candidate.name,
                        candidate.mime_type.as_deref().unwrap_or("unknown type")
                    );
                    return None;
                }
                Some(ImageFile {
                    name: candidate.name,
                    mime_type: candidate.mime_type.unwrap_or_default(),
                    source: candidate.source,
                })
            })
            .collect();

        if images.is_empty() {
            debug!("Selection contained no images, ignoring");
            return None;
        }

        self.last_count = images.len();
        Some(images)
    }

    pub fn accept_paths<I, P>(&mut self, paths: I) -> Option<Vec<ImageFile>>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.accept(paths.into_iter().map(CandidateFile::from_path))
    }

    /// Picks every file at the top level of `dir`, ordered by name.
    pub fn scan_directory(&mut self, dir: &Path) -> Result<Option<Vec<ImageFile>>, IntakeError> {
        if self.disabled {
            return Ok(None);
        }
        if !dir.is_dir() {
            return Err(IntakeError::NotADirectory(dir.to_path_buf()));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IntakeError::ScanFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }

        info!("Scanned {} files in {}", paths.len(), dir.display());
        Ok(self.accept_paths(paths))
    }
}
