//! Test harness for isolated test execution.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use anime_lens::config::Config;
use anime_lens::{Analyzer, CandidateFile, ImageFile};

use super::catalog::ScriptedCatalog;

pub struct TestHarness {
    temp_dir: TempDir,
    /// Where screenshots are written for directory and path selection.
    pub input_dir: PathBuf,
    /// Export destination.
    pub output_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        let output_dir = temp_dir.path().join("output");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        Self {
            temp_dir,
            input_dir,
            output_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a screenshot whose content is `content`.
    pub fn write_input(&self, filename: &str, content: &str) -> PathBuf {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    pub fn analyzer(&self, catalog: ScriptedCatalog) -> Analyzer<ScriptedCatalog> {
        Analyzer::new(&Config::default(), catalog)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// An in-memory PNG upload whose bytes are `content`.
pub fn upload(name: &str, content: &str) -> CandidateFile {
    CandidateFile::from_bytes(name, Some("image/png"), content.as_bytes().to_vec())
}

pub fn image(name: &str, content: &str) -> ImageFile {
    ImageFile::from_bytes(name, "image/png", content.as_bytes().to_vec())
}
