//! Shared test utilities for anime-lens integration tests.
//!
//! This module provides:
//! - `ScriptedCatalog`, an in-memory `AnimeCatalog` with canned replies
//! - `TestHarness` for isolated test execution with temp directories

pub mod catalog;
pub mod harness;

pub use catalog::{Reply, ScriptedCatalog};
pub use harness::TestHarness;
