//! pvid-da library - discard analysis
//!
//! Reconciles a batch of face and body capture ids against the archive's
//! tracks and explains every capture that did not make it into an archive.

pub mod archive;
pub mod cli;
pub mod db;
pub mod engine;
pub mod identifier;
pub mod report;
pub mod runner;
pub mod sink;

pub use engine::{EngineOptions, Reconciler, SizeThreshold};
pub use identifier::{Batch, IdType};
pub use report::AnalyzeResult;
pub use runner::{run_batches, RunSummary};
