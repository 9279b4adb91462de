//! Acquisition orchestrator.
//!
//! Turns classified metadata into downloaded chapter content:
//! - **Selection**: per book, audio and text candidates in priority order
//! - **Deduplication**: one artifact per content type per distinct work
//! - **Resume**: complete artifacts on disk count as done unless forced
//! - **Errors**: every failed unit goes to the language's error ledger

mod config;
mod runner;
mod selection;
mod types;

pub use config::OrchestratorConfig;
pub use runner::AcquisitionOrchestrator;
pub use selection::{audio_candidates, text_candidates};
pub use types::{BookReport, ChapterOutcome, LanguageReport, OrchestratorError};
