//! Runs the `tischiron` CLI and turns its text output into progress events.

pub mod classifier;
pub mod command;
pub mod error;
mod runner;

pub use classifier::{MarkerClassifier, ProgressClassifier};
pub use command::{CliCommand, CliConfig, DEFAULT_PROGRAM};
pub use error::{OrchestratorError, Result};
pub use runner::{CliOutput, GenerationStream, Orchestrator};
