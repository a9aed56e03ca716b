//! Driver and pipeline lifecycle errors.

use std::io;

use thiserror::Error;

use crate::stage::StageError;

/// Errors surfaced by the driver and the pipeline lifecycle. Transient
/// transform failures are not represented here; workers log those and
/// keep running.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or invalid command-line arguments.
    #[error("{0}")]
    Usage(String),

    /// A configuration file was present but malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A requested stage name could not be resolved.
    #[error("unknown stage '{name}'")]
    UnknownStage { name: String },

    /// The classic loader admits at most one instance of each stage.
    #[error("stage '{name}' is already loaded (namespace isolation is off)")]
    DuplicateStage { name: String },

    /// A stage failed to initialize; already-started stages were rolled
    /// back in reverse order.
    #[error("stage '{name}' failed to initialize: {source}")]
    StageInit {
        name: String,
        #[source]
        source: StageError,
    },

    /// A stage could not be attached to its successor.
    #[error("stage '{name}' could not be wired to its successor")]
    Wire { name: String },

    /// Reading standard input failed.
    #[error("failed to read standard input: {0}")]
    Feed(#[from] io::Error),

    /// A stage reported an error during teardown.
    #[error("stage '{name}' failed during shutdown: {source}")]
    Shutdown {
        name: String,
        #[source]
        source: StageError,
    },
}

impl PipelineError {
    /// Process exit code for this error: stage initialization failures
    /// exit 2, everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::StageInit { .. } => 2,
            _ => 1,
        }
    }

    /// Whether the driver should print the usage text for this error.
    pub fn is_usage(&self) -> bool {
        matches!(self, PipelineError::Usage(_))
    }
}
