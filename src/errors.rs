//! Error taxonomy for pipeline construction and submission
//!
//! None of these errors are recovered locally. Any of them aborts the remainder of the run, while
//! jobs already accepted by the scheduler are left queued.
//!

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed settings or input set, detected before anything is submitted
    #[error("Configuration error: {0}")]
    Config(String),

    /// The scheduler rejected a stage or returned a response without a usable job id
    #[error("Submission failed for stage '{stage}': {reason}\nCommand: {command}")]
    Submission {
        stage: String,
        command: String,
        reason: String,
    },

    #[error("Filesystem error at '{path}': {source}")]
    Filesystem {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn filesystem(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Process exit status used when this error terminates the run
    pub fn exit_code(&self) -> exitcode::ExitCode {
        match self {
            Self::Config(_) => exitcode::CONFIG,
            Self::Submission { .. } => exitcode::UNAVAILABLE,
            Self::Filesystem { .. } => exitcode::CANTCREAT,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
