use std::io;
use thiserror::Error;

/// Error during a tool invocation.
///
/// Only launch failures are errors. A tool that starts and exits nonzero
/// still resolves successfully with its exit code; interpreting codes is the
/// caller's job.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The executable could not be started (missing binary, permission,
    /// bad working directory).
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// I/O failure while waiting on the child or relaying its streams.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for liquictl-core operations.
pub type Result<T> = std::result::Result<T, InvokeError>;

impl InvokeError {
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
