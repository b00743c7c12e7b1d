//! Error taxonomy for worker, pool and document failures.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong between launching a renderer and getting HTML back.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Executable missing, unstartable, or the preflight check failed. Fatal at pool start.
    #[error("cannot launch renderer '{executable}': {message}")]
    Launch { executable: String, message: String },

    /// Response line was not valid protocol JSON.
    #[error("malformed renderer response ({detail}): {line}")]
    Protocol { detail: String, line: String },

    /// Worker process had already exited before the request was sent.
    #[error("worker {worker_id} is no longer running")]
    WorkerDead { worker_id: usize },

    /// Worker closed its output (or the pipe broke) before answering.
    #[error("worker {worker_id} exited before producing a response")]
    WorkerExited { worker_id: usize },

    /// No response line within the exchange timeout; the worker was killed.
    #[error("renderer timed out after {} ms (worker {worker_id} killed)", .timeout.as_millis())]
    RenderTimeout { worker_id: usize, timeout: Duration },

    /// The renderer rejected the document. The message is the renderer's own text.
    #[error("renderer reported an error: {message}")]
    RenderFailed { message: String },

    /// Every worker in the pool has been destroyed, or the pool was shut down.
    #[error("no renderer workers left ({started} started; all destroyed or shut down)")]
    PoolExhausted { started: usize },

    #[error("renderer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Whether the worker used for the failed exchange may go back into the pool (if still alive).
    pub fn worker_reusable(&self) -> bool {
        matches!(
            self,
            RenderError::Protocol { .. } | RenderError::RenderFailed { .. }
        )
    }
}

/// A [`RenderError`] attributed to the document that caused it.
#[derive(Debug, Error)]
#[error("markpool: rendering failed for '{}': {source}", .path.display())]
pub struct DocumentError {
    pub path: PathBuf,
    #[source]
    pub source: RenderError,
}

impl DocumentError {
    pub fn new(path: impl Into<PathBuf>, source: RenderError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
