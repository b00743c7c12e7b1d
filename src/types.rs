//! Public types shared by the pool, the pre-render pass and the host pipeline.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::config::RendererDefaults;

/// One source document as the host pipeline sees it.
#[derive(Clone, Debug)]
pub struct Document {
    /// Stable identity for the build (source path, usually relative to the docs root).
    pub path: PathBuf,
    /// Raw source text, front matter included.
    pub source: String,
    /// Filled by the host after [`build_outline`](crate::build_outline).
    pub outline: Vec<OutlineNode>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            outline: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// One heading in a document outline. Top-level nodes have no shallower enclosing heading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub title: String,
    pub id: String,
    /// 1..=6
    pub level: u8,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(title: impl Into<String>, id: impl Into<String>, level: u8) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            level,
            children: Vec::new(),
        }
    }
}

/// Successful render: HTML plus the renderer's non-fatal warnings, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub warnings: Vec<String>,
}

/// How to launch and supervise renderer workers.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Executable name or path (resolved on `PATH` when it has no separator).
    pub executable: String,
    /// Runner script passed as the first argument.
    pub runner: PathBuf,
    /// Optional renderer config file, passed as `--config <path>`.
    pub renderer_config: Option<PathBuf>,
    /// Per-exchange response timeout in milliseconds.
    pub timeout_ms: u64,
    /// Grace period for workers to exit at shutdown, in milliseconds.
    pub grace_ms: u64,
    /// Number of workers. 0 = auto (available parallelism).
    pub pool_size: usize,
    /// Arguments for the "renderer is importable" check. None skips the check.
    pub preflight: Option<Vec<String>>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            executable: RendererDefaults::EXECUTABLE.to_string(),
            runner: PathBuf::from(RendererDefaults::RUNNER),
            renderer_config: None,
            timeout_ms: RendererDefaults::TIMEOUT_MS,
            grace_ms: RendererDefaults::GRACE_MS,
            pool_size: RendererDefaults::POOL_SIZE,
            preflight: Some(vec![
                "-e".to_string(),
                RendererDefaults::PREFLIGHT_SCRIPT.to_string(),
            ]),
        }
    }
}

impl RendererConfig {
    /// Arguments for each worker: `<runner> [--config <path>]`.
    pub fn worker_args(&self) -> Vec<String> {
        let mut args = vec![self.runner.to_string_lossy().into_owned()];
        if let Some(cfg) = &self.renderer_config {
            args.push("--config".to_string());
            args.push(cfg.to_string_lossy().into_owned());
        }
        args
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    /// Pool width with 0 resolved to the number of available threads.
    pub fn effective_pool_size(&self) -> usize {
        match self.pool_size {
            0 => rayon::current_num_threads().max(1),
            n => n,
        }
    }
}
