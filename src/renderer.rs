//! Build session handed to the host pipeline: one pool and one cache per build.

use log::{debug, info};
use std::path::Path;

use crate::engine::pool::WorkerPool;
use crate::engine::preflight::{check_importable, check_runner, resolve_executable};
use crate::error::{DocumentError, RenderError};
use crate::outline;
use crate::pipeline::{self, ProgressFn, RenderCache};
use crate::utils::config::{RendererDefaults, STYLESHEET_PATH};
use crate::{Document, OutlineNode, RendererConfig};

pub struct Renderer {
    config: RendererConfig,
    pool: WorkerPool,
    cache: RenderCache,
}

impl Renderer {
    /// Resolve the executable, check the runner script exists, run the preflight check
    /// (if configured), start the pool. Any failure here is fatal to the build.
    pub fn start(config: RendererConfig) -> Result<Renderer, RenderError> {
        let executable = resolve_executable(&config.executable)?;
        debug!("Using renderer executable at {}", executable.display());
        check_runner(&config.executable, &config.runner)?;
        if let Some(args) = &config.preflight {
            check_importable(&executable, args, RendererDefaults::PREFLIGHT_TIMEOUT)?;
        }

        let config = RendererConfig {
            executable: executable.to_string_lossy().into_owned(),
            ..config
        };
        let pool = WorkerPool::start(&config)?;
        Ok(Renderer {
            config,
            pool,
            cache: RenderCache::new(),
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Pre-render `documents`, replacing whatever an earlier batch left in the cache.
    /// Must finish before the first [`resolve`](Self::resolve); `&mut self` enforces that.
    pub fn prerender_all(&mut self, documents: &[Document]) {
        self.prerender_all_with_progress(documents, None);
    }

    pub fn prerender_all_with_progress(
        &mut self,
        documents: &[Document],
        on_done: Option<&ProgressFn>,
    ) {
        self.cache = pipeline::prerender_all_with_progress(documents, &self.pool, on_done);
        info!(
            "Pre-rendered {} documents ({} failed)",
            self.cache.rendered_len(),
            self.cache.failed_len()
        );
    }

    /// HTML for `path`, consuming its cache entry. See [`pipeline::resolve`].
    pub fn resolve(&self, path: &Path, fallback_text: &str) -> Result<String, DocumentError> {
        pipeline::resolve(&self.cache, path, fallback_text, &self.pool)
    }

    pub fn build_outline(&self, html: &str) -> Vec<OutlineNode> {
        outline::build_outline(html)
    }

    /// Terminate all workers. Also happens on drop.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

/// Append the bundled stylesheet to the site's asset list unless already there.
/// Returns true when it was added.
pub fn register_stylesheet(assets: &mut Vec<String>) -> bool {
    if assets.iter().any(|a| a == STYLESHEET_PATH) {
        return false;
    }
    assets.push(STYLESHEET_PATH.to_string());
    true
}
