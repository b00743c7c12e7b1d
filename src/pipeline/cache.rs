//! Per-build render cache and the lookup that consumes it.

use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine::pool::WorkerPool;
use crate::error::{DocumentError, RenderError};
use crate::pipeline::log_render_notes;

/// Results of the pre-render pass keyed by document path. Each key is written once by the
/// scheduler and consumed at most once by [`resolve`].
#[derive(Default)]
pub struct RenderCache {
    rendered: Mutex<HashMap<PathBuf, String>>,
    failed: Mutex<HashMap<PathBuf, RenderError>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_rendered(&self, path: PathBuf, html: String) {
        if lock(&self.rendered).insert(path.clone(), html).is_some() {
            warn!("{} was pre-rendered twice; keeping the latest", path.display());
        }
    }

    pub fn insert_failed(&self, path: PathBuf, err: RenderError) {
        if lock(&self.failed).insert(path.clone(), err).is_some() {
            warn!("{} failed twice during pre-render; keeping the latest", path.display());
        }
    }

    pub fn take_rendered(&self, path: &Path) -> Option<String> {
        lock(&self.rendered).remove(path)
    }

    pub fn take_failed(&self, path: &Path) -> Option<RenderError> {
        lock(&self.failed).remove(path)
    }

    pub fn rendered_len(&self) -> usize {
        lock(&self.rendered).len()
    }

    pub fn failed_len(&self) -> usize {
        lock(&self.failed).len()
    }

    pub fn contains_rendered(&self, path: &Path) -> bool {
        lock(&self.rendered).contains_key(path)
    }

    pub fn contains_failed(&self, path: &Path) -> bool {
        lock(&self.failed).contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.rendered_len() == 0 && self.failed_len() == 0
    }
}

/// HTML for `path`: a deferred pre-render failure first, then a cached result, then a
/// synchronous render of `fallback_text` through `pool` (which leaves the cache alone).
///
/// Entries are consumed, so a second call for the same path goes straight to the fallback.
pub fn resolve(
    cache: &RenderCache,
    path: &Path,
    fallback_text: &str,
    pool: &WorkerPool,
) -> Result<String, DocumentError> {
    if let Some(err) = cache.take_failed(path) {
        return Err(DocumentError::new(path, err));
    }
    if let Some(html) = cache.take_rendered(path) {
        return Ok(html);
    }

    debug!("{}: not pre-rendered, rendering now", path.display());
    let rendered = pool
        .render(fallback_text)
        .map_err(|e| DocumentError::new(path, e))?;
    log_render_notes(path, &rendered);
    Ok(rendered.html)
}
