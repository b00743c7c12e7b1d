//! Parallel pre-render pass: one render per document, fanned out over as many threads as
//! the pool has workers.

use log::{debug, warn};
use rayon::prelude::*;

use crate::Document;
use crate::engine::pool::WorkerPool;
use crate::error::RenderError;
use crate::pipeline::cache::RenderCache;
use crate::pipeline::log_render_notes;

/// Called with the number of documents just finished (always 1 today).
pub type ProgressFn = dyn Fn(usize) + Send + Sync;

/// Render every document through `pool` and return the filled cache.
pub fn prerender_all(documents: &[Document], pool: &WorkerPool) -> RenderCache {
    prerender_all_with_progress(documents, pool, None)
}

/// Like [`prerender_all`], reporting each finished document to `on_done`.
///
/// Failures are recorded per document and never stop the batch. Returns after every
/// document has an entry in one of the two maps.
pub fn prerender_all_with_progress(
    documents: &[Document],
    pool: &WorkerPool,
    on_done: Option<&ProgressFn>,
) -> RenderCache {
    let cache = RenderCache::new();
    let width = pool.capacity();

    if width == 0 {
        let started = pool.stats().started;
        for doc in documents {
            cache.insert_failed(doc.path.clone(), RenderError::PoolExhausted { started });
            report(on_done);
        }
        return cache;
    }

    let threads = rayon::ThreadPoolBuilder::new()
        .num_threads(width)
        .thread_name(|i| format!("markpool-render-{i}"))
        .build();
    match threads {
        Ok(threads) => threads.install(|| {
            documents
                .par_iter()
                .for_each(|doc| render_one(doc, pool, &cache, on_done));
        }),
        Err(e) => {
            warn!("Cannot build render thread pool ({}); rendering serially", e);
            for doc in documents {
                render_one(doc, pool, &cache, on_done);
            }
        }
    }

    debug!(
        "Pre-rendered {} documents with {} workers: {} ok, {} failed",
        documents.len(),
        width,
        cache.rendered_len(),
        cache.failed_len()
    );
    cache
}

fn render_one(doc: &Document, pool: &WorkerPool, cache: &RenderCache, on_done: Option<&ProgressFn>) {
    match pool.render(doc.source()) {
        Ok(rendered) => {
            log_render_notes(doc.path(), &rendered);
            cache.insert_rendered(doc.path.clone(), rendered.html);
        }
        Err(e) => {
            debug!("{}: pre-render failed: {}", doc.path.display(), e);
            cache.insert_failed(doc.path.clone(), e);
        }
    }
    report(on_done);
}

fn report(on_done: Option<&ProgressFn>) {
    if let Some(f) = on_done {
        f(1);
    }
}
