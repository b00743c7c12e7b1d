//! Build-time passes over a batch of documents: parallel pre-render and cache-backed lookup.

pub mod cache;
pub mod prerender;

pub use cache::{RenderCache, resolve};
pub use prerender::{ProgressFn, prerender_all, prerender_all_with_progress};

use log::warn;
use std::path::Path;

use crate::Rendered;

/// Log renderer warnings and suspicious empty output for one document.
pub(crate) fn log_render_notes(path: &Path, rendered: &Rendered) {
    for w in &rendered.warnings {
        warn!("{}: {}", path.display(), w);
    }
    if rendered.html.is_empty() {
        warn!("{}: renderer returned empty HTML", path.display());
    }
}
