//! Markpool: render Markdown through a pool of long-lived external Markdoc processes.
//!
//! The host pipeline starts a [`Renderer`], pre-renders its whole document set in parallel,
//! then asks for each page's HTML with [`Renderer::resolve`] and rebuilds the page outline
//! with [`build_outline`].

pub mod engine;
pub mod error;
pub mod outline;
pub mod pipeline;
pub mod renderer;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use error::{DocumentError, RenderError};
pub use outline::build_outline;
pub use renderer::{Renderer, register_stylesheet};
