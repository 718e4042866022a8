//! Escape-time Mandelbrot renderer with an interactive pan/zoom session.
//!
//! The `core` module holds the rendering pipeline: the per-pixel escape-time
//! iteration, the viewport-to-plane pixel mapping, the precomputed color
//! gradient, the band renderer, and the worker-pool dispatcher that splits a
//! frame into row bands. The `explorer` module wraps it all in a session
//! object that a UI layer drives with render/zoom/click requests.

pub mod core;
pub mod explorer;

pub use crate::core::error::RenderError;
pub use crate::core::raster::Raster;
pub use crate::explorer::{Explorer, ExplorerSettings};
