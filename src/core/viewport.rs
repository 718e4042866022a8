use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::core::error::RenderError;

/**
 * Rectangular region of the complex plane plus an iteration cap: everything
 * needed to describe one rendered frame. Viewports are immutable values;
 * every pan, zoom, or recenter interaction produces a fresh one.
 */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_iterations: u32,
}

impl Viewport {
    /**
     * Build a square viewport of the given plane width centered on `center`.
     * The region is square regardless of the raster's aspect ratio; callers
     * that want square pixels should render into a square raster.
     */
    pub fn from_center_and_width(
        center: Vector2<f64>,
        plane_width: f64,
        max_iterations: u32,
    ) -> Viewport {
        let half = plane_width / 2.0;
        Viewport {
            min_x: center[0] - half,
            min_y: center[1] - half,
            max_x: center[0] + half,
            max_y: center[1] + half,
            max_iterations,
        }
    }

    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(
            self.min_x + 0.5 * (self.max_x - self.min_x),
            self.min_y + 0.5 * (self.max_y - self.min_y),
        )
    }

    pub fn plane_width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// New viewport with the plane width scaled by `factor` about the center.
    pub fn zoomed(&self, factor: f64) -> Viewport {
        Viewport::from_center_and_width(
            self.center(),
            self.plane_width() * factor,
            self.max_iterations,
        )
    }

    /// New viewport with the same width and iteration cap, moved to `center`.
    pub fn recentered(&self, center: Vector2<f64>) -> Viewport {
        Viewport::from_center_and_width(center, self.plane_width(), self.max_iterations)
    }

    /**
     * Fail-fast check run before any render is dispatched. A degenerate or
     * non-finite viewport would otherwise propagate NaN through the pixel
     * mapping and into gradient lookups.
     */
    pub fn validate(&self) -> Result<(), RenderError> {
        let bounds = [self.min_x, self.min_y, self.max_x, self.max_y];
        if bounds.iter().any(|value| !value.is_finite()) {
            return Err(RenderError::InvalidViewport(
                "bounds must be finite".to_string(),
            ));
        }
        if self.max_x <= self.min_x {
            return Err(RenderError::InvalidViewport(format!(
                "max_x ({}) must exceed min_x ({})",
                self.max_x, self.min_x
            )));
        }
        if self.max_y <= self.min_y {
            return Err(RenderError::InvalidViewport(format!(
                "max_y ({}) must exceed min_y ({})",
                self.max_y, self.min_y
            )));
        }
        if self.max_iterations < 1 {
            return Err(RenderError::InvalidViewport(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/**
 * Maps pixel coordinates of a `width` x `height` raster onto the complex
 * plane spanned by a viewport. Pixel row zero maps to `max_y`: raster rows
 * grow downward while the imaginary axis grows upward.
 */
#[derive(Debug, Clone, Copy)]
pub struct PixelMap {
    min_x: f64,
    max_y: f64,
    dx: f64,
    dy: f64,
}

impl PixelMap {
    pub fn new(width: u32, height: u32, viewport: &Viewport) -> PixelMap {
        assert!(width > 0);
        assert!(height > 0);
        PixelMap {
            min_x: viewport.min_x,
            max_y: viewport.max_y,
            dx: (viewport.max_x - viewport.min_x) / (width as f64),
            dy: (viewport.max_y - viewport.min_y) / (height as f64),
        }
    }

    // Map from pixel (integer) to point on the complex plane.
    pub fn to_complex(&self, px: u32, py: u32) -> (f64, f64) {
        (
            self.min_x + (px as f64) * self.dx,
            self.max_y - (py as f64) * self.dy,
        )
    }
}
