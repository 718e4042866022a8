use std::io::Write;
use std::time::{Duration, Instant};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::core::dispatcher::RenderDispatcher;
use crate::core::error::RenderError;
use crate::core::gradient::{Gradient, GradientSpec};
use crate::core::raster::Raster;
use crate::core::stopwatch::Stopwatch;
use crate::core::viewport::{PixelMap, Viewport};

/**
 * Startup parameters for an interactive session. The defaults reproduce the
 * classic first view of the set: a width-2 square centered on (-0.5, 0) with
 * a 128-entry red-to-blue gradient.
 */
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExplorerSettings {
    pub resolution: Vector2<u32>,
    pub center: Vector2<f64>,
    pub plane_width: f64,
    pub max_iterations: u32,
    pub gradient: GradientSpec,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    pub worker_count: usize,
}

impl Default for ExplorerSettings {
    fn default() -> ExplorerSettings {
        ExplorerSettings {
            resolution: Vector2::new(512, 512),
            center: Vector2::new(-0.5, 0.0),
            plane_width: 2.0,
            max_iterations: 128,
            gradient: GradientSpec::default(),
            zoom_in_factor: 0.85,
            zoom_out_factor: 1.15,
            worker_count: 1,
        }
    }
}

/**
 * Owns the state of one pan/zoom session: the current viewport, the gradient
 * built for its iteration cap, the dispatcher, and a log sink for timing
 * reports. Every interaction replaces the viewport with a fresh value and
 * re-dispatches; nothing here is ambient or global.
 *
 * The caller keeps ownership of the display raster and pumps completed bands
 * into it from its own scheduling context.
 */
pub struct Explorer<W: Write> {
    resolution: Vector2<u32>,
    viewport: Viewport,
    gradient_spec: GradientSpec,
    gradient: Gradient,
    zoom_in_factor: f64,
    zoom_out_factor: f64,
    dispatcher: RenderDispatcher,
    stopwatch: Option<Stopwatch>,
    sink: W,
}

impl<W: Write> Explorer<W> {
    pub fn new(settings: ExplorerSettings, sink: W) -> Result<Explorer<W>, RenderError> {
        let viewport = Viewport::from_center_and_width(
            settings.center,
            settings.plane_width,
            settings.max_iterations,
        );
        viewport.validate()?;

        Ok(Explorer {
            resolution: settings.resolution,
            viewport,
            gradient_spec: settings.gradient,
            gradient: settings.gradient.build(settings.max_iterations),
            zoom_in_factor: settings.zoom_in_factor,
            zoom_out_factor: settings.zoom_out_factor,
            dispatcher: RenderDispatcher::new(settings.worker_count),
            stopwatch: None,
            sink,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn resolution(&self) -> Vector2<u32> {
        self.resolution
    }

    pub fn latest_generation(&self) -> u64 {
        self.dispatcher.latest_generation()
    }

    /// Build a fresh viewport (and gradient, if the cap changed) and dispatch it.
    pub fn request_render(
        &mut self,
        center: Vector2<f64>,
        plane_width: f64,
        max_iterations: u32,
    ) -> Result<u64, RenderError> {
        let viewport = Viewport::from_center_and_width(center, plane_width, max_iterations);
        viewport.validate()?;
        if max_iterations != self.viewport.max_iterations {
            self.gradient = self.gradient_spec.build(max_iterations);
        }
        self.viewport = viewport;
        self.dispatch_current()
    }

    pub fn zoom(&mut self, factor: f64) -> Result<u64, RenderError> {
        self.viewport = self.viewport.zoomed(factor);
        self.dispatch_current()
    }

    pub fn zoom_in(&mut self) -> Result<u64, RenderError> {
        let factor = self.zoom_in_factor;
        self.zoom(factor)
    }

    pub fn zoom_out(&mut self) -> Result<u64, RenderError> {
        let factor = self.zoom_out_factor;
        self.zoom(factor)
    }

    /// Recenter on the clicked pixel, keeping the plane width and iteration cap.
    pub fn click(&mut self, px: u32, py: u32) -> Result<u64, RenderError> {
        let pixel_map = PixelMap::new(self.resolution[0], self.resolution[1], &self.viewport);
        let (cx, cy) = pixel_map.to_complex(px, py);
        self.viewport = self.viewport.recentered(Vector2::new(cx, cy));
        self.dispatch_current()
    }

    fn dispatch_current(&mut self) -> Result<u64, RenderError> {
        let generation = self.dispatcher.dispatch(
            &self.viewport,
            self.resolution[0],
            self.resolution[1],
            &self.gradient,
        )?;
        self.stopwatch = Some(Stopwatch::new(format!("Generate Set #{}", generation)));
        Ok(generation)
    }

    /**
     * Drain every band update currently available and composite the ones from
     * the latest generation into the caller's raster; stale generations are
     * dropped by the raster. Returns true when this call completed the frame,
     * at which point a timing report is written to the log sink.
     *
     * A surfaced worker failure abandons the in-flight render: the error is
     * returned and no further bands from it are composited by this call.
     */
    pub fn pump_into(&mut self, raster: &mut Raster) -> Result<bool, RenderError> {
        raster.begin_generation(self.dispatcher.latest_generation());

        while !raster.is_complete() {
            match self.dispatcher.try_recv_update() {
                Some(Ok(update)) => {
                    raster.apply(&update);
                }
                Some(Err(error)) => {
                    self.stopwatch = None;
                    return Err(error);
                }
                None => return Ok(false),
            }
        }

        if let Some(stopwatch) = self.stopwatch.take() {
            stopwatch
                .report(&mut self.sink)
                .map_err(|error| RenderError::WorkerFailure(error.to_string()))?;
            Ok(true)
        } else {
            // Frame already reported on an earlier pump.
            Ok(false)
        }
    }

    /**
     * Convenience wrapper for callers without an event loop: block until the
     * latest dispatched frame is fully composited or the deadline passes.
     */
    pub fn render_blocking(
        &mut self,
        raster: &mut Raster,
        deadline: Duration,
    ) -> Result<(), RenderError> {
        let start = Instant::now();
        loop {
            if self.pump_into(raster)? || raster.is_complete() {
                return Ok(());
            }
            if start.elapsed() > deadline {
                return Err(RenderError::WorkerFailure(
                    "render deadline exceeded".to_string(),
                ));
            }
            match self.dispatcher.recv_update_timeout(Duration::from_millis(20)) {
                Some(Ok(update)) => {
                    raster.apply(&update);
                }
                Some(Err(error)) => {
                    self.stopwatch = None;
                    return Err(error);
                }
                None => {}
            }
        }
    }
}
