//! End-to-end tests of the banded render pipeline: dispatcher, compositing,
//! generation handling, and the interactive session layer.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nalgebra::Vector2;

use mandelbrot_explorer::core::dispatcher::RenderDispatcher;
use mandelbrot_explorer::core::gradient::{GradientSpec, IN_SET_COLOR};
use mandelbrot_explorer::core::tile;
use mandelbrot_explorer::core::viewport::Viewport;
use mandelbrot_explorer::{Explorer, ExplorerSettings, Raster};

const DEADLINE: Duration = Duration::from_secs(10);

fn drain_until_complete(dispatcher: &RenderDispatcher, raster: &mut Raster) {
    raster.begin_generation(dispatcher.latest_generation());
    while !raster.is_complete() {
        match dispatcher.recv_update_timeout(DEADLINE) {
            Some(Ok(update)) => {
                raster.apply(&update);
            }
            Some(Err(error)) => panic!("worker failure: {}", error),
            None => panic!("timed out waiting for band updates"),
        }
    }
}

fn classic_viewport() -> Viewport {
    Viewport {
        min_x: -2.0,
        min_y: -1.25,
        max_x: 0.5,
        max_y: 1.25,
        max_iterations: 128,
    }
}

#[test]
fn test_parallel_render_matches_synchronous_reference() {
    let viewport = classic_viewport();
    let gradient = GradientSpec::default().build(viewport.max_iterations);

    let mut dispatcher = RenderDispatcher::new(4);
    dispatcher.dispatch(&viewport, 64, 64, &gradient).unwrap();

    let mut raster = Raster::new(64, 64);
    drain_until_complete(&dispatcher, &mut raster);

    let reference = tile::render(64, 64, &viewport, &gradient);
    assert_eq!(raster.data(), &reference[..]);
}

#[test]
fn test_end_to_end_pixel_classification() {
    let viewport = classic_viewport();
    let gradient = GradientSpec::default().build(viewport.max_iterations);

    let mut dispatcher = RenderDispatcher::new(2);
    dispatcher.dispatch(&viewport, 64, 64, &gradient).unwrap();

    let mut raster = Raster::new(64, 64);
    drain_until_complete(&dispatcher, &mut raster);

    // Pixel (26, 32) maps near (-1, 0): inside the period-2 bulb.
    assert_eq!(raster.pixel(26, 32), IN_SET_COLOR.0);

    // The top-right corner escapes almost immediately and gets a gradient color.
    let corner = raster.pixel(63, 0);
    assert_ne!(corner, IN_SET_COLOR.0);
    assert_eq!(corner[3], 255);
}

#[test]
fn test_repeated_renders_are_byte_identical() {
    let viewport = classic_viewport();
    let gradient = GradientSpec::default().build(viewport.max_iterations);
    let mut dispatcher = RenderDispatcher::new(3);

    let mut first = Raster::new(48, 48);
    dispatcher.dispatch(&viewport, 48, 48, &gradient).unwrap();
    drain_until_complete(&dispatcher, &mut first);

    let mut second = Raster::new(48, 48);
    dispatcher.dispatch(&viewport, 48, 48, &gradient).unwrap();
    drain_until_complete(&dispatcher, &mut second);

    assert_eq!(first.data(), second.data());
}

#[test]
fn test_stale_generation_never_overwrites_newer_frame() {
    let old_viewport = classic_viewport();
    let new_viewport = old_viewport.zoomed(0.5);
    let gradient = GradientSpec::default().build(old_viewport.max_iterations);

    // Dispatch two frames back to back; the single worker will deliver the
    // older frame's bands even though a newer frame has been requested.
    let mut dispatcher = RenderDispatcher::new(1);
    dispatcher
        .dispatch(&old_viewport, 32, 32, &gradient)
        .unwrap();
    let newest = dispatcher
        .dispatch(&new_viewport, 32, 32, &gradient)
        .unwrap();

    let mut raster = Raster::new(32, 32);
    raster.begin_generation(newest);

    let mut stale_updates = 0;
    while !raster.is_complete() {
        match dispatcher.recv_update_timeout(DEADLINE) {
            Some(Ok(update)) => {
                if !raster.apply(&update) {
                    stale_updates += 1;
                }
            }
            Some(Err(error)) => panic!("worker failure: {}", error),
            None => panic!("timed out waiting for band updates"),
        }
    }

    assert_eq!(stale_updates, 1);
    let reference = tile::render(32, 32, &new_viewport, &gradient);
    assert_eq!(raster.data(), &reference[..]);
}

/// `io::Write` sink that keeps the log readable from the test after the
/// explorer takes ownership of its copy.
#[derive(Clone, Default)]
struct SharedLog(Arc<Mutex<Vec<u8>>>);

impl SharedLog {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_explorer_session_renders_and_reports_timing() {
    let log = SharedLog::default();
    let mut explorer = Explorer::new(
        ExplorerSettings {
            resolution: Vector2::new(40, 40),
            worker_count: 2,
            ..Default::default()
        },
        log.clone(),
    )
    .unwrap();

    let settings = ExplorerSettings::default();
    explorer
        .request_render(settings.center, settings.plane_width, settings.max_iterations)
        .unwrap();

    let mut raster = Raster::new(40, 40);
    explorer.render_blocking(&mut raster, DEADLINE).unwrap();

    assert!(raster.is_complete());
    assert!(log.contents().contains("Generate Set #1"));

    // A second interaction produces a fresh generation and a fresh report.
    explorer.zoom_in().unwrap();
    explorer.render_blocking(&mut raster, DEADLINE).unwrap();
    assert!(log.contents().contains("Generate Set #2"));
}

#[test]
fn test_explorer_click_render_matches_recentered_viewport() {
    let mut explorer = Explorer::new(
        ExplorerSettings {
            resolution: Vector2::new(32, 32),
            worker_count: 2,
            ..Default::default()
        },
        io::sink(),
    )
    .unwrap();

    let settings = ExplorerSettings::default();
    explorer
        .request_render(settings.center, settings.plane_width, settings.max_iterations)
        .unwrap();
    explorer.click(8, 8).unwrap();

    let expected_viewport = *explorer.viewport();
    let mut raster = Raster::new(32, 32);
    explorer.render_blocking(&mut raster, DEADLINE).unwrap();

    let gradient = GradientSpec::default().build(expected_viewport.max_iterations);
    let reference = tile::render(32, 32, &expected_viewport, &gradient);
    assert_eq!(raster.data(), &reference[..]);
}
