use std::ops::Range;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use more_asserts::assert_ge;

use crate::core::error::RenderError;
use crate::core::gradient::Gradient;
use crate::core::tile;
use crate::core::viewport::Viewport;

/**
 * Immutable work unit handed to one worker: everything needed to render one
 * horizontal band of one frame. Workers share no mutable state with the
 * dispatcher or each other; jobs go in by value and pixel bytes come out.
 */
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub generation: u64,
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
    pub rows: Range<u32>,
    pub gradient: Gradient,
}

/// One completed band, tagged with the generation of the frame it belongs to.
#[derive(Debug, Clone)]
pub struct BandUpdate {
    pub generation: u64,
    pub width: u32,
    pub rows: Range<u32>,
    pub pixels: Vec<u8>,
}

/**
 * Run a single render job to completion. This is the body of the worker loop,
 * split out so the shape checks and failure path can be exercised directly.
 */
pub fn execute_job(job: RenderJob) -> Result<BandUpdate, RenderError> {
    if job.rows.end > job.height || job.rows.start >= job.rows.end {
        return Err(RenderError::WorkerFailure(format!(
            "band rows {:?} do not fit a raster of height {}",
            job.rows, job.height
        )));
    }
    if job.gradient.len() != job.viewport.max_iterations as usize {
        return Err(RenderError::WorkerFailure(format!(
            "gradient length {} does not match iteration cap {}",
            job.gradient.len(),
            job.viewport.max_iterations
        )));
    }

    let mut pixels = vec![0u8; tile::band_byte_count(job.width, &job.rows)];
    tile::render_rows(
        &mut pixels,
        job.width,
        job.height,
        job.rows.clone(),
        &job.viewport,
        &job.gradient,
    );

    Ok(BandUpdate {
        generation: job.generation,
        width: job.width,
        rows: job.rows,
        pixels,
    })
}

struct Worker {
    jobs: Sender<RenderJob>,
}

impl Worker {
    fn spawn(results: Sender<Result<BandUpdate, RenderError>>) -> Worker {
        let (jobs, job_rx) = channel::<RenderJob>();
        thread::spawn(move || {
            while let Ok(job) = job_rx.recv() {
                if results.send(execute_job(job)).is_err() {
                    // Dispatcher is gone; nothing left to report to.
                    return;
                }
            }
        });
        Worker { jobs }
    }
}

/**
 * Splits each frame into one row-band per worker and hands the bands to
 * long-lived worker threads over channels. Dispatching never blocks; the
 * caller drains `BandUpdate`s as they arrive and composites them itself.
 *
 * Each dispatch bumps a generation counter and tags every job with it. An
 * in-flight render is never cancelled when a new one is requested, so both
 * sets of results will eventually arrive; compositors must drop updates
 * carrying a stale generation.
 */
pub struct RenderDispatcher {
    workers: Vec<Worker>,
    results: Receiver<Result<BandUpdate, RenderError>>,
    generation: u64,
}

impl RenderDispatcher {
    pub fn new(worker_count: usize) -> RenderDispatcher {
        assert_ge!(worker_count, 1);
        let (result_tx, results) = channel();
        let workers = (0..worker_count)
            .map(|_| Worker::spawn(result_tx.clone()))
            .collect();
        RenderDispatcher {
            workers,
            results,
            generation: 0,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Generation tag of the most recently dispatched render; zero before any.
    pub fn latest_generation(&self) -> u64 {
        self.generation
    }

    /**
     * Validate the request, tag it with a fresh generation, and enqueue one
     * band per worker. Returns the generation without waiting for results.
     */
    pub fn dispatch(
        &mut self,
        viewport: &Viewport,
        width: u32,
        height: u32,
        gradient: &Gradient,
    ) -> Result<u64, RenderError> {
        viewport.validate()?;
        if width < 1 || height < 1 {
            return Err(RenderError::InvalidViewport(format!(
                "raster dimensions {}x{} must be positive",
                width, height
            )));
        }
        if gradient.len() != viewport.max_iterations as usize {
            return Err(RenderError::InvalidViewport(format!(
                "gradient length {} does not match iteration cap {}",
                gradient.len(),
                viewport.max_iterations
            )));
        }

        self.generation += 1;
        let bands = split_rows(height, self.workers.len());
        for (worker, rows) in self.workers.iter().zip(bands) {
            let job = RenderJob {
                generation: self.generation,
                viewport: *viewport,
                width,
                height,
                rows,
                gradient: gradient.clone(),
            };
            worker.jobs.send(job).map_err(|_| {
                RenderError::WorkerFailure("worker channel disconnected".to_string())
            })?;
        }
        Ok(self.generation)
    }

    /// Non-blocking poll for the next completed band (or worker failure).
    pub fn try_recv_update(&self) -> Option<Result<BandUpdate, RenderError>> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RenderError::WorkerFailure(
                "all workers disconnected".to_string(),
            ))),
        }
    }

    /// Blocking poll with a timeout, for callers without an event loop.
    pub fn recv_update_timeout(
        &self,
        timeout: Duration,
    ) -> Option<Result<BandUpdate, RenderError>> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => None,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => Some(Err(
                RenderError::WorkerFailure("all workers disconnected".to_string()),
            )),
        }
    }
}

/**
 * Partition `height` rows into at most `band_count` contiguous non-empty
 * bands, spreading any remainder across the leading bands.
 */
pub fn split_rows(height: u32, band_count: usize) -> Vec<Range<u32>> {
    let band_count = band_count.min(height as usize) as u32;
    let base = height / band_count;
    let remainder = height % band_count;

    let mut bands = Vec::with_capacity(band_count as usize);
    let mut start = 0;
    for i in 0..band_count {
        let extra = if i < remainder { 1 } else { 0 };
        let end = start + base + extra;
        bands.push(start..end);
        start = end;
    }
    bands
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector2;

    use super::*;
    use crate::core::gradient::GradientSpec;

    #[test]
    fn test_split_rows_covers_every_row_once() {
        for (height, bands) in [(21, 4), (8, 8), (5, 8), (100, 3), (1, 1)] {
            let parts = split_rows(height, bands);
            assert!(parts.len() <= bands);
            let mut expected_start = 0;
            for rows in &parts {
                assert_eq!(rows.start, expected_start);
                assert!(rows.end > rows.start);
                expected_start = rows.end;
            }
            assert_eq!(expected_start, height);
        }
    }

    #[test]
    fn test_execute_job_rejects_bad_shapes() {
        let viewport = Viewport::from_center_and_width(Vector2::new(-0.5, 0.0), 2.0, 16);
        let gradient = GradientSpec::default().build(16);

        let job = RenderJob {
            generation: 1,
            viewport,
            width: 10,
            height: 10,
            rows: 4..12, // extends past the raster
            gradient: gradient.clone(),
        };
        assert!(matches!(
            execute_job(job),
            Err(RenderError::WorkerFailure(_))
        ));

        let job = RenderJob {
            generation: 1,
            viewport,
            width: 10,
            height: 10,
            rows: 0..10,
            gradient: GradientSpec::default().build(8), // wrong table length
        };
        assert!(matches!(
            execute_job(job),
            Err(RenderError::WorkerFailure(_))
        ));
    }

    #[test]
    fn test_dispatch_rejects_invalid_requests() {
        let mut dispatcher = RenderDispatcher::new(2);
        let viewport = Viewport::from_center_and_width(Vector2::new(-0.5, 0.0), 2.0, 16);
        let gradient = GradientSpec::default().build(16);

        let mut degenerate = viewport;
        degenerate.max_x = degenerate.min_x - 1.0;
        assert!(dispatcher
            .dispatch(&degenerate, 8, 8, &gradient)
            .is_err());

        assert!(dispatcher.dispatch(&viewport, 0, 8, &gradient).is_err());
        assert!(dispatcher
            .dispatch(&viewport, 8, 8, &GradientSpec::default().build(4))
            .is_err());

        // Nothing was enqueued and no generation was consumed.
        assert_eq!(dispatcher.latest_generation(), 0);
        assert!(dispatcher.try_recv_update().is_none());
    }

    #[test]
    fn test_dispatch_generations_increase() {
        let mut dispatcher = RenderDispatcher::new(1);
        let viewport = Viewport::from_center_and_width(Vector2::new(-0.5, 0.0), 2.0, 8);
        let gradient = GradientSpec::default().build(8);

        let first = dispatcher.dispatch(&viewport, 4, 4, &gradient).unwrap();
        let second = dispatcher.dispatch(&viewport, 4, 4, &gradient).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(dispatcher.latest_generation(), 2);
    }
}
