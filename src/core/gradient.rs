use image::Rgba;
use more_asserts::assert_ge;
use serde::{Deserialize, Serialize};

/// Color painted for points that never escape within the iteration cap.
pub const IN_SET_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/**
 * Endpoint colors for a gradient, as stored in a parameter file. The table
 * itself is rebuilt whenever the iteration cap changes, so only the two
 * endpoints are persisted.
 */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientSpec {
    pub start: [u8; 4], // [R, G, B, A]
    pub end: [u8; 4],
}

impl Default for GradientSpec {
    fn default() -> GradientSpec {
        GradientSpec {
            start: [255, 0, 0, 255],
            end: [0, 0, 255, 255],
        }
    }
}

impl GradientSpec {
    pub fn build(&self, steps: u32) -> Gradient {
        Gradient::linear(Rgba(self.start), Rgba(self.end), steps)
    }
}

/**
 * Precomputed color-per-iteration-count lookup table. Entry `k` is the color
 * for a point that escaped after `k + 1` iterations; the table length equals
 * the iteration cap, and points that reach the cap use `IN_SET_COLOR` instead.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gradient {
    entries: Vec<Rgba<u8>>,
}

impl Gradient {
    /**
     * Linear per-channel interpolation from `start` toward `end`.
     *
     * Each channel advances by `(end - start) / steps` per entry, floored to
     * an integer. Note the asymmetry inherited from the reference behavior:
     * entry `steps - 1` stops one step short of `end`, which is never emitted.
     * Every entry lies between the two endpoints, so the channel values cannot
     * leave `[0, 255]` and no clamping is performed.
     */
    pub fn linear(start: Rgba<u8>, end: Rgba<u8>, steps: u32) -> Gradient {
        assert_ge!(steps, 1);

        let mut channel_steps = [0.0f64; 4];
        for c in 0..4 {
            channel_steps[c] = (end.0[c] as f64 - start.0[c] as f64) / (steps as f64);
        }

        let mut entries = Vec::with_capacity(steps as usize);
        for i in 0..steps {
            let mut channels = [0u8; 4];
            for c in 0..4 {
                channels[c] = (start.0[c] as f64 + channel_steps[c] * (i as f64)).floor() as u8;
            }
            entries.push(Rgba(channels));
        }

        Gradient { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Rgba<u8> {
        self.entries[index]
    }

    /**
     * Map a 1-based escape iteration count to a color. The count must come
     * from an iteration with the same cap used to size this table.
     */
    pub fn color_for(&self, iterations: u32) -> Rgba<u8> {
        if iterations as usize >= self.entries.len() {
            IN_SET_COLOR
        } else {
            self.entries[(iterations - 1) as usize]
        }
    }
}
