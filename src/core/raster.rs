use crate::core::dispatcher::BandUpdate;
use crate::core::tile::BYTES_PER_PIXEL;

/**
 * The caller-owned display surface: a row-major RGBA byte grid plus the
 * generation of the frame currently being composited into it. All writes
 * happen through `apply` on the caller's own scheduling context, keeping a
 * single-writer discipline over the pixel bytes.
 */
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
    generation: u64,
    remaining_rows: u32,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Raster {
        assert!(width > 0);
        assert!(height > 0);
        Raster {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
            generation: 0,
            remaining_rows: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /**
     * Start compositing a newly dispatched frame. Older generations already
     * in flight keep producing band updates; after this call they no longer
     * match and will be ignored by `apply`. Re-announcing the current
     * generation is a no-op.
     */
    pub fn begin_generation(&mut self, generation: u64) {
        if generation > self.generation {
            self.generation = generation;
            self.remaining_rows = self.height;
        }
    }

    /**
     * Composite one completed band into place. Returns true if the band was
     * applied; stale-generation updates are discarded untouched, so a newer
     * frame can never be overwritten by a slow worker from an older one.
     */
    pub fn apply(&mut self, update: &BandUpdate) -> bool {
        if update.generation != self.generation {
            return false;
        }
        assert_eq!(update.width, self.width);
        assert!(update.rows.end <= self.height);

        let start = update.rows.start as usize * self.width as usize * BYTES_PER_PIXEL;
        self.data[start..start + update.pixels.len()].copy_from_slice(&update.pixels);
        self.remaining_rows -= update.rows.end - update.rows.start;
        true
    }

    /// True once every row of the current generation has been composited.
    pub fn is_complete(&self) -> bool {
        self.generation > 0 && self.remaining_rows == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width);
        assert!(y < self.height);
        let offset = ((y * self.width + x) as usize) * BYTES_PER_PIXEL;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }
}
