use std::ops::Range;

use more_asserts::assert_le;

use crate::core::escape_time::escape_iterations;
use crate::core::gradient::Gradient;
use crate::core::viewport::{PixelMap, Viewport};

pub const BYTES_PER_PIXEL: usize = 4;

/// Number of bytes needed for a band covering `rows` of a `width`-pixel-wide raster.
pub fn band_byte_count(width: u32, rows: &Range<u32>) -> usize {
    (rows.end - rows.start) as usize * width as usize * BYTES_PER_PIXEL
}

/**
 * Render one horizontal band of a `width` x `height` raster into a band-local
 * RGBA buffer. `rows` indexes into the full raster; byte offsets within
 * `pixels` are relative to the top of the band, so disjoint bands can be
 * computed independently, in any order, and composited by a plain copy.
 *
 * Pure with respect to its inputs: the same band always produces the same bytes.
 */
pub fn render_rows(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    rows: Range<u32>,
    viewport: &Viewport,
    gradient: &Gradient,
) {
    assert_le!(rows.end, height);
    assert_eq!(pixels.len(), band_byte_count(width, &rows));
    assert_eq!(gradient.len(), viewport.max_iterations as usize);

    let pixel_map = PixelMap::new(width, height, viewport);

    for y in rows.clone() {
        for x in 0..width {
            let (cx, cy) = pixel_map.to_complex(x, y);
            let iterations = escape_iterations(cx, cy, viewport.max_iterations);
            let color = gradient.color_for(iterations);

            let offset = (((y - rows.start) * width + x) as usize) * BYTES_PER_PIXEL;
            pixels[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color.0);
        }
    }
}

/**
 * Synchronous whole-raster render: the reference algorithm, of which the
 * dispatcher's banded render is the parallel deployment.
 */
pub fn render(width: u32, height: u32, viewport: &Viewport, gradient: &Gradient) -> Vec<u8> {
    let mut pixels = vec![0u8; band_byte_count(width, &(0..height))];
    render_rows(&mut pixels, width, height, 0..height, viewport, gradient);
    pixels
}
