/**
 * The escape-time iteration at the heart of the renderer.
 *
 * @param cx: real coordinate of the test point on the complex plane
 * @param cy: imaginary coordinate of the test point
 * @param max: iteration cap; must be at least one
 * @return: 1-based iteration at which the point escaped the radius-2 disk,
 *          or `max` if it survived the full budget (treated as "in the set").
 */
pub fn escape_iterations(cx: f64, cy: f64, max: u32) -> u32 {
    let mut x = cx;
    let mut y = cy;
    let mut count = 1;

    // Z = Z*Z + C, starting from Z = C.
    while x * x + y * y < 4.0 && count < max {
        let temp_x = x * x - y * y + cx;
        y = 2.0 * x * y + cy;
        x = temp_x;
        count += 1;
    }

    count
}
