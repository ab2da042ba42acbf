//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `source` so its longer edge is at most `max_long_edge`, keeping the
/// aspect ratio. Images already within the bound are returned unchanged.
///
/// # Examples
/// ```
/// # use folio::imaging::bounded_dimensions;
/// // 4000x3000 landscape bounded to 1200 → 1200x900
/// assert_eq!(bounded_dimensions((4000, 3000), 1200), (1200, 900));
///
/// // Already small enough: untouched
/// assert_eq!(bounded_dimensions((800, 600), 1200), (800, 600));
/// ```
pub fn bounded_dimensions(source: (u32, u32), max_long_edge: u32) -> (u32, u32) {
    let (w, h) = source;
    let longer = w.max(h);
    if longer <= max_long_edge || longer == 0 {
        return source;
    }

    let ratio = max_long_edge as f64 / longer as f64;
    if w >= h {
        // Landscape or square
        (max_long_edge, ((h as f64 * ratio).round() as u32).max(1))
    } else {
        // Portrait
        (((w as f64 * ratio).round() as u32).max(1), max_long_edge)
    }
}
