//! Physical length to pixel conversions.

/// Millimetres in one inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Canvas size in pixels, derived once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasDimensions {
    pub width: i64,
    pub height: i64,
}

/// Convert a length in millimetres to a pixel count at `dpi`.
///
/// Computes `truncate(length_mm * dpi / 25.4 + 0.5)`, which is round-half-up
/// for non-negative inputs. Negative inputs go through the same formula
/// (truncation is toward zero) and are not clamped.
pub fn mm_to_px(length_mm: f64, dpi: f64) -> i64 {
    (length_mm * dpi / MM_PER_INCH + 0.5) as i64
}

/// Rescale a pixel count measured at `reference_dpi` to `dpi`, truncating.
pub fn rescale_px(px_at_reference: f64, reference_dpi: f64, dpi: f64) -> i64 {
    (px_at_reference / reference_dpi * dpi) as i64
}

/// Compute the drawable canvas: the page rescaled to `dpi`, minus the margins.
pub fn canvas_dimensions(
    page_width_px: f64,
    page_height_px: f64,
    reference_dpi: f64,
    margin_x_mm: f64,
    margin_y_mm: f64,
    dpi: f64,
) -> CanvasDimensions {
    CanvasDimensions {
        width: rescale_px(page_width_px, reference_dpi, dpi) - mm_to_px(margin_x_mm, dpi),
        height: rescale_px(page_height_px, reference_dpi, dpi) - mm_to_px(margin_y_mm, dpi),
    }
}
