/// Mapping from projected map coordinates to canvas pixels

use crate::units::MM_PER_INCH;
use crate::Bounds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Visible extent after aspect correction
    pub extent: Bounds,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Fit `bounds` to the canvas, growing the short axis around its centre.
    pub fn fit(bounds: Bounds, width: u32, height: u32) -> Self {
        let mut extent = bounds;
        let canvas_ratio = width as f64 / height as f64;
        let box_ratio = bounds.width() / bounds.height();

        if box_ratio > canvas_ratio {
            let cy = (bounds.min_y + bounds.max_y) / 2.0;
            let half = bounds.width() / canvas_ratio / 2.0;
            extent.min_y = cy - half;
            extent.max_y = cy + half;
        } else if box_ratio < canvas_ratio {
            let cx = (bounds.min_x + bounds.max_x) / 2.0;
            let half = bounds.height() * canvas_ratio / 2.0;
            extent.min_x = cx - half;
            extent.max_x = cx + half;
        }

        Self { extent, width, height }
    }

    /// Map units per pixel
    pub fn resolution(&self) -> f64 {
        self.extent.width() / self.width as f64
    }

    /// Scale denominator (1:N) when printed at `dpi`, for metre-based projections
    pub fn scale_denominator(&self, dpi: f64) -> f64 {
        self.resolution() * dpi / (MM_PER_INCH / 1000.0)
    }

    /// Project a map coordinate to pixel space. The y axis points down.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let sx = self.width as f64 / self.extent.width();
        let sy = self.height as f64 / self.extent.height();
        ((x - self.extent.min_x) * sx, (self.extent.max_y - y) * sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn tall_box_on_wider_canvas_grows_width() {
        let bounds = Bounds::default();
        let vp = Viewport::fit(bounds, 1084, 1436);
        assert!(close(vp.extent.min_y, bounds.min_y));
        assert!(close(vp.extent.max_y, bounds.max_y));
        assert!(vp.extent.width() > bounds.width());
        assert!(close(vp.extent.width() / vp.extent.height(), 1084.0 / 1436.0));
        // centre is preserved
        assert!(close(
            (vp.extent.min_x + vp.extent.max_x) / 2.0,
            (bounds.min_x + bounds.max_x) / 2.0
        ));
    }

    #[test]
    fn wide_box_grows_height() {
        let bounds = Bounds { min_x: 0.0, min_y: 0.0, max_x: 400.0, max_y: 100.0 };
        let vp = Viewport::fit(bounds, 200, 100);
        assert!(close(vp.extent.min_x, 0.0));
        assert!(close(vp.extent.max_x, 400.0));
        assert!(close(vp.extent.min_y, -50.0));
        assert!(close(vp.extent.max_y, 150.0));
    }

    #[test]
    fn matching_aspect_is_untouched() {
        let bounds = Bounds { min_x: 10.0, min_y: 20.0, max_x: 30.0, max_y: 60.0 };
        let vp = Viewport::fit(bounds, 100, 200);
        assert_eq!(vp.extent, bounds);
        assert!(close(vp.resolution(), 0.2));
    }

    #[test]
    fn corners_map_to_canvas_corners() {
        let bounds = Bounds { min_x: 0.0, min_y: 0.0, max_x: 100.0, max_y: 50.0 };
        let vp = Viewport::fit(bounds, 200, 100);
        assert_eq!(vp.to_pixel(0.0, 50.0), (0.0, 0.0));
        assert_eq!(vp.to_pixel(100.0, 0.0), (200.0, 100.0));
        assert_eq!(vp.to_pixel(50.0, 25.0), (100.0, 50.0));
    }

    #[test]
    fn scale_denominator_at_96_dpi() {
        // 1 metre per pixel at 96dpi is roughly 1:3780
        let bounds = Bounds { min_x: 0.0, min_y: 0.0, max_x: 96.0, max_y: 96.0 };
        let vp = Viewport::fit(bounds, 96, 96);
        assert!((vp.scale_denominator(96.0) - 3779.527559).abs() < 1e-3);
    }
}
