//! Rendering: the backend seam, the map being rendered and its viewport.

pub mod paint;
pub mod raster;
pub mod viewport;

pub use raster::SkiaRenderer;
pub use viewport::Viewport;

use crate::style::{StyleSource, Stylesheet};
use crate::{Bounds, Result};

/// A rendering backend.
///
/// The pipeline only relies on this contract: loading a stylesheet, drawing a
/// framed map into an image of a given size, and encoding that image to PNG.
/// Each call either succeeds or returns an error that ends the run.
pub trait Renderer {
    /// In-memory image buffer owned by the backend
    type Image;

    /// Load and parse the stylesheet at `source`
    fn load_style(&mut self, source: &StyleSource) -> Result<Map>;

    /// Rasterize `map` into a new image of `width` x `height` pixels
    fn render(&mut self, map: &Map, width: u32, height: u32) -> Result<Self::Image>;

    /// Serialize `image` as a PNG byte stream
    fn encode_png(&mut self, image: &Self::Image) -> Result<Vec<u8>>;
}

/// A loaded stylesheet plus the extent it will be rendered at.
#[derive(Debug, Clone)]
pub struct Map {
    pub style: Stylesheet,
    viewport: Option<Viewport>,
}

impl Map {
    pub fn new(style: Stylesheet) -> Self {
        Self { style, viewport: None }
    }

    /// Frame `bounds` on a `width` x `height` canvas.
    ///
    /// The box is grown on one axis to match the canvas aspect ratio, so the
    /// requested area is always fully visible.
    pub fn zoom_to_box(&mut self, bounds: Bounds, width: u32, height: u32) {
        self.viewport = Some(Viewport::fit(bounds, width, height));
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }
}
