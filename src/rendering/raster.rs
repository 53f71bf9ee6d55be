//! Pure-Rust rendering backend built on tiny-skia.

use log::debug;
use tiny_skia::Pixmap;

use crate::rendering::{paint, Map, Renderer};
use crate::style::{StyleSource, Stylesheet};
use crate::{Error, Result};

/// Renders stylesheets into RGBA pixmaps and encodes them with tiny-skia's
/// PNG encoder.
#[derive(Debug, Clone)]
pub struct SkiaRenderer {
    fetch_timeout_ms: u64,
}

impl Default for SkiaRenderer {
    fn default() -> Self {
        Self::new(30000)
    }
}

impl SkiaRenderer {
    /// `fetch_timeout_ms` bounds each remote stylesheet or datasource request.
    pub fn new(fetch_timeout_ms: u64) -> Self {
        Self { fetch_timeout_ms }
    }
}

impl Renderer for SkiaRenderer {
    type Image = Pixmap;

    fn load_style(&mut self, source: &StyleSource) -> Result<Map> {
        let style = Stylesheet::load(source, self.fetch_timeout_ms)?;
        debug!("loaded {} layer(s) from {}", style.layers.len(), source);
        Ok(Map::new(style))
    }

    fn render(&mut self, map: &Map, width: u32, height: u32) -> Result<Pixmap> {
        let viewport = map
            .viewport()
            .ok_or_else(|| Error::RenderError("map extent not set".into()))?;
        if (viewport.width, viewport.height) != (width, height) {
            return Err(Error::RenderError(format!(
                "image is {} x {} but the map was framed for {} x {}",
                width, height, viewport.width, viewport.height
            )));
        }

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::RenderError(format!("failed to allocate a {} x {} image", width, height)))?;

        let bg = map.style.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

        for layer in &map.style.layers {
            paint::draw_layer(&mut pixmap, layer, viewport);
        }
        Ok(pixmap)
    }

    fn encode_png(&mut self, image: &Pixmap) -> Result<Vec<u8>> {
        image.encode_png().map_err(|e| Error::EncodeError(e.to_string()))
    }
}
