//! Paper map renderer
//!
//! Renders a fixed geographic bounding box of a styled map into a raster
//! image sized for a printed page, and writes it out as a PNG.
//!
//! # Pipeline
//!
//! A run is a strict sequence of stages: load the stylesheet, set the
//! viewport, render, encode, write the file. The first failing stage ends the
//! run; nothing is retried and no output file is left behind.
//!
//! # Example
//!
//! ```no_run
//! use mapprint::{Bounds, RenderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RenderConfig {
//!     style: "./OSMBright/style.json".parse()?,
//!     bounds: "1920835.627,6375494.894,1921741.171,6376788.906".parse::<Bounds>()?,
//!     output: "map.png".into(),
//!     ..Default::default()
//! };
//!
//! let report = mapprint::run(&config)?;
//! println!("{} x {}", report.width, report.height);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::str::FromStr;

pub mod error;
pub use error::{Error, Result};

pub mod units;
pub use units::{mm_to_px, CanvasDimensions};

pub mod style;
pub use style::{StyleSource, Stylesheet};

pub mod rendering;
pub use rendering::{Map, Renderer, SkiaRenderer, Viewport};

pub mod pipeline;
pub use pipeline::{run, run_with, RenderReport, Stage};

// Async-friendly wrapper around the pipeline (worker-thread backed)
pub mod async_api;

/// Configuration for a single render run
///
/// The defaults reproduce the classic Paper2GIS sheet: an A3 page scanned at
/// 300dpi, rendered at 96dpi with 10mm/40mm margins over a fixed extent in
/// Web Mercator metres.
///
/// # Examples
///
/// ```
/// let cfg = mapprint::RenderConfig::default();
/// let canvas = cfg.canvas().unwrap();
/// assert_eq!((canvas.width, canvas.height), (1084, 1436));
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Page size, expressed in pixels at a reference resolution
    pub page: PageSize,
    /// Margins removed from the page width and height
    pub margins: Margins,
    /// Target resolution in dots per inch
    pub dpi: f64,
    /// Stylesheet location (file path or http(s) URL)
    pub style: StyleSource,
    /// Map extent to frame, in projected map units
    pub bounds: Bounds,
    /// Where the PNG is written
    pub output: PathBuf,
    /// Timeout for fetching remote stylesheets in milliseconds
    pub fetch_timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page: PageSize::default(),
            margins: Margins::default(),
            dpi: 96.0,
            style: StyleSource::Path(PathBuf::from("./OSMBright/style.json")),
            bounds: Bounds::default(),
            output: PathBuf::from("map.png"),
            fetch_timeout_ms: 30000,
        }
    }
}

impl RenderConfig {
    /// Check every value the pipeline depends on.
    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        self.margins.validate()?;
        positive("dpi", self.dpi)?;
        self.bounds.validate()?;
        if self.output.as_os_str().is_empty() {
            return Err(Error::ConfigError("output path is empty".into()));
        }
        let canvas = self.canvas()?;
        // growing the box to the canvas aspect must not overflow either
        let fitted = Viewport::fit(self.bounds, canvas.width as u32, canvas.height as u32).extent;
        if !fitted.width().is_finite() || !fitted.height().is_finite() {
            return Err(Error::ConfigError(format!(
                "bounds cannot be framed on a {} x {} canvas",
                canvas.width, canvas.height
            )));
        }
        Ok(())
    }

    /// Canvas dimensions for this configuration.
    ///
    /// Fails when the margins consume the whole page.
    pub fn canvas(&self) -> Result<CanvasDimensions> {
        let canvas = units::canvas_dimensions(
            self.page.width_px,
            self.page.height_px,
            self.page.reference_dpi,
            self.margins.x_mm,
            self.margins.y_mm,
            self.dpi,
        );
        if canvas.width < 1 || canvas.height < 1 || canvas.width > u32::MAX as i64 || canvas.height > u32::MAX as i64 {
            return Err(Error::ConfigError(format!(
                "canvas of {} x {} pixels is not renderable",
                canvas.width, canvas.height
            )));
        }
        Ok(canvas)
    }
}

/// Page size in pixels at `reference_dpi`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_px: f64,
    pub height_px: f64,
    pub reference_dpi: f64,
}

impl Default for PageSize {
    fn default() -> Self {
        // A3 at 300dpi
        Self {
            width_px: 3508.0,
            height_px: 4961.0,
            reference_dpi: 300.0,
        }
    }
}

impl PageSize {
    fn validate(&self) -> Result<()> {
        positive("page width", self.width_px)?;
        positive("page height", self.height_px)?;
        positive("reference dpi", self.reference_dpi)
    }
}

/// Horizontal and vertical margins in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub x_mm: f64,
    pub y_mm: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self { x_mm: 10.0, y_mm: 40.0 }
    }
}

impl Margins {
    fn validate(&self) -> Result<()> {
        for (name, v) in [("horizontal margin", self.x_mm), ("vertical margin", self.y_mm)] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::ConfigError(format!("{} must be >= 0, got {}", name, v)));
            }
        }
        Ok(())
    }
}

/// Axis-aligned bounding box in projected map coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: 1920835.627,
            min_y: 6375494.894,
            max_x: 1921741.171,
            max_y: 6376788.906,
        }
    }
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Reject non-finite values and empty or inverted axes.
    pub fn validate(&self) -> Result<()> {
        let all = [self.min_x, self.min_y, self.max_x, self.max_y];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(Error::ConfigError(format!("bounds contain a non-finite value: {:?}", all)));
        }
        if self.min_x >= self.max_x {
            return Err(Error::ConfigError(format!("bounds min x {} must be < max x {}", self.min_x, self.max_x)));
        }
        if self.min_y >= self.max_y {
            return Err(Error::ConfigError(format!("bounds min y {} must be < max y {}", self.min_y, self.max_y)));
        }
        let ratio = self.width() / self.height();
        if !self.width().is_finite() || !self.height().is_finite() || !ratio.is_finite() || ratio <= 0.0 {
            return Err(Error::ConfigError(format!(
                "bounds {} x {} are too large to frame",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }
}

impl FromStr for Bounds {
    type Err = Error;

    /// Parse `minx,miny,maxx,maxy`.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .map_err(|e| Error::ConfigError(format!("invalid bounds value {:?}: {}", p.trim(), e)))
            })
            .collect::<Result<Vec<f64>>>()?;
        let &[min_x, min_y, max_x, max_y] = parts.as_slice() else {
            return Err(Error::ConfigError(format!(
                "bounds need 4 comma separated values (minx,miny,maxx,maxy), got {}",
                parts.len()
            )));
        };
        let bounds = Bounds { min_x, min_y, max_x, max_y };
        bounds.validate()?;
        Ok(bounds)
    }
}

fn positive(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(Error::ConfigError(format!("{} must be > 0, got {}", name, v)))
    }
}
