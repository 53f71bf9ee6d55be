//! Stylesheets: where they live and what they contain.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use serde::Deserialize;
use url::Url;

use crate::{Error, Result};

/// Location of a stylesheet or datasource: a local file or an http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSource {
    Path(PathBuf),
    Url(Url),
}

impl FromStr for StyleSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::ConfigError("stylesheet location is empty".into()));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            let url = Url::parse(s).map_err(|e| Error::ConfigError(format!("invalid stylesheet URL {}: {}", s, e)))?;
            Ok(StyleSource::Url(url))
        } else {
            Ok(StyleSource::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for StyleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleSource::Path(p) => write!(f, "{}", p.display()),
            StyleSource::Url(u) => write!(f, "{}", u),
        }
    }
}

impl StyleSource {
    /// Resolve `reference` relative to this source.
    ///
    /// Absolute URLs are taken as-is; anything else is joined onto the
    /// directory of a file source or onto the URL of a remote one.
    pub fn resolve(&self, reference: &str) -> Result<StyleSource> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            let url = Url::parse(reference).map_err(|e| Error::load(reference, e))?;
            return Ok(StyleSource::Url(url));
        }
        match self {
            StyleSource::Path(base) => {
                let dir = base.parent().unwrap_or_else(|| Path::new(""));
                Ok(StyleSource::Path(dir.join(reference)))
            }
            StyleSource::Url(base) => base
                .join(reference)
                .map(StyleSource::Url)
                .map_err(|e| Error::load(reference, e)),
        }
    }

    /// Read the whole resource as text.
    pub fn read_to_string(&self, timeout_ms: u64) -> Result<String> {
        match self {
            StyleSource::Path(path) => std::fs::read_to_string(path).map_err(|e| Error::load(self, e)),
            StyleSource::Url(url) => fetch(url, timeout_ms),
        }
    }
}

#[cfg(feature = "remote")]
fn fetch(url: &Url, timeout_ms: u64) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| Error::load(url, format!("Failed to build HTTP client: {}", e)))?;

    let resp = client
        .get(url.clone())
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::load(url, e))?;

    resp.text()
        .map_err(|e| Error::load(url, format!("Failed to read response body: {}", e)))
}

#[cfg(not(feature = "remote"))]
fn fetch(url: &Url, _timeout_ms: u64) -> Result<String> {
    Err(Error::load(url, "remote stylesheets require the `remote` feature"))
}

/// An RGBA color, written in stylesheets as `#rgb`, `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| format!("invalid color {:?}", s))?;
        let channel = |i: usize, len: usize| {
            let v = u8::from_str_radix(&hex[i..i + len], 16).map_err(|e| e.to_string())?;
            Ok::<u8, String>(if len == 1 { v * 17 } else { v })
        };
        match hex.len() {
            3 => Ok(Color { r: channel(0, 1)?, g: channel(1, 1)?, b: channel(2, 1)?, a: 255 }),
            6 => Ok(Color { r: channel(0, 2)?, g: channel(2, 2)?, b: channel(4, 2)?, a: 255 }),
            8 => Ok(Color { r: channel(0, 2)?, g: channel(2, 2)?, b: channel(4, 2)?, a: channel(6, 2)? }),
            _ => Err(format!("invalid color {:?}", s)),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Geometry in projected map coordinates
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    MultiPoint(Vec<[f64; 2]>),
    LineString(Vec<[f64; 2]>),
    MultiLineString(Vec<Vec<[f64; 2]>>),
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

/// How a layer's features are drawn
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Symbolizer {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub point_radius: f32,
    pub opacity: f32,
}

impl Default for Symbolizer {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            point_radius: 3.0,
            opacity: 1.0,
        }
    }
}

/// A named group of features sharing one symbolizer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Layer {
    pub name: String,
    /// Extra features loaded from a file next to the stylesheet
    #[serde(default)]
    pub datasource: Option<String>,
    #[serde(default)]
    pub features: Vec<Geometry>,
    #[serde(default)]
    pub style: Symbolizer,
}

#[derive(Deserialize)]
struct Datasource {
    features: Vec<Geometry>,
}

/// A parsed stylesheet. Layers are drawn in order, first layer at the bottom.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stylesheet {
    #[serde(default = "transparent")]
    pub background: Color,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

fn transparent() -> Color {
    Color::TRANSPARENT
}

impl Stylesheet {
    /// Parse stylesheet JSON. `source_name` is only used in error messages.
    pub fn from_json(text: &str, source_name: &str) -> Result<Self> {
        let sheet: Stylesheet = serde_json::from_str(text).map_err(|e| Error::load(source_name, e))?;
        for layer in &sheet.layers {
            layer.style.check().map_err(|reason| {
                Error::load(source_name, format!("layer {:?}: {}", layer.name, reason))
            })?;
        }
        Ok(sheet)
    }

    /// Read and parse a stylesheet, pulling in every layer datasource.
    pub fn load(source: &StyleSource, timeout_ms: u64) -> Result<Self> {
        let name = source.to_string();
        let mut sheet = Self::from_json(&source.read_to_string(timeout_ms)?, &name)?;
        for layer in &mut sheet.layers {
            let Some(reference) = layer.datasource.as_deref() else {
                continue;
            };
            let ds_source = source.resolve(reference)?;
            let ds_name = ds_source.to_string();
            let ds: Datasource = serde_json::from_str(&ds_source.read_to_string(timeout_ms)?)
                .map_err(|e| Error::load(&ds_name, e))?;
            debug!("layer {} loaded {} features from {}", layer.name, ds.features.len(), ds_name);
            layer.features.extend(ds.features);
        }
        Ok(sheet)
    }
}

impl Symbolizer {
    fn check(&self) -> std::result::Result<(), String> {
        if !(self.stroke_width.is_finite() && self.stroke_width >= 0.0) {
            return Err(format!("stroke_width must be >= 0, got {}", self.stroke_width));
        }
        if !(self.point_radius.is_finite() && self.point_radius >= 0.0) {
            return Err(format!("point_radius must be >= 0, got {}", self.point_radius));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!("opacity must be within 0..=1, got {}", self.opacity));
        }
        Ok(())
    }
}
