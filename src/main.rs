use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mapprint::{Bounds, Margins, PageSize, RenderConfig, StyleSource};

/// Render a styled map extent to a print-sized PNG
#[derive(Parser, Debug)]
#[command(name = "mapprint", version, about)]
struct Cli {
    /// Stylesheet file or http(s) URL
    #[arg(long, default_value = "./OSMBright/style.json")]
    style: StyleSource,

    /// Extent to render as minx,miny,maxx,maxy in map units
    #[arg(long, allow_hyphen_values = true, default_value = "1920835.627,6375494.894,1921741.171,6376788.906")]
    bbox: Bounds,

    /// Page width in pixels at the reference DPI
    #[arg(long, default_value_t = 3508.0)]
    page_width_px: f64,

    /// Page height in pixels at the reference DPI
    #[arg(long, default_value_t = 4961.0)]
    page_height_px: f64,

    /// Resolution the page size is measured at
    #[arg(long, default_value_t = 300.0)]
    reference_dpi: f64,

    /// Horizontal margin in millimetres
    #[arg(long, default_value_t = 10.0)]
    margin_x_mm: f64,

    /// Vertical margin in millimetres
    #[arg(long, default_value_t = 40.0)]
    margin_y_mm: f64,

    /// Output resolution
    #[arg(long, default_value_t = 96.0)]
    dpi: f64,

    /// Output PNG path (replaced if it exists)
    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,

    /// Timeout for remote stylesheet requests in milliseconds
    #[arg(long, default_value_t = 30000)]
    fetch_timeout_ms: u64,
}

impl From<Cli> for RenderConfig {
    fn from(cli: Cli) -> Self {
        RenderConfig {
            page: PageSize {
                width_px: cli.page_width_px,
                height_px: cli.page_height_px,
                reference_dpi: cli.reference_dpi,
            },
            margins: Margins {
                x_mm: cli.margin_x_mm,
                y_mm: cli.margin_y_mm,
            },
            dpi: cli.dpi,
            style: cli.style,
            bounds: cli.bbox,
            output: cli.output,
            fetch_timeout_ms: cli.fetch_timeout_ms,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RenderConfig::from(Cli::parse());
    let report = mapprint::run(&config).with_context(|| match config.canvas() {
        Ok(c) => format!("rendering {} x {} map to {} failed", c.width, c.height, config.output.display()),
        Err(_) => format!("rendering map to {} failed", config.output.display()),
    })?;

    println!("saved map image to {}", report.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_defaults_match_config_defaults() {
        let from_cli = RenderConfig::from(Cli::parse_from(["mapprint"]));
        let defaults = RenderConfig::default();
        assert_eq!(from_cli.page, defaults.page);
        assert_eq!(from_cli.margins, defaults.margins);
        assert_eq!(from_cli.dpi, defaults.dpi);
        assert_eq!(from_cli.style, defaults.style);
        assert_eq!(from_cli.bounds, defaults.bounds);
        assert_eq!(from_cli.output, defaults.output);
        assert_eq!(from_cli.fetch_timeout_ms, defaults.fetch_timeout_ms);
    }

    #[test]
    fn cli_accepts_negative_bbox() {
        let cli = Cli::parse_from([
            "mapprint",
            "--bbox",
            "-253416.7,7076444.7,-244881.4,7080278.7",
            "-o",
            "out.png",
        ]);
        assert_eq!(cli.bbox.min_x, -253416.7);
        assert_eq!(cli.output, PathBuf::from("out.png"));
    }

    #[test]
    fn cli_rejects_malformed_bbox() {
        assert!(Cli::try_parse_from(["mapprint", "--bbox", "1,2,3"]).is_err());
    }
}
