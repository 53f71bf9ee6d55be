//! The render pipeline: load style, set viewport, render, encode, write.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::rendering::{Renderer, SkiaRenderer};
use crate::{Error, RenderConfig, Result};

/// One step of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LoadStyle,
    SetViewport,
    Render,
    Encode,
    WriteFile,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::LoadStyle,
        Stage::SetViewport,
        Stage::Render,
        Stage::Encode,
        Stage::WriteFile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::LoadStyle => "load-style",
            Stage::SetViewport => "set-viewport",
            Stage::Render => "render",
            Stage::Encode => "encode",
            Stage::WriteFile => "write-file",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    /// Path the PNG was written to
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Size of the encoded PNG
    pub bytes: usize,
    /// Hex SHA-256 of the encoded PNG
    pub sha256: String,
}

/// Run the pipeline with the built-in tiny-skia backend.
///
/// This blocks the calling thread, and remote stylesheets are fetched with a
/// blocking HTTP client that panics inside a tokio runtime. Async callers
/// should use [`crate::async_api::render`].
pub fn run(config: &RenderConfig) -> Result<RenderReport> {
    let mut renderer = SkiaRenderer::new(config.fetch_timeout_ms);
    run_with(&mut renderer, config)
}

/// Run the pipeline with any backend.
///
/// Stages execute strictly in order and the first error is returned as-is.
/// The output file is only touched by the final stage, so a failed run
/// leaves any previous file in place and never creates a new one.
pub fn run_with<R: Renderer>(renderer: &mut R, config: &RenderConfig) -> Result<RenderReport> {
    config.validate()?;
    let canvas = config.canvas()?;
    let (width, height) = (canvas.width as u32, canvas.height as u32);
    info!("canvas {} x {} px at {} dpi", width, height, config.dpi);

    debug!("stage {}: {}", Stage::LoadStyle, config.style);
    let mut map = renderer.load_style(&config.style)?;

    debug!("stage {}", Stage::SetViewport);
    map.zoom_to_box(config.bounds, width, height);
    if let Some(vp) = map.viewport() {
        debug!(
            "extent {:?}, {:.4} units/px, scale 1:{:.0}",
            vp.extent,
            vp.resolution(),
            vp.scale_denominator(config.dpi)
        );
    }

    debug!("stage {}", Stage::Render);
    let image = renderer.render(&map, width, height)?;

    debug!("stage {}", Stage::Encode);
    let png = renderer.encode_png(&image)?;
    drop(image);

    debug!("stage {}: {} bytes to {}", Stage::WriteFile, png.len(), config.output.display());
    write_output(&config.output, &png)?;
    info!("wrote {} bytes to {}", png.len(), config.output.display());

    Ok(RenderReport {
        output: config.output.clone(),
        width,
        height,
        bytes: png.len(),
        sha256: hex::encode(Sha256::digest(&png)),
    })
}

/// Write `bytes` next to `path` and rename over it, replacing any old file.
fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    let result = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&tmp);
        return Err(Error::WriteError {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique per process and per call, so concurrent runs never share a temp file.
fn temp_path(path: &Path) -> PathBuf {
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.{}.tmp", std::process::id(), seq));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::Map;
    use crate::style::{StyleSource, Stylesheet};

    /// Backend that records calls and can fail at a chosen stage
    #[derive(Default)]
    struct Recording {
        calls: Vec<Stage>,
        fail_at: Option<Stage>,
    }

    impl Recording {
        fn failing_at(stage: Stage) -> Self {
            Self { calls: Vec::new(), fail_at: Some(stage) }
        }
    }

    impl Renderer for Recording {
        type Image = (u32, u32);

        fn load_style(&mut self, source: &StyleSource) -> Result<Map> {
            self.calls.push(Stage::LoadStyle);
            if self.fail_at == Some(Stage::LoadStyle) {
                return Err(Error::load(source, "boom"));
            }
            Ok(Map::new(Stylesheet::from_json("{}", "mock")?))
        }

        fn render(&mut self, map: &Map, width: u32, height: u32) -> Result<(u32, u32)> {
            self.calls.push(Stage::Render);
            assert!(map.viewport().is_some(), "viewport must be set before render");
            if self.fail_at == Some(Stage::Render) {
                return Err(Error::RenderError("boom".into()));
            }
            Ok((width, height))
        }

        fn encode_png(&mut self, _image: &(u32, u32)) -> Result<Vec<u8>> {
            self.calls.push(Stage::Encode);
            if self.fail_at == Some(Stage::Encode) {
                return Err(Error::EncodeError("boom".into()));
            }
            Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mapprint-pipeline-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config_writing_to(path: PathBuf) -> RenderConfig {
        RenderConfig { output: path, ..Default::default() }
    }

    #[test]
    fn stages_run_in_order() {
        let dir = scratch_dir("order");
        let out = dir.join("map.png");
        let mut r = Recording::default();
        let report = run_with(&mut r, &config_writing_to(out.clone())).unwrap();

        assert_eq!(r.calls, vec![Stage::LoadStyle, Stage::Render, Stage::Encode]);
        assert_eq!((report.width, report.height), (1084, 1436));
        assert_eq!(fs::read(&out).unwrap(), b"\x89PNG\r\n\x1a\nfake");
        assert_eq!(report.bytes, 12);
        assert_eq!(report.sha256.len(), 64);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn first_failure_stops_the_run() {
        let cases = [
            (Stage::LoadStyle, vec![Stage::LoadStyle]),
            (Stage::Render, vec![Stage::LoadStyle, Stage::Render]),
            (Stage::Encode, vec![Stage::LoadStyle, Stage::Render, Stage::Encode]),
        ];
        for (stage, expected_calls) in cases {
            let dir = scratch_dir(stage.name());
            let out = dir.join("map.png");
            let mut r = Recording::failing_at(stage);
            let err = run_with(&mut r, &config_writing_to(out.clone())).unwrap_err();

            assert_eq!(err.stage(), Some(stage));
            assert_eq!(r.calls, expected_calls);
            assert!(!out.exists(), "no output after {} failure", stage);
            assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
            let _ = fs::remove_dir_all(&dir);
        }
    }

    #[test]
    fn invalid_config_runs_no_stage() {
        let mut r = Recording::default();
        let cfg = RenderConfig { dpi: -96.0, ..Default::default() };
        let err = run_with(&mut r, &cfg).unwrap_err();
        assert_eq!(err.stage(), None);
        assert!(r.calls.is_empty());
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = scratch_dir("write");
        let out = dir.join("missing-subdir").join("map.png");
        let mut r = Recording::default();
        let err = run_with(&mut r, &config_writing_to(out.clone())).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::WriteFile));
        assert!(!out.exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn existing_output_is_replaced() {
        let dir = scratch_dir("replace");
        let out = dir.join("map.png");
        fs::write(&out, vec![0u8; 4096]).unwrap();
        let mut r = Recording::default();
        run_with(&mut r, &config_writing_to(out.clone())).unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"\x89PNG\r\n\x1a\nfake");
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn temp_paths_are_unique_per_call() {
        let target = Path::new("out/map.png");
        let a = temp_path(target);
        let b = temp_path(target);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("map.png."));
    }

    #[test]
    fn concurrent_runs_to_one_output_stay_consistent() {
        let dir = scratch_dir("concurrent");
        let out = dir.join("map.png");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cfg = config_writing_to(out.clone());
                std::thread::spawn(move || run_with(&mut Recording::default(), &cfg))
            })
            .collect();
        for h in handles {
            let report = h.join().unwrap().expect("run failed");
            assert_eq!(report.bytes, 12);
        }
        assert_eq!(fs::read(&out).unwrap(), b"\x89PNG\r\n\x1a\nfake");
        // no temp files left behind
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn stage_names() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["load-style", "set-viewport", "render", "encode", "write-file"]);
    }
}
