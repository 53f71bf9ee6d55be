//! Async entry point for the render pipeline.
//!
//! The pipeline is blocking (file IO, optional blocking HTTP, CPU-bound
//! rasterization), so it runs on a dedicated worker thread and the caller
//! awaits its result over a oneshot channel. Stage ordering and fail-fast
//! behavior are exactly those of [`crate::run`].

use std::thread;

use tokio::sync::oneshot;

use crate::{Error, RenderConfig, RenderReport, Result};

/// Render `config` without blocking the async runtime.
pub async fn render(config: RenderConfig) -> Result<RenderReport> {
    let (tx, rx) = oneshot::channel::<Result<RenderReport>>();

    thread::Builder::new()
        .name("mapprint-render".into())
        .spawn(move || {
            let _ = tx.send(crate::run(&config));
        })
        .map_err(|e| Error::RenderError(format!("Failed to spawn render worker: {}", e)))?;

    rx.await
        .map_err(|_| Error::RenderError("render worker exited without a result".into()))?
}
