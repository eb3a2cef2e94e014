// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection weights bootstrap
//!
//! Makes sure the ONNX weights exist before the model is loaded, fetching
//! them from `OBJ_DETECT_WEIGHTS_URL` when the file is missing.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Return the weights path, downloading the file first if needed.
///
/// A missing file without a download URL is an error.
pub async fn ensure_weights(path: &Path, url: Option<&str>) -> Result<PathBuf> {
    if path.exists() {
        info!("Using detection weights at {}", path.display());
        return Ok(path.to_path_buf());
    }

    let url = url.with_context(|| {
        format!(
            "Detection weights not found at {} and OBJ_DETECT_WEIGHTS_URL is not set",
            path.display()
        )
    })?;

    download(url, path).await?;
    Ok(path.to_path_buf())
}

async fn download(url: &str, path: &Path) -> Result<()> {
    info!("📥 Downloading detection weights from {}", url);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Failed to download weights from {}", url))?;

    let progress = match response.content_length() {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) =
        ProgressStyle::with_template("{bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
    {
        progress.set_style(style);
    }

    // Renamed into place only once the body is complete
    let partial = path.with_extension("part");
    let written = match write_body(&mut response, &partial, &progress).await {
        Ok(()) => tokio::fs::rename(&partial, path)
            .await
            .with_context(|| format!("Failed to move weights to {}", path.display())),
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        progress.abandon();
        match tokio::fs::remove_file(&partial).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove {}: {}", partial.display(), err),
        }
        return Err(e);
    }

    progress.finish_and_clear();
    info!("✅ Detection weights saved to {}", path.display());
    Ok(())
}

async fn write_body(
    response: &mut reqwest::Response,
    partial: &Path,
    progress: &ProgressBar,
) -> Result<()> {
    let mut file = tokio::fs::File::create(partial)
        .await
        .with_context(|| format!("Failed to create {}", partial.display()))?;

    while let Some(chunk) = response
        .chunk()
        .await
        .context("Weights download interrupted")?
    {
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }
    file.flush().await?;
    Ok(())
}
