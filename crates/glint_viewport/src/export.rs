//! Saving the current render to disk.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};

/// Write RGBA8 pixels (row 0 = top) to a PNG.
pub fn save_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
    ensure!(width > 0 && height > 0, "Nothing rendered yet");
    ensure!(
        rgba.len() == width as usize * height as usize * 4,
        "Pixel buffer holds {} bytes, expected {}x{}x4",
        rgba.len(),
        width,
        height
    );

    image::save_buffer(path, rgba, width, height, image::ColorType::Rgba8)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Saved {}x{} render to {}", width, height, path.display());
    Ok(())
}

/// File name for a snapshot taken after `frames` rendered frames.
pub fn snapshot_path(frames: u64) -> PathBuf {
    PathBuf::from(format!("glint_{:06}.png", frames))
}
