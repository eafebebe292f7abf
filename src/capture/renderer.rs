use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::atomic::{AtomicU64, Ordering},
};

use image::RgbaImage;

use crate::{
    artifact::store::load_image,
    foundation::error::{DashError, DashResult},
};

/// Renders a web page to a raster image of a fixed viewport size.
pub trait PageRenderer: Send {
    fn render(&mut self, url: &str, width: u32, height: u32) -> DashResult<RgbaImage>;
}

/// Browser binary used when none is configured.
pub const DEFAULT_BROWSER: &str = "chromium";

static SHOT_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Debug)]
/// Headless Chromium (or any browser accepting Chromium's `--screenshot` flags) as a subprocess.
pub struct ChromiumRenderer {
    binary: PathBuf,
    scratch_dir: PathBuf,
}

impl Default for ChromiumRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_BROWSER)
    }
}

impl ChromiumRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Directory for the browser's screenshot files (defaults to the system temp dir).
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Whether the browser binary can be started at all.
    pub fn is_on_path(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn shot_path(&self) -> PathBuf {
        self.scratch_dir.join(format!(
            "kindledash-shot-{}-{}.png",
            std::process::id(),
            SHOT_SEQ.fetch_add(1, Ordering::Relaxed)
        ))
    }
}

impl PageRenderer for ChromiumRenderer {
    fn render(&mut self, url: &str, width: u32, height: u32) -> DashResult<RgbaImage> {
        let shot = self.shot_path();
        let output = Command::new(&self.binary)
            .args([
                "--headless=new",
                "--disable-gpu",
                "--no-sandbox",
                "--hide-scrollbars",
                &format!("--window-size={width},{height}"),
            ])
            .arg(format!("--screenshot={}", shot.display()))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                DashError::capture(format!(
                    "failed to spawn '{}' (is it installed and on PATH?): {e}",
                    self.binary.display()
                ))
            })?;

        let result = if output.status.success() {
            load_image(&shot).map_err(|e| DashError::capture(format!("screenshot of {url}: {e}")))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DashError::capture(format!(
                "browser exited with status {} for {url}: {}",
                output.status,
                stderr.trim()
            )))
        };
        let _ = std::fs::remove_file(&shot);

        let img = result?;
        if img.dimensions() == (width, height) {
            return Ok(img);
        }
        tracing::debug!(
            got_w = img.width(),
            got_h = img.height(),
            width,
            height,
            "screenshot size differs from viewport, resizing"
        );
        Ok(image::imageops::resize(
            &img,
            width,
            height,
            image::imageops::FilterType::Triangle,
        ))
    }
}
