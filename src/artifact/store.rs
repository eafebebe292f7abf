use std::{
    fs::File,
    io::{Cursor, Write as _},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::SystemTime,
};

use anyhow::Context as _;
use image::RgbaImage;

use crate::{
    artifact::naming::{ArtifactKind, ArtifactName, unix_secs},
    foundation::error::{DashError, DashResult},
};

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

// Upper bound on timestamp bumps when a slide is captured several times within one second.
const MAX_NAME_BUMPS: u64 = 3_600;

#[derive(Clone, Debug)]
/// A regular file found in the cache directory.
pub struct ArtifactEntry {
    /// Full path of the file.
    pub path: PathBuf,
    /// Bare file name.
    pub file_name: String,
    /// Parsed identity, `None` for temp files and foreign files.
    pub name: Option<ArtifactName>,
    /// Last modification time.
    pub modified: SystemTime,
    /// Size in bytes.
    pub len: u64,
}

impl ArtifactEntry {
    /// Age of the file at `now`; files from the future count as age zero.
    pub fn age(&self, now: SystemTime) -> std::time::Duration {
        now.duration_since(self.modified).unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
/// The shared, flat cache directory holding raw and processed artifacts.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if needed.
    pub fn ensure_dir(&self) -> DashResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create cache directory '{}'", self.dir.display()))?;
        Ok(())
    }

    pub fn path_for(&self, name: &ArtifactName) -> PathBuf {
        self.dir.join(name.file_name())
    }

    /// Every regular file in the directory, artifacts or not.
    ///
    /// Entries that vanish or cannot be inspected mid-listing are skipped; other stages delete
    /// files concurrently.
    pub fn entries(&self) -> DashResult<Vec<ArtifactEntry>> {
        let rd = std::fs::read_dir(&self.dir)
            .with_context(|| format!("list cache directory '{}'", self.dir.display()))?;

        let mut out = Vec::new();
        for entry in rd {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            out.push(ArtifactEntry {
                path: entry.path(),
                name: ArtifactName::parse(&file_name),
                file_name,
                modified,
                len: meta.len(),
            });
        }
        Ok(out)
    }

    /// Files whose names parse as artifacts.
    pub fn artifacts(&self) -> DashResult<Vec<ArtifactEntry>> {
        let mut entries = self.entries()?;
        entries.retain(|e| e.name.is_some());
        Ok(entries)
    }

    /// Raw artifacts without a processed counterpart, oldest capture first.
    pub fn pending(&self) -> DashResult<Vec<ArtifactEntry>> {
        let artifacts = self.artifacts()?;
        let processed: std::collections::HashSet<ArtifactName> = artifacts
            .iter()
            .filter_map(|e| e.name.as_ref())
            .filter(|n| n.is_processed())
            .map(|n| n.raw_source())
            .collect();

        let mut pending: Vec<ArtifactEntry> = artifacts
            .into_iter()
            .filter(|e| {
                e.name
                    .as_ref()
                    .is_some_and(|n| n.kind() == ArtifactKind::Raw && !processed.contains(n))
            })
            .collect();
        pending.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        Ok(pending)
    }

    /// Newest processed artifact for `slide` by embedded timestamp, ties broken by mtime.
    pub fn newest_processed(&self, slide: &str) -> DashResult<Option<ArtifactEntry>> {
        Ok(self
            .artifacts()?
            .into_iter()
            .filter(|e| {
                e.name
                    .as_ref()
                    .is_some_and(|n| n.is_processed() && n.slide() == slide)
            })
            .max_by_key(|e| (e.name.as_ref().map(|n| n.timestamp()), e.modified)))
    }

    /// Persist a new raw artifact for `slide` captured at `now`.
    ///
    /// If the name is already taken (two captures within one second), the timestamp moves to
    /// the next free second so names stay unique and monotonic per slide.
    pub fn write_raw(
        &self,
        slide: &str,
        now: SystemTime,
        image: &RgbaImage,
    ) -> DashResult<ArtifactName> {
        let base = ArtifactName::raw(slide, unix_secs(now));
        let name = (0..MAX_NAME_BUMPS)
            .map(|bump| base.with_timestamp(base.timestamp() + bump))
            .find(|n| !self.path_for(n).exists() && !self.path_for(&n.processed()).exists())
            .ok_or_else(|| {
                DashError::validation(format!("no free artifact name for slide '{slide}'"))
            })?;

        let bytes = encode_png(image)?;
        write_atomic(&self.path_for(&name), &bytes, now)?;
        Ok(name)
    }

    /// Persist the processed artifact derived from `raw`.
    pub fn write_processed(
        &self,
        raw: &ArtifactName,
        now: SystemTime,
        image: &RgbaImage,
    ) -> DashResult<ArtifactName> {
        let name = raw.processed();
        let bytes = encode_png(image)?;
        write_atomic(&self.path_for(&name), &bytes, now)?;
        Ok(name)
    }
}

fn sort_key(e: &ArtifactEntry) -> (u64, &str) {
    e.name
        .as_ref()
        .map(|n| (n.timestamp(), n.slide()))
        .unwrap_or((u64::MAX, e.file_name.as_str()))
}

/// Decode an image file into RGBA8.
pub fn load_image(path: &Path) -> DashResult<RgbaImage> {
    let img = image::open(path)
        .map_err(|e| DashError::image(format!("decode '{}': {e}", path.display())))?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA8 image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> DashResult<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| DashError::image(format!("encode png: {e}")))?;
    Ok(buf)
}

/// Write `bytes` to `dest` so that readers only ever see the old file or the complete new one.
///
/// The data goes to a hidden temp file in the same directory, gets `mtime` stamped on it and
/// is renamed into place.
pub fn write_atomic(dest: &Path, bytes: &[u8], mtime: SystemTime) -> DashResult<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DashError::validation(format!("invalid target '{}'", dest.display())))?;
    let tmp = dir.join(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    let result = (|| -> anyhow::Result<()> {
        let mut f =
            File::create(&tmp).with_context(|| format!("create temp '{}'", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write temp '{}'", tmp.display()))?;
        f.set_modified(mtime)
            .with_context(|| format!("stamp mtime on '{}'", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("sync temp '{}'", tmp.display()))?;
        drop(f);
        std::fs::rename(&tmp, dest)
            .with_context(|| format!("rename into '{}'", dest.display()))?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result.map_err(DashError::from)
}

/// Copy `src` over `dest` atomically, stamping `now` as the new file's mtime.
pub fn publish_copy(src: &Path, dest: &Path, now: SystemTime) -> DashResult<()> {
    let bytes = std::fs::read(src).with_context(|| format!("read '{}'", src.display()))?;
    if bytes.is_empty() {
        return Err(DashError::validation(format!(
            "refusing to publish empty file '{}'",
            src.display()
        )));
    }
    write_atomic(dest, &bytes, now)
}

#[cfg(test)]
#[path = "../../tests/unit/artifact/store.rs"]
mod tests;
