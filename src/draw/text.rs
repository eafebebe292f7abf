//! Text rasterization for overlay stamps.
//!
//! Text is laid out by building a tiny SVG document and letting `usvg` shape it against a
//! `fontdb` database; `resvg` rasterizes the result, which is then composited onto the frame.
//! Machines without any usable font still get correct box geometry from a size-based estimate,
//! only the glyphs are skipped.

use std::{path::Path, sync::Arc};

use image::RgbaImage;

use crate::{
    draw::composite::over_premul_in_place,
    foundation::error::{DashError, DashResult},
};

/// Family used when none is configured or the configured one is unavailable.
pub const DEFAULT_FAMILY: &str = "sans-serif";

#[derive(Clone, Debug, PartialEq)]
/// A resolved font request: pixel size plus the family name handed to the shaper.
pub struct Font {
    pub size_px: f32,
    pub family: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Ink bounds of a text run relative to its pen origin (`top` is below the em-box top).
pub struct TextExtent {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone)]
pub struct TextRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl TextRenderer {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` files in `font_dir`.
    pub fn new(font_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = font_dir {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font database ready");
        Self::from_database(db)
    }

    /// A renderer with no faces: measurement estimates, drawing is skipped.
    pub fn without_fonts() -> Self {
        Self::from_database(usvg::fontdb::Database::new())
    }

    pub fn from_database(db: usvg::fontdb::Database) -> Self {
        Self {
            fontdb: Arc::new(db),
        }
    }

    pub fn has_fonts(&self) -> bool {
        !self.fontdb.is_empty()
    }

    /// Resolve `family` at `size_px`, falling back to [`DEFAULT_FAMILY`] when it is unknown.
    pub fn load_font(&self, size_px: f32, family: Option<&str>) -> Font {
        let family = match family.map(str::trim).filter(|f| !f.is_empty()) {
            Some(name) if self.knows_family(name) => name.to_owned(),
            Some(name) => {
                tracing::warn!(family = name, "font family not found, using default");
                DEFAULT_FAMILY.to_owned()
            }
            None => DEFAULT_FAMILY.to_owned(),
        };
        Font { size_px, family }
    }

    fn knows_family(&self, name: &str) -> bool {
        let families = [usvg::fontdb::Family::Name(name)];
        self.fontdb
            .query(&usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight::NORMAL,
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            })
            .is_some()
    }

    /// Ink bounds of `text` set in `font`.
    pub fn measure_text(&self, text: &str, font: &Font) -> TextExtent {
        let estimate = estimate_extent(text, font);
        if text.is_empty() || !self.has_fonts() {
            return estimate;
        }

        let svg = text_svg(1, 1, 0.0, font.size_px, text, font, [0, 0, 0]);
        let tree = match self.parse(&svg) {
            Ok(tree) => tree,
            Err(err) => {
                tracing::debug!(error = %err, "text measurement failed, estimating");
                return estimate;
            }
        };

        let bbox = tree.root().abs_bounding_box();
        if !(bbox.width() > 0.0 && bbox.height() > 0.0) {
            return estimate;
        }
        TextExtent {
            left: bbox.left(),
            top: bbox.top(),
            width: bbox.width(),
            height: bbox.height(),
        }
    }

    /// Draw `text` so that its ink box starts at `origin` (top-left, in pixels).
    pub fn draw_text(
        &self,
        img: &mut RgbaImage,
        origin: (f32, f32),
        text: &str,
        font: &Font,
        color: [u8; 3],
    ) -> DashResult<()> {
        if text.is_empty() || img.width() == 0 || img.height() == 0 {
            return Ok(());
        }
        if !self.has_fonts() {
            tracing::debug!("no fonts available, skipping stamp text");
            return Ok(());
        }

        let extent = self.measure_text(text, font);
        let x = origin.0 - extent.left;
        let y = origin.1 - extent.top + font.size_px;
        let svg = text_svg(img.width(), img.height(), x, y, text, font, color);
        let tree = self.parse(&svg)?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(img.width(), img.height())
            .ok_or_else(|| DashError::image("failed to allocate text pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        over_premul_in_place(img, pixmap.data())
    }

    fn parse(&self, svg: &str) -> DashResult<usvg::Tree> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        usvg::Tree::from_str(svg, &opts).map_err(|e| DashError::image(format!("text svg: {e}")))
    }
}

// Baseline sits at `y`; ink roughly spans [y - 0.75em, y] for digits and punctuation.
fn estimate_extent(text: &str, font: &Font) -> TextExtent {
    let chars = text.chars().count() as f32;
    TextExtent {
        left: 0.0,
        top: font.size_px * 0.25,
        width: font.size_px * 0.6 * chars,
        height: font.size_px * 0.75,
    }
}

fn text_svg(
    width: u32,
    height: u32,
    x: f32,
    y: f32,
    text: &str,
    font: &Font,
    color: [u8; 3],
) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><text x="{x}" y="{y}" font-family="{family}" font-size="{size}" fill="rgb({r},{g},{b})">{body}</text></svg>"#,
        family = xml_escape(&font.family),
        size = font.size_px,
        r = color[0],
        g = color[1],
        b = color[2],
        body = xml_escape(text),
    )
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory not readable");
        return;
    };
    for path in rd.flatten().map(|e| e.path()).filter(|p| p.is_file()) {
        let is_font = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .is_some_and(|ext| matches!(ext.as_str(), "ttf" | "otf" | "ttc"));
        if is_font && let Err(err) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %err, "failed to load font");
        }
    }
}

// Requested families first, then generic families, then any face at all so a stamp is never
// silently dropped on hosts with unusual font setups.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<usvg::fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                })
                .collect();
            families.extend([
                usvg::fontdb::Family::SansSerif,
                usvg::fontdb::Family::Serif,
                usvg::fontdb::Family::Monospace,
            ]);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/text.rs"]
mod tests;
