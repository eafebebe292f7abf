use std::{collections::HashSet, fmt, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};

use crate::{
    artifact::naming::artifact_key,
    foundation::error::{DashError, DashResult},
};

/// Capture viewport used when no valid resolution is configured.
pub const DEFAULT_RESOLUTION: Resolution = Resolution {
    width: 800,
    height: 600,
};
/// Rotation period in seconds when `slideFrequency` is absent or invalid.
pub const DEFAULT_SLIDE_FREQUENCY_SECS: f64 = 60.0;
/// Capture period in minutes when neither the slide nor `defaultInterval` set one.
pub const DEFAULT_INTERVAL_MINUTES: f64 = 5.0;
/// Render attempts after the first one, per capture cycle.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const MAX_DIM: u32 = 16_384;
// Anything beyond ~30 years is a typo, not a schedule.
const MAX_PERIOD_SECS: f64 = 1.0e9;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Read-only snapshot of the pipeline configuration document.
///
/// Every field is optional. A field holding the wrong JSON type is treated as absent rather
/// than failing the whole document, so one bad value never empties the slideshow.
pub struct PipelineConfig {
    /// Global capture and rotation settings.
    #[serde(deserialize_with = "lenient")]
    pub global: GlobalConfig,
    /// Time/date stamp settings.
    #[serde(deserialize_with = "lenient")]
    pub overlay: OverlayConfig,
    /// Slides in config order.
    #[serde(deserialize_with = "lenient_slides")]
    pub slides: Vec<SlideSpec>,
}

impl PipelineConfig {
    /// Parse a JSON document and normalize slide identities.
    pub fn from_json_str(text: &str) -> DashResult<Self> {
        let cfg: PipelineConfig = serde_json::from_str(text)
            .map_err(|e| DashError::config(format!("parse config JSON: {e}")))?;
        Ok(cfg.normalized())
    }

    /// Fill missing slide names, sanitize them into artifact keys and drop duplicates.
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        let mut slides = Vec::with_capacity(self.slides.len());
        for (idx, mut slide) in self.slides.into_iter().enumerate() {
            let raw = slide.name.trim();
            let key = if raw.is_empty() {
                format!("slide{}", idx + 1)
            } else {
                artifact_key(raw)
            };
            if key != slide.name {
                tracing::debug!(configured = %slide.name, key = %key, "normalized slide name");
            }
            if !seen.insert(key.clone()) {
                tracing::warn!(slide = %key, "duplicate slide name in config, keeping the first");
                continue;
            }
            slide.name = key;
            slides.push(slide);
        }
        self.slides = slides;
        self
    }

    /// Look up a slide by its (normalized) name.
    pub fn slide(&self, name: &str) -> Option<&SlideSpec> {
        self.slides.iter().find(|s| s.name == name)
    }

    /// Names of enabled slides, in config order.
    pub fn enabled_slide_names(&self) -> Vec<String> {
        self.slides
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| s.name.clone())
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Global section of the configuration document.
pub struct GlobalConfig {
    /// Default capture viewport as `"<W>x<H>"`.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Rotation period in seconds.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub slide_frequency: Option<f64>,
    /// Invert every slide.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
    /// Convert every slide to grayscale.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub grayscale: Option<bool>,
    /// Boost contrast of every slide.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub boost_contrast: Option<bool>,
    /// Convert every slide to pure black and white.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub convertbw: Option<bool>,
    /// Capture period in minutes for slides without their own interval.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub default_interval: Option<f64>,
    /// Retries after a failed render within one capture cycle.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Zone used for the time/date stamp: `"UTC"`, `"local"`, or an offset such as `"+2"`,
    /// `"+5:30"`, `"-0800"`. Anything else falls back to UTC.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Cache retention in minutes, overriding the collector default.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<f64>,
}

impl GlobalConfig {
    /// Default capture viewport, falling back to 800x600.
    pub fn resolution(&self) -> Resolution {
        Resolution::parse_or_default(self.resolution.as_deref())
    }

    /// Rotation period.
    pub fn slide_frequency(&self) -> Duration {
        positive_secs(self.slide_frequency)
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_SLIDE_FREQUENCY_SECS))
    }

    /// Capture period for slides without their own interval.
    pub fn default_interval(&self) -> Duration {
        positive_secs(self.default_interval.map(|m| m * 60.0))
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_INTERVAL_MINUTES * 60.0))
    }

    /// Retries after the first failed render attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    /// Zone used for the stamp text.
    pub fn timezone(&self) -> StampZone {
        match self.timezone.as_deref() {
            None => StampZone::Utc,
            Some(s) => StampZone::parse(s).unwrap_or_else(|| {
                tracing::warn!(timezone = %s, "unrecognized timezone, using UTC");
                StampZone::Utc
            }),
        }
    }

    /// Configured cache retention, if any.
    pub fn cache_duration(&self) -> Option<Duration> {
        positive_secs(self.cache_duration.map(|m| m * 60.0))
    }

    /// The global transform flags, in application order.
    pub fn transforms(&self) -> GlobalTransforms {
        GlobalTransforms {
            invert: self.invert.unwrap_or(false),
            grayscale: self.grayscale.unwrap_or(false),
            boost_contrast: self.boost_contrast.unwrap_or(false),
            black_white: self.convertbw.unwrap_or(false),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Resolved global transform flags.
pub struct GlobalTransforms {
    /// Global invert.
    pub invert: bool,
    /// Global grayscale.
    pub grayscale: bool,
    /// Global contrast boost.
    pub boost_contrast: bool,
    /// Global black/white conversion.
    pub black_white: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Overlay section of the configuration document.
pub struct OverlayConfig {
    /// Stamp font size class.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
    /// Horizontal alignment of the stamp text.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    /// Edge the stamp box is drawn on.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Default for slides that do not set `showTime`.
    #[serde(
        alias = "showClock",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_time: Option<bool>,
    /// Default for slides that do not set `showDate`.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub show_date: Option<bool>,
    /// Preferred font family for the stamp.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl OverlayConfig {
    /// Font size class, defaulting to medium.
    pub fn font_size(&self) -> FontSize {
        self.font_size.unwrap_or_default()
    }

    /// Alignment, defaulting to center.
    pub fn align(&self) -> Align {
        self.align.unwrap_or_default()
    }

    /// Overlay position, defaulting to none.
    pub fn position(&self) -> Position {
        self.position.clone().unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// One configured web page.
pub struct SlideSpec {
    /// Unique, stable identity of the slide.
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    /// Page to capture.
    #[serde(deserialize_with = "lenient")]
    pub url: String,
    /// Capture period in minutes.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    /// Whether the slide is captured and rotated (default true).
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Invert this slide (OR-ed with the global flag).
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
    /// Include the time in the stamp.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub show_time: Option<bool>,
    /// Include the date in the stamp.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub show_date: Option<bool>,
    /// Per-slide stamp position override.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Per-slide capture viewport override.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl SlideSpec {
    /// Build an enabled slide with only a name and URL set.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Whether the slide takes part in capture and rotation.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Capture period, falling back to the global default interval.
    pub fn interval(&self, global: &GlobalConfig) -> Duration {
        positive_secs(self.interval.map(|m| m * 60.0)).unwrap_or_else(|| global.default_interval())
    }

    /// Capture viewport: the slide override when it parses, else the global default.
    pub fn resolution(&self, global: &GlobalConfig) -> Resolution {
        match self.resolution.as_deref() {
            Some(s) => Resolution::parse(s).unwrap_or_else(|| {
                tracing::warn!(slide = %self.name, resolution = %s, "malformed slide resolution, using global");
                global.resolution()
            }),
            None => global.resolution(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Capture viewport in pixels.
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Parse `"<W>x<H>"`. Returns `None` for anything else, including zero or huge sizes.
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.trim().split_once(['x', 'X'])?;
        let width: u32 = w.trim().parse().ok()?;
        let height: u32 = h.trim().parse().ok()?;
        if width == 0 || height == 0 || width > MAX_DIM || height > MAX_DIM {
            return None;
        }
        Some(Self { width, height })
    }

    /// Parse, substituting 800x600 for absent or malformed values.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        let Some(s) = s else {
            return DEFAULT_RESOLUTION;
        };
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!(resolution = %s, fallback = %DEFAULT_RESOLUTION, "malformed resolution");
            DEFAULT_RESOLUTION
        })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Stamp font size class; unknown values read as medium.
pub enum FontSize {
    /// 5% of the image width.
    Small,
    /// 7% of the image width.
    #[default]
    Medium,
    /// 9% of the image width.
    Large,
}

impl FontSize {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Self::Small,
            "large" => Self::Large,
            _ => Self::Medium,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Percentage of the image width used as the font size.
    pub fn width_percent(self) -> u32 {
        match self {
            Self::Small => 5,
            Self::Medium => 7,
            Self::Large => 9,
        }
    }

    /// Font size in pixels for an image of `image_width`, never below 8.
    pub fn pixels_for(self, image_width: u32) -> f32 {
        let px = u64::from(image_width) * u64::from(self.width_percent()) / 100;
        px.max(8) as f32
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Horizontal stamp alignment; unknown values read as center.
pub enum Align {
    /// Left edge plus margin.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Right edge minus margin.
    Right,
}

impl Align {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Center,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Edge the stamp box is drawn on.
pub enum Position {
    /// No stamp at all.
    #[default]
    None,
    /// Along the top edge.
    Top,
    /// Along the bottom edge.
    Bottom,
    /// Any other value: no box is drawn, the rest of the overlay pass still runs.
    Unrecognized(String),
}

impl Position {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            _ => Self::Unrecognized(s.to_string()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Unrecognized(s) => s,
        }
    }
}

macro_rules! string_enum_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
                ser.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
                let s = String::deserialize(de)?;
                Ok(<$ty>::parse(&s))
            }
        }
    };
}

string_enum_serde!(FontSize);
string_enum_serde!(Align);
string_enum_serde!(Position);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Zone the stamp text is rendered in.
pub enum StampZone {
    /// Coordinated universal time.
    Utc,
    /// The host's local zone.
    Local,
    /// A fixed offset from UTC.
    Fixed(chrono::FixedOffset),
}

impl StampZone {
    /// Parse `"UTC"`, `"local"`, or an offset `±H`, `±HH`, `±H:MM`, `±HH:MM` (colon optional).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" | "utc" | "gmt" | "z" => return Some(Self::Utc),
            "local" => return Some(Self::Local),
            _ => {}
        }

        let (sign, rest) = match s.as_bytes().first()? {
            b'+' => (1, &s[1..]),
            b'-' => (-1, &s[1..]),
            _ => return None,
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let (hh, mm) = match digits.len() {
            1 | 2 => (digits.parse::<i32>().ok()?, 0),
            3 => (digits[..1].parse::<i32>().ok()?, digits[1..].parse::<i32>().ok()?),
            4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
            _ => return None,
        };
        if hh > 14 || mm > 59 {
            return None;
        }
        chrono::FixedOffset::east_opt(sign * (hh * 3600 + mm * 60)).map(Self::Fixed)
    }
}

fn positive_secs(secs: Option<f64>) -> Option<Duration> {
    secs.filter(|s| s.is_finite() && *s > 0.0 && *s < MAX_PERIOD_SECS)
        .map(Duration::from_secs_f64)
}

fn lenient<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(de)?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Ok(v),
        Err(err) => {
            tracing::warn!(value = %value, error = %err, "ignoring malformed config value");
            Ok(T::default())
        }
    }
}

fn lenient_slides<'de, D>(de: D) -> Result<Vec<SlideSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(de)?;
    let serde_json::Value::Array(items) = value else {
        if !value.is_null() {
            tracing::warn!("config `slides` is not a list, ignoring it");
        }
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<SlideSpec>(item) {
            Ok(slide) => Some(slide),
            Err(err) => {
                tracing::warn!(index = idx, error = %err, "dropping malformed slide entry");
                None
            }
        })
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
