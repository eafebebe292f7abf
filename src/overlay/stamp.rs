//! Time/date stamp text and box geometry.

use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::{
    config::model::{Align, Position, StampZone},
    draw::{composite::PixelRect, text::TextExtent},
};

/// Padding between the box edge and the text ink, in pixels.
pub const BOX_PADDING: u32 = 5;
/// Horizontal distance of left/right aligned text from the image edge.
pub const TEXT_MARGIN: u32 = 5;

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%-m/%-d/%y";

const BLACK: [u8; 3] = [0, 0, 0];
const WHITE: [u8; 3] = [255, 255, 255];

/// Stamp text for `now`, or `None` when neither part is enabled.
pub fn stamp_text(now: SystemTime, zone: StampZone, show_time: bool, show_date: bool) -> Option<String> {
    let mut parts = Vec::with_capacity(2);
    if show_time {
        parts.push(format_in(now, zone, TIME_FORMAT));
    }
    if show_date {
        parts.push(format_in(now, zone, DATE_FORMAT));
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn format_in(now: SystemTime, zone: StampZone, fmt: &str) -> String {
    let utc: DateTime<Utc> = now.into();
    match zone {
        StampZone::Utc => utc.format(fmt).to_string(),
        StampZone::Local => utc.with_timezone(&chrono::Local).format(fmt).to_string(),
        StampZone::Fixed(offset) => utc.with_timezone(&offset).format(fmt).to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Where and in which colors a stamp is drawn.
pub struct StampLayout {
    /// Full-width box along the top or bottom edge.
    pub box_rect: PixelRect,
    /// Top-left corner of the text ink.
    pub text_origin: (f32, f32),
    pub box_color: [u8; 3],
    pub text_color: [u8; 3],
}

/// Place a stamp of `text` size on a `width` x `height` image.
///
/// Returns `None` for [`Position::None`] and unrecognized positions: no box is drawn.
pub fn layout_stamp(
    width: u32,
    height: u32,
    text: TextExtent,
    position: &Position,
    align: Align,
    inverted: bool,
) -> Option<StampLayout> {
    let box_height = text.height.max(0.0).ceil() as u32 + 2 * BOX_PADDING;
    let y0 = match position {
        Position::Top => 0,
        Position::Bottom => i64::from(height) - i64::from(box_height),
        Position::None | Position::Unrecognized(_) => return None,
    };

    let w = width as f32;
    let text_w = text.width.max(0.0);
    let x = match align {
        Align::Left => TEXT_MARGIN as f32,
        Align::Right => w - text_w - TEXT_MARGIN as f32,
        Align::Center => ((w - text_w) / 2.0).floor(),
    };
    let y = (y0 + i64::from(BOX_PADDING)) as f32;

    let (box_color, text_color) = if inverted { (BLACK, WHITE) } else { (WHITE, BLACK) };
    Some(StampLayout {
        box_rect: PixelRect::new(0, y0, width, box_height),
        text_origin: (x, y),
        box_color,
        text_color,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/stamp.rs"]
mod tests;
