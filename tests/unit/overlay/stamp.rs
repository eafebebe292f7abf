use std::time::{Duration, UNIX_EPOCH};

use super::*;

// 2024-03-05T14:07:00Z
fn at() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_709_647_620)
}

fn extent(width: f32, height: f32) -> TextExtent {
    TextExtent {
        left: 0.0,
        top: 0.0,
        width,
        height,
    }
}

#[test]
fn stamp_text_formats_time_and_date() {
    assert_eq!(
        stamp_text(at(), StampZone::Utc, true, true).as_deref(),
        Some("14:07 3/5/24")
    );
    assert_eq!(stamp_text(at(), StampZone::Utc, true, false).as_deref(), Some("14:07"));
    assert_eq!(stamp_text(at(), StampZone::Utc, false, true).as_deref(), Some("3/5/24"));
    assert_eq!(stamp_text(at(), StampZone::Utc, false, false), None);
}

#[test]
fn stamp_text_honors_fixed_offset() {
    let zone = StampZone::parse("+05:30").unwrap();
    assert_eq!(stamp_text(at(), zone, true, false).as_deref(), Some("19:37"));
    let zone = StampZone::parse("-15").unwrap_or(StampZone::Utc);
    assert_eq!(stamp_text(at(), zone, true, false).as_deref(), Some("14:07"));
}

#[test]
fn top_box_spans_width_with_padding() {
    let l = layout_stamp(200, 100, extent(40.0, 10.2), &Position::Top, Align::Left, false).unwrap();
    assert_eq!(l.box_rect, PixelRect::new(0, 0, 200, 21));
    assert_eq!(l.text_origin, (5.0, 5.0));
    assert_eq!(l.box_color, [255, 255, 255]);
    assert_eq!(l.text_color, [0, 0, 0]);
}

#[test]
fn bottom_box_sits_on_the_lower_edge() {
    let l = layout_stamp(200, 100, extent(40.0, 10.0), &Position::Bottom, Align::Right, true)
        .unwrap();
    assert_eq!(l.box_rect, PixelRect::new(0, 80, 200, 20));
    assert_eq!(l.text_origin, (155.0, 85.0));
    assert_eq!(l.box_color, [0, 0, 0]);
    assert_eq!(l.text_color, [255, 255, 255]);
}

#[test]
fn center_alignment_rounds_down() {
    let l = layout_stamp(101, 50, extent(40.0, 10.0), &Position::Top, Align::Center, false)
        .unwrap();
    assert_eq!(l.text_origin.0, 30.0);
}

#[test]
fn none_and_unrecognized_positions_draw_nothing() {
    let e = extent(10.0, 10.0);
    assert_eq!(layout_stamp(100, 100, e, &Position::None, Align::Center, false), None);
    assert_eq!(
        layout_stamp(
            100,
            100,
            e,
            &Position::Unrecognized("middle".into()),
            Align::Center,
            false
        ),
        None
    );
}
