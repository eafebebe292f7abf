use image::Rgba;

use super::*;

fn fontless() -> TextRenderer {
    TextRenderer::without_fonts()
}

#[test]
fn unknown_family_falls_back_to_default() {
    let r = fontless();
    assert_eq!(r.load_font(12.0, Some("NoSuchFace")).family, DEFAULT_FAMILY);
    assert_eq!(r.load_font(12.0, Some("  ")).family, DEFAULT_FAMILY);
    assert_eq!(r.load_font(12.0, None).family, DEFAULT_FAMILY);
    assert_eq!(r.load_font(12.0, None).size_px, 12.0);
}

#[test]
fn measure_without_fonts_uses_size_estimate() {
    let r = fontless();
    let font = r.load_font(20.0, None);
    let e = r.measure_text("12:30", &font);
    assert_eq!(e.left, 0.0);
    assert_eq!(e.width, 60.0);
    assert_eq!(e.height, 15.0);
    assert_eq!(e.top, 5.0);
}

#[test]
fn draw_without_fonts_leaves_image_untouched() {
    let r = fontless();
    let font = r.load_font(20.0, None);
    let mut img = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 255]));
    r.draw_text(&mut img, (2.0, 2.0), "12:30", &font, [255, 255, 255])
        .unwrap();
    assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
}

#[test]
fn markup_characters_are_escaped() {
    assert_eq!(xml_escape(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
    let font = Font {
        size_px: 10.0,
        family: "A&B".to_owned(),
    };
    let svg = text_svg(10, 10, 0.0, 10.0, "<1>", &font, [1, 2, 3]);
    assert!(svg.contains(r#"font-family="A&amp;B""#));
    assert!(svg.contains(">&lt;1&gt;</text>"));
    assert!(svg.contains("rgb(1,2,3)"));
}

#[test]
fn system_fonts_draw_ink_inside_the_requested_box() {
    let r = TextRenderer::new(None);
    if !r.has_fonts() {
        return;
    }
    let font = r.load_font(24.0, None);
    let e = r.measure_text("88", &font);
    assert!(e.width > 0.0 && e.height > 0.0);

    let mut img = RgbaImage::from_pixel(120, 60, Rgba([0, 0, 0, 255]));
    r.draw_text(&mut img, (10.0, 10.0), "88", &font, [255, 255, 255])
        .unwrap();
    let lit: Vec<(u32, u32)> = img
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 128)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!lit.is_empty());
    // Anti-aliasing may bleed a pixel past the measured box.
    assert!(lit.iter().all(|&(x, y)| x >= 8 && y >= 8));
    assert!(
        lit.iter()
            .all(|&(x, y)| (x as f32) <= 12.0 + e.width && (y as f32) <= 12.0 + e.height)
    );
}

#[test]
fn without_fonts_has_no_faces() {
    let text = TextRenderer::without_fonts();
    assert!(!text.has_fonts());
    assert_eq!(text.load_font(12.0, Some("Anything")).family, DEFAULT_FAMILY);
}
