use image::{Rgba, RgbaImage};

use crate::foundation::error::{DashError, DashResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Axis-aligned pixel rectangle; may extend past the image and is clipped when drawn.
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn clipped(&self, img_w: u32, img_h: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + i64::from(self.width)).min(i64::from(img_w));
        let y1 = (self.y + i64::from(self.height)).min(i64::from(img_h));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Fill `rect` with an opaque `color`.
pub fn draw_box(img: &mut RgbaImage, rect: PixelRect, color: [u8; 3]) {
    let Some((x0, y0, x1, y1)) = rect.clipped(img.width(), img.height()) else {
        return;
    };
    let fill = Rgba([color[0], color[1], color[2], 255]);
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, fill);
        }
    }
}

/// Source-over composite premultiplied RGBA8 `src` (same size as `dst`) onto straight-alpha `dst`.
pub fn over_premul_in_place(dst: &mut RgbaImage, src_premul: &[u8]) -> DashResult<()> {
    if dst.as_raw().len() != src_premul.len() {
        return Err(DashError::image(
            "over_premul_in_place expects equal-size rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        let inv = 255 - sa;
        let da = u16::from(d[3]);
        // dst is straight alpha; premultiply, blend, then un-premultiply.
        let out_a = sa + mul_div255(da, inv);
        for i in 0..3 {
            let dc = mul_div255(u16::from(d[i]), da);
            let c = u16::from(s[i]) + mul_div255(dc, inv);
            d[i] = if out_a == 0 {
                0
            } else {
                ((u32::from(c) * 255 + u32::from(out_a) / 2) / u32::from(out_a)).min(255) as u8
            };
        }
        d[3] = out_a.min(255) as u8;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
