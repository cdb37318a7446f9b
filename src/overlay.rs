//! Debug overlays: shoulder markers, shoulder line and torso box outline.

use fitrs_vision::{Point2D, TorsoBox};
use image::{Rgb, RgbImage};

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const SHOULDER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

fn put(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Outline with the given stroke thickness, growing inward.
pub fn draw_box(img: &mut RgbImage, bbox: &TorsoBox, thickness: i32, color: Rgb<u8>) {
    for t in 0..thickness {
        let (x1, y1, x2, y2) = (bbox.x1 + t, bbox.y1 + t, bbox.x2 - t, bbox.y2 - t);
        if x2 < x1 || y2 < y1 {
            break;
        }
        for x in x1..=x2 {
            put(img, x, y1, color);
            put(img, x, y2, color);
        }
        for y in y1..=y2 {
            put(img, x1, y, color);
            put(img, x2, y, color);
        }
    }
}

pub fn draw_disc(img: &mut RgbImage, center: Point2D, radius: i32, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, center.x + dx, center.y + dy, color);
            }
        }
    }
}

pub fn draw_line(img: &mut RgbImage, from: Point2D, to: Point2D, color: Rgb<u8>) {
    let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).max(1);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = from.x as f32 + (to.x - from.x) as f32 * t;
        let y = from.y as f32 + (to.y - from.y) as f32 * t;
        put(img, x.round() as i32, y.round() as i32, color);
    }
}

/// Estimate-stage debug image.
pub fn shoulders_and_box(
    img: &RgbImage,
    left: Point2D,
    right: Point2D,
    bbox: &TorsoBox,
) -> RgbImage {
    let mut out = img.clone();
    draw_disc(&mut out, left, 6, SHOULDER_COLOR);
    draw_disc(&mut out, right, 6, SHOULDER_COLOR);
    draw_line(&mut out, left, right, LINE_COLOR);
    draw_box(&mut out, bbox, 2, BOX_COLOR);
    out
}
