//! Torso box estimation from two shoulder keypoints.
//!
//! Torso length is a fixed multiple of shoulder width, so only the two
//! shoulder landmarks are needed:
//!
//! ```text
//!   (x1,y1) +-------------+        y1 = cy - top_offset
//!           |  L ---c--- R |        shoulder line through c = (cx, cy)
//!           |              |
//!           |              |        height = shoulder_width * torso_ratio
//!           +-------------+ (x2,y2)
//! ```

use crate::error::{Result, TryOnError};
use crate::geometry::Point2D;

pub const TORSO_RATIO: f64 = 1.3;
pub const TOP_OFFSET_RATIO: f64 = 0.1;
pub const MIN_BOX_SIZE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsoParams {
    /// Torso height relative to shoulder width.
    pub torso_ratio: f64,
    /// Lift above the shoulder line, relative to shoulder width.
    pub top_offset_ratio: f64,
    /// Floor for the shoulder width in pixels.
    pub min_box_size: u32,
}

impl Default for TorsoParams {
    fn default() -> Self {
        Self {
            torso_ratio: TORSO_RATIO,
            top_offset_ratio: TOP_OFFSET_RATIO,
            min_box_size: MIN_BOX_SIZE,
        }
    }
}

/// Axis-aligned box in pixel coordinates. `x2`/`y2` are exclusive when used
/// as slice bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorsoBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl TorsoBox {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Clamp every bound into `[0, width) x [0, height)` independently.
    /// A box hanging off the frame is truncated, never shifted.
    pub fn clamp_inside(&self, width: u32, height: u32) -> TorsoBox {
        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;
        TorsoBox {
            x1: self.x1.clamp(0, max_x),
            y1: self.y1.clamp(0, max_y),
            x2: self.x2.clamp(0, max_x),
            y2: self.y2.clamp(0, max_y),
        }
    }

    /// Clamp for use as an exclusive ROI range: every bound into `[0, dim]`.
    /// A box lying entirely off the image collapses to zero area.
    pub fn clamp_as_roi(&self, width: u32, height: u32) -> TorsoBox {
        let (w, h) = (width as i32, height as i32);
        TorsoBox {
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
            x2: self.x2.clamp(0, w),
            y2: self.y2.clamp(0, h),
        }
    }
}

/// Intermediate quantities of an estimate, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorsoGeometry {
    pub shoulder_width: i32,
    pub center: Point2D,
    pub top_offset: i32,
    pub box_height: i32,
}

impl TorsoGeometry {
    pub fn from_shoulders(left: Point2D, right: Point2D, params: &TorsoParams) -> Self {
        let shoulder_width = (left.distance(&right).round() as i32).max(params.min_box_size as i32);
        let center = left.midpoint(&right);
        let top_offset = (shoulder_width as f64 * params.top_offset_ratio).round() as i32;
        let box_height = (shoulder_width as f64 * params.torso_ratio).round() as i32;

        Self {
            shoulder_width,
            center,
            top_offset,
            box_height,
        }
    }

    /// The box before it is clamped to any image.
    pub fn unclamped_box(&self) -> TorsoBox {
        let half = self.shoulder_width / 2;
        let y1 = self.center.y - self.top_offset;
        TorsoBox {
            x1: self.center.x - half,
            y1,
            x2: self.center.x + half,
            y2: y1 + self.box_height,
        }
    }
}

/// Derive the torso box for an image of `width` x `height` pixels.
pub fn estimate(
    left: Point2D,
    right: Point2D,
    width: u32,
    height: u32,
    params: &TorsoParams,
) -> Result<TorsoBox> {
    if width == 0 || height == 0 {
        return Err(TryOnError::Input(format!(
            "image has zero dimension ({}x{})",
            width, height
        )));
    }

    let geometry = TorsoGeometry::from_shoulders(left, right, params);
    log::debug!(
        "shoulder width {} center ({}, {}) top offset {} height {}",
        geometry.shoulder_width,
        geometry.center.x,
        geometry.center.y,
        geometry.top_offset,
        geometry.box_height
    );

    let bbox = geometry.unclamped_box().clamp_inside(width, height);
    if bbox.is_empty() {
        return Err(TryOnError::InvalidBox(format!(
            "shoulders {:?}/{:?} fall outside the {}x{} frame",
            left, right, width, height
        )));
    }

    Ok(bbox)
}
