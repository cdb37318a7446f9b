use std::path::Path;

use anyhow::Result;
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use ort::{session::Session, value::Value};

use crate::geometry::{Landmark, Shoulders};

/// COCO keypoint order used by single-person pose models.
pub const LEFT_SHOULDER: usize = 5;
pub const RIGHT_SHOULDER: usize = 6;
pub const NUM_KEYPOINTS: usize = 17;

/// Source of shoulder landmarks for one person image.
///
/// `Ok(None)` means no person was found; errors are inference failures.
pub trait PoseDetector {
    fn shoulders(&mut self, img: &DynamicImage) -> Result<Option<Shoulders>>;
}

impl<D: PoseDetector + ?Sized> PoseDetector for Box<D> {
    fn shoulders(&mut self, img: &DynamicImage) -> Result<Option<Shoulders>> {
        (**self).shoulders(img)
    }
}

/// Landmarks known ahead of time, e.g. passed on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLandmarks(pub Option<Shoulders>);

impl PoseDetector for FixedLandmarks {
    fn shoulders(&mut self, _img: &DynamicImage) -> Result<Option<Shoulders>> {
        Ok(self.0)
    }
}

/// MoveNet-style single-person pose model.
///
/// Input `[1, S, S, 3]` int32 RGB, output `[1, 1, 17, 3]` holding
/// `(y, x, score)` normalized to the input square.
pub struct MoveNet {
    session: Session,
    input_size: u32,
    min_score: f32,
}

impl MoveNet {
    pub fn new(session: Session, input_size: u32, min_score: f32) -> Result<Self> {
        if input_size == 0 {
            anyhow::bail!("pose model input size must be at least 1");
        }
        Ok(Self {
            session,
            input_size,
            min_score,
        })
    }

    pub fn from_file(path: &Path, input_size: u32, min_score: f32) -> Result<Self> {
        if input_size == 0 {
            anyhow::bail!("pose model input size must be at least 1");
        }
        Self::new(crate::model::pose_session(path)?, input_size, min_score)
    }

    /// All 17 keypoints, normalized to the original image.
    pub fn keypoints(&mut self, img: &DynamicImage) -> Result<Vec<Landmark>> {
        let target_size = self.input_size;
        let (orig_width, orig_height) = img.dimensions();

        // Pad to square to avoid distortion
        let letterbox = Letterbox::new(orig_width, orig_height, target_size)?;
        let resized = img.resize_exact(
            letterbox.scaled_width,
            letterbox.scaled_height,
            image::imageops::FilterType::Triangle,
        );
        let mut canvas = DynamicImage::new_rgb8(target_size, target_size);
        image::imageops::overlay(
            &mut canvas,
            &resized,
            letterbox.offset_x as i64,
            letterbox.offset_y as i64,
        );

        let input_data: Vec<i32> = canvas.to_rgb8().as_raw().iter().map(|&v| v as i32).collect();
        let input_array = Array4::from_shape_vec(
            (1, target_size as usize, target_size as usize, 3),
            input_data,
        )?;
        let input_tensor = Value::from_array(input_array)?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        if data.len() < NUM_KEYPOINTS * 3 {
            anyhow::bail!(
                "unexpected pose output shape {:?} ({} values)",
                shape.iter().collect::<Vec<_>>(),
                data.len()
            );
        }

        let keypoints = data[..NUM_KEYPOINTS * 3]
            .chunks_exact(3)
            .map(|kp| {
                let (x, y) = letterbox.unmap(kp[1], kp[0]);
                Landmark::with_score(x, y, kp[2])
            })
            .collect();

        Ok(keypoints)
    }
}

impl PoseDetector for MoveNet {
    fn shoulders(&mut self, img: &DynamicImage) -> Result<Option<Shoulders>> {
        let keypoints = self.keypoints(img)?;
        let left = keypoints[LEFT_SHOULDER];
        let right = keypoints[RIGHT_SHOULDER];
        log::debug!(
            "shoulder scores: left {:.3} right {:.3}",
            left.score,
            right.score
        );

        if left.score < self.min_score || right.score < self.min_score {
            return Ok(None);
        }
        Ok(Some(Shoulders { left, right }))
    }
}

/// Placement of an image inside a square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scale: f32,
    scaled_width: u32,
    scaled_height: u32,
    offset_x: u32,
    offset_y: u32,
    orig_width: u32,
    orig_height: u32,
    target_size: u32,
}

impl Letterbox {
    fn new(orig_width: u32, orig_height: u32, target_size: u32) -> Result<Self> {
        if orig_width == 0 || orig_height == 0 {
            anyhow::bail!("empty image");
        }
        if target_size == 0 {
            anyhow::bail!("pose model input size must be at least 1");
        }
        let max_dim = orig_width.max(orig_height);
        let scale = target_size as f32 / max_dim as f32;
        let scaled_width = ((orig_width as f32 * scale).round() as u32).clamp(1, target_size);
        let scaled_height = ((orig_height as f32 * scale).round() as u32).clamp(1, target_size);
        Ok(Self {
            scale,
            scaled_width,
            scaled_height,
            offset_x: (target_size - scaled_width) / 2,
            offset_y: (target_size - scaled_height) / 2,
            orig_width,
            orig_height,
            target_size,
        })
    }

    /// Normalized canvas coordinates to normalized original coordinates.
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        let x_px = (x * self.target_size as f32 - self.offset_x as f32) / self.scale;
        let y_px = (y * self.target_size as f32 - self.offset_y as f32) / self.scale;
        (
            x_px / self.orig_width as f32,
            y_px / self.orig_height as f32,
        )
    }
}
