use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView, RgbImage};

use crate::composite::{Compositor, WarpParams};
use crate::error::TryOnError;
use crate::garment::GarmentAsset;
use crate::geometry::Shoulders;
use crate::pose::PoseDetector;
use crate::torso::{self, TorsoBox, TorsoParams};

/// Full pipeline: detect shoulders → torso box → composite.
///
/// The detector is created once by the caller and reused for every image.
pub struct Pipeline<D: PoseDetector> {
    pub detector: D,
    pub torso: TorsoParams,
    pub compositor: Compositor,
}

#[derive(Debug, Clone)]
pub struct TryOn {
    pub shoulders: Shoulders,
    pub bbox: TorsoBox,
    pub image: RgbImage,
}

impl<D: PoseDetector> Pipeline<D> {
    pub fn new(detector: D, torso: TorsoParams, warp: WarpParams) -> Self {
        Self {
            detector,
            torso,
            compositor: Compositor::new(warp),
        }
    }

    /// Stage one: locate the shoulders and derive the torso box.
    pub fn estimate_box(&mut self, img: &DynamicImage) -> Result<(Shoulders, TorsoBox)> {
        let shoulders = self
            .detector
            .shoulders(img)
            .context("detecting pose")?
            .ok_or_else(|| TryOnError::Input("no human pose detected".to_string()))?;

        let (width, height) = img.dimensions();
        let (left, right) = shoulders.to_pixels(width, height);
        log::debug!("shoulders at {:?} and {:?}", left, right);

        let bbox = torso::estimate(left, right, width, height, &self.torso)?;
        Ok((shoulders, bbox))
    }

    /// Stage two on its own, for a box estimated earlier.
    pub fn composite(
        &self,
        person: &RgbImage,
        garment: &GarmentAsset,
        bbox: TorsoBox,
    ) -> Result<RgbImage> {
        Ok(self.compositor.composite(person, garment, bbox)?)
    }

    /// Both stages on one person image.
    pub fn try_on(&mut self, person: &DynamicImage, garment: &GarmentAsset) -> Result<TryOn> {
        let (shoulders, bbox) = self.estimate_box(person)?;
        let image = self
            .composite(&person.to_rgb8(), garment, bbox)
            .context("compositing garment")?;

        Ok(TryOn {
            shoulders,
            bbox,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Landmark;
    use crate::pose::FixedLandmarks;
    use crate::ErrorKind;
    use image::{GrayImage, Luma, Rgb};

    fn shoulders() -> Shoulders {
        Shoulders {
            left: Landmark::new(250.0 / 600.0, 300.0 / 800.0),
            right: Landmark::new(350.0 / 600.0, 300.0 / 800.0),
        }
    }

    #[test]
    fn estimate_box_from_fixed_landmarks() {
        let mut pipeline = Pipeline::new(
            FixedLandmarks(Some(shoulders())),
            TorsoParams::default(),
            WarpParams::default(),
        );
        let img = DynamicImage::new_rgb8(600, 800);
        let (_, bbox) = pipeline.estimate_box(&img).unwrap();
        assert_eq!(bbox, TorsoBox::new(250, 290, 350, 420));
    }

    #[test]
    fn missing_pose_is_input_error() {
        let mut pipeline = Pipeline::new(
            FixedLandmarks(None),
            TorsoParams::default(),
            WarpParams::default(),
        );
        let err = pipeline
            .estimate_box(&DynamicImage::new_rgb8(10, 10))
            .unwrap_err();
        let kind = err.downcast_ref::<TryOnError>().map(TryOnError::kind);
        assert_eq!(kind, Some(ErrorKind::Input));
    }

    #[test]
    fn try_on_paints_inside_box_only() {
        let mut pipeline = Pipeline::new(
            FixedLandmarks(Some(shoulders())),
            TorsoParams::default(),
            WarpParams::default(),
        );
        let person = DynamicImage::ImageRgb8(RgbImage::from_pixel(600, 800, Rgb([0, 0, 255])));
        let garment = GarmentAsset::new(
            RgbImage::from_pixel(50, 60, Rgb([255, 0, 0])),
            GrayImage::from_pixel(50, 60, Luma([255])),
        )
        .unwrap();

        let result = pipeline.try_on(&person, &garment).unwrap();
        assert_eq!(result.bbox, TorsoBox::new(250, 290, 350, 420));
        assert_eq!(result.image.get_pixel(300, 300), &Rgb([255, 0, 0]));
        assert_eq!(result.image.get_pixel(100, 100), &Rgb([0, 0, 255]));
        assert_eq!(result.image.get_pixel(300, 500), &Rgb([0, 0, 255]));
    }
}
