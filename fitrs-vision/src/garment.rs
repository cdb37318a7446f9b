use image::{imageops, GrayImage, RgbImage};

use crate::error::{Result, TryOnError};

/// Flattened garment: color pixels plus a silhouette mask of the same size.
#[derive(Debug, Clone)]
pub struct GarmentAsset {
    image: RgbImage,
    mask: GrayImage,
}

/// Pixel rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GarmentAsset {
    pub fn new(image: RgbImage, mask: GrayImage) -> Result<Self> {
        if image.dimensions() != mask.dimensions() {
            return Err(TryOnError::Input(format!(
                "garment is {}x{} but mask is {}x{}",
                image.width(),
                image.height(),
                mask.width(),
                mask.height()
            )));
        }
        Ok(Self { image, mask })
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Bounding rectangle of the visible silhouette.
    pub fn silhouette_bounds(&self) -> Result<CropRect> {
        tight_bounds(&self.mask).ok_or_else(|| {
            TryOnError::EmptyMask(format!(
                "all {} mask pixels are zero",
                self.mask.width() as u64 * self.mask.height() as u64
            ))
        })
    }

    /// Drop the transparent padding around the silhouette.
    pub fn tight_crop(&self) -> Result<(RgbImage, GrayImage)> {
        let r = self.silhouette_bounds()?;
        log::debug!(
            "garment silhouette at ({}, {}) size {}x{}",
            r.x,
            r.y,
            r.width,
            r.height
        );
        let image = imageops::crop_imm(&self.image, r.x, r.y, r.width, r.height).to_image();
        let mask = imageops::crop_imm(&self.mask, r.x, r.y, r.width, r.height).to_image();
        Ok((image, mask))
    }
}

/// Smallest rectangle containing every non-zero pixel of `mask`.
pub fn tight_bounds(mask: &GrayImage) -> Option<CropRect> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] == 0 {
            continue;
        }
        found = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    found.then(|| CropRect {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}
