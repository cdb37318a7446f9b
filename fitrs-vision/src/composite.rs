//! Garment compositing: fit the garment silhouette into the torso box of a
//! person image.
//!
//! Steps, in order:
//! 1. re-clamp the box to the person image
//! 2. tight-crop the garment to its silhouette
//! 3. resize garment and mask to the box
//! 4. taper the bottom edge with a perspective warp
//! 5. trim the mask at the left and right edges
//! 6. binarize the mask and blend

use image::{imageops, GenericImageView, GrayImage, Luma, RgbImage};

use crate::error::{Result, TryOnError};
use crate::garment::GarmentAsset;
use crate::torso::TorsoBox;
use crate::warp::{self, WAIST_RATIO};

pub const TRIM_RATIO: f64 = 0.08;
pub const MASK_THRESHOLD: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpParams {
    /// Bottom-edge width relative to the top edge.
    pub waist_ratio: f64,
    /// Mask columns zeroed at each side, relative to the box width.
    pub trim_ratio: f64,
    /// Mask values strictly above this are opaque.
    pub mask_threshold: u8,
}

impl Default for WarpParams {
    fn default() -> Self {
        Self {
            waist_ratio: WAIST_RATIO,
            trim_ratio: TRIM_RATIO,
            mask_threshold: MASK_THRESHOLD,
        }
    }
}

/// Stateless; one instance can serve any number of images.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    pub params: WarpParams,
}

/// Garment pixels ready to be blended into an ROI of the same size.
#[derive(Debug, Clone)]
pub struct FittedGarment {
    pub image: RgbImage,
    /// Binary: every value is 0 or 255.
    pub mask: GrayImage,
}

impl Compositor {
    pub fn new(params: WarpParams) -> Self {
        Self { params }
    }

    /// Composite `garment` into `bbox` of `person`, returning a new image.
    /// `person` is left untouched.
    pub fn composite(
        &self,
        person: &RgbImage,
        garment: &GarmentAsset,
        bbox: TorsoBox,
    ) -> Result<RgbImage> {
        let mut output = person.clone();
        self.composite_in_place(&mut output, garment, bbox)?;
        Ok(output)
    }

    /// Composite into `person` directly. Every fallible step runs before the
    /// first write, so on error `person` is unchanged.
    pub fn composite_in_place(
        &self,
        person: &mut RgbImage,
        garment: &GarmentAsset,
        bbox: TorsoBox,
    ) -> Result<TorsoBox> {
        let roi_box = reclamp(bbox, person.width(), person.height())?;
        let (roi_w, roi_h) = (roi_box.width() as u32, roi_box.height() as u32);
        log::debug!(
            "roi {}x{} at ({}, {})",
            roi_w,
            roi_h,
            roi_box.x1,
            roi_box.y1
        );

        let fitted = self.fit_garment(garment, roi_w, roi_h)?;

        let roi = person
            .view(roi_box.x1 as u32, roi_box.y1 as u32, roi_w, roi_h)
            .to_image();
        let blended = blend(&roi, &fitted.image, &fitted.mask);
        imageops::replace(person, &blended, roi_box.x1 as i64, roi_box.y1 as i64);

        Ok(roi_box)
    }

    /// Crop, resize, warp, trim and binarize the garment for a `w` x `h` ROI.
    pub fn fit_garment(&self, garment: &GarmentAsset, w: u32, h: u32) -> Result<FittedGarment> {
        if w == 0 || h == 0 {
            return Err(TryOnError::DegenerateGeometry(format!(
                "roi is {}x{}",
                w, h
            )));
        }

        let (crop_img, crop_mask) = garment.tight_crop()?;
        let resized_img = imageops::resize(&crop_img, w, h, imageops::FilterType::Triangle);
        let resized_mask = imageops::resize(&crop_mask, w, h, imageops::FilterType::Triangle);

        let transform = warp::taper_transform(w, h, self.params.waist_ratio)?;
        let image = warp::warp_perspective(&resized_img, &transform, w, h)?;
        let mut mask = warp::warp_perspective(&resized_mask, &transform, w, h)?;

        let trim = trim_sleeves(&mut mask, self.params.trim_ratio);
        log::debug!("trimmed {} mask columns per side", trim);
        binarize(&mut mask, self.params.mask_threshold);

        Ok(FittedGarment { image, mask })
    }
}

/// Clamp a box, possibly computed for another resolution, to the person
/// image it is applied to.
pub fn reclamp(bbox: TorsoBox, width: u32, height: u32) -> Result<TorsoBox> {
    let clamped = bbox.clamp_as_roi(width, height);
    if clamped.is_empty() {
        return Err(TryOnError::InvalidBox(format!(
            "{:?} clamps to {:?} on a {}x{} image",
            bbox, clamped, width, height
        )));
    }
    Ok(clamped)
}

/// Zero `round(trim_ratio * width)` columns at both edges of `mask`.
/// Returns the trim width.
pub fn trim_sleeves(mask: &mut GrayImage, trim_ratio: f64) -> u32 {
    let (w, h) = mask.dimensions();
    let trim = ((trim_ratio * w as f64).round() as u32).min(w);
    let right = w.saturating_sub(trim);
    for y in 0..h {
        for x in (0..trim).chain(right..w) {
            mask.put_pixel(x, y, Luma([0]));
        }
    }
    trim
}

/// Threshold to a hard 0 / 255 mask.
pub fn binarize(mask: &mut GrayImage, threshold: u8) {
    for p in mask.pixels_mut() {
        p[0] = if p[0] > threshold { u8::MAX } else { 0 };
    }
}

/// `garment * m + roi * (1 - m)` per channel, with `m` in `[0, 1]` taken
/// from `mask`.
pub fn blend(roi: &RgbImage, garment: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut out = roi.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let m = mask.get_pixel(x, y)[0] as f32 / 255.0;
        let g = garment.get_pixel(x, y);
        for c in 0..3 {
            let v = g[c] as f32 * m + px[c] as f32 * (1.0 - m);
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
