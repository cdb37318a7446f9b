//! Garment silhouette sourcing.
//!
//! Garments arrive in different shapes: a color image with a separate mask,
//! an RGBA cut-out, or a product shot on a plain light background. Each is a
//! [`MaskStrategy`]; a [`MaskChain`] tries them in order and keeps the first
//! one that yields a visible silhouette.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};

use crate::error::{Result, TryOnError};
use crate::garment::{tight_bounds, GarmentAsset};

pub trait MaskStrategy {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the strategy does not apply to this garment and the
    /// next one should be tried. Errors abort the chain.
    fn extract(&self, garment: &DynamicImage) -> Result<Option<GrayImage>>;
}

/// Mask supplied alongside the garment, e.g. a `dress_mask.png`.
///
/// An explicit mask is authoritative: a blank one is an error instead of a
/// cue to infer a silhouette.
pub struct ProvidedMask {
    mask: GrayImage,
}

impl ProvidedMask {
    pub fn new(mask: GrayImage) -> Self {
        Self { mask }
    }
}

impl MaskStrategy for ProvidedMask {
    fn name(&self) -> &'static str {
        "provided"
    }

    fn extract(&self, garment: &DynamicImage) -> Result<Option<GrayImage>> {
        if garment.dimensions() != self.mask.dimensions() {
            return Err(TryOnError::Input(format!(
                "mask is {}x{} but garment is {}x{}",
                self.mask.width(),
                self.mask.height(),
                garment.width(),
                garment.height()
            )));
        }
        if tight_bounds(&self.mask).is_none() {
            return Err(TryOnError::EmptyMask(
                "provided mask has no non-zero pixel".to_string(),
            ));
        }
        Ok(Some(self.mask.clone()))
    }
}

/// Alpha channel of an RGBA cut-out.
pub struct AlphaChannel;

impl MaskStrategy for AlphaChannel {
    fn name(&self) -> &'static str {
        "alpha"
    }

    fn extract(&self, garment: &DynamicImage) -> Result<Option<GrayImage>> {
        if !garment.color().has_alpha() {
            return Ok(None);
        }
        let rgba = garment.to_rgba8();
        if rgba.pixels().all(|p| p[3] == u8::MAX) {
            // opaque everywhere, alpha carries no silhouette
            return Ok(None);
        }
        let (w, h) = rgba.dimensions();
        Ok(Some(GrayImage::from_fn(w, h, |x, y| {
            Luma([rgba.get_pixel(x, y)[3]])
        })))
    }
}

/// Near-white, low-saturation pixels are background.
pub struct LightBackground {
    pub min_value: u8,
    pub max_saturation: u8,
}

impl Default for LightBackground {
    fn default() -> Self {
        Self {
            min_value: 200,
            max_saturation: 40,
        }
    }
}

impl MaskStrategy for LightBackground {
    fn name(&self) -> &'static str {
        "light-background"
    }

    fn extract(&self, garment: &DynamicImage) -> Result<Option<GrayImage>> {
        let rgb = garment.to_rgb8();
        let (w, h) = rgb.dimensions();
        Ok(Some(GrayImage::from_fn(w, h, |x, y| {
            let p = rgb.get_pixel(x, y);
            let (value, saturation) = value_saturation(p[0], p[1], p[2]);
            let background = value >= self.min_value && saturation <= self.max_saturation;
            Luma([if background { 0 } else { 255 }])
        })))
    }
}

/// HSV value and saturation on a 0..=255 scale.
fn value_saturation(r: u8, g: u8, b: u8) -> (u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == 0 {
        return (0, 0);
    }
    let s = ((max - min) as u32 * 255 + max as u32 / 2) / max as u32;
    (max, s as u8)
}

#[derive(Default)]
pub struct MaskChain {
    strategies: Vec<Box<dyn MaskStrategy>>,
}

impl MaskChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard order: caller mask if any, then alpha, then background keying.
    pub fn standard(provided: Option<GrayImage>) -> Self {
        let mut chain = Self::new();
        if let Some(mask) = provided {
            chain = chain.with(ProvidedMask::new(mask));
        }
        chain.with(AlphaChannel).with(LightBackground::default())
    }

    pub fn with(mut self, strategy: impl MaskStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Build a [`GarmentAsset`] with the first mask that has any visible
    /// pixel. Returns the asset and the name of the strategy that produced it.
    pub fn resolve(&self, garment: &DynamicImage) -> Result<(GarmentAsset, &'static str)> {
        for strategy in &self.strategies {
            match strategy.extract(garment)? {
                Some(mask) if tight_bounds(&mask).is_some() => {
                    log::debug!("garment mask from '{}' strategy", strategy.name());
                    let asset = GarmentAsset::new(garment.to_rgb8(), mask)?;
                    return Ok((asset, strategy.name()));
                }
                Some(_) => {
                    log::warn!("'{}' mask is empty, trying next", strategy.name());
                }
                None => {
                    log::debug!("'{}' mask strategy not applicable", strategy.name());
                }
            }
        }

        Err(TryOnError::EmptyMask(format!(
            "none of {} mask strategies found a garment silhouette",
            self.strategies.len()
        )))
    }
}
