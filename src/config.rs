use anyhow::{Context, Result};
use fitrs_vision::{TorsoParams, WarpParams};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<&'static Path> =
    Lazy::new(|| Path::new(option_env!("FITRS_CONFIG_PATH").unwrap_or("fitrs.toml")));

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub torso: TorsoConfig,
    pub garment: GarmentConfig,
    pub pose: PoseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorsoConfig {
    pub torso_ratio: f64,
    pub top_offset_ratio: f64,
    pub min_box_size: u32,
}

impl Default for TorsoConfig {
    fn default() -> Self {
        let p = TorsoParams::default();
        Self {
            torso_ratio: p.torso_ratio,
            top_offset_ratio: p.top_offset_ratio,
            min_box_size: p.min_box_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarmentConfig {
    pub waist_ratio: f64,
    pub trim_ratio: f64,
    pub mask_threshold: u8,
}

impl Default for GarmentConfig {
    fn default() -> Self {
        let p = WarpParams::default();
        Self {
            waist_ratio: p.waist_ratio,
            trim_ratio: p.trim_ratio,
            mask_threshold: p.mask_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// ONNX single-person pose model; unset means landmarks must be given.
    pub model: Option<PathBuf>,
    pub input_size: u32,
    pub min_score: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            model: None,
            input_size: 192,
            min_score: 0.3,
        }
    }
}

impl Config {
    pub fn torso_params(&self) -> TorsoParams {
        TorsoParams {
            torso_ratio: self.torso.torso_ratio,
            top_offset_ratio: self.torso.top_offset_ratio,
            min_box_size: self.torso.min_box_size,
        }
    }

    pub fn warp_params(&self) -> WarpParams {
        WarpParams {
            waist_ratio: self.garment.waist_ratio,
            trim_ratio: self.garment.trim_ratio,
            mask_threshold: self.garment.mask_threshold,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, data).with_context(|| format!("writing config {}", path.display()))?;
    Ok(())
}
