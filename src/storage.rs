use anyhow::{Context, Result};
use fitrs_vision::TorsoBox;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BOX_PATH: &str = "torso_box.json";

/// Torso box as written between the estimate and composite stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxRecord {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl From<TorsoBox> for BoxRecord {
    fn from(b: TorsoBox) -> Self {
        Self {
            x1: b.x1,
            y1: b.y1,
            x2: b.x2,
            y2: b.y2,
        }
    }
}

impl From<BoxRecord> for TorsoBox {
    fn from(r: BoxRecord) -> Self {
        TorsoBox::new(r.x1, r.y1, r.x2, r.y2)
    }
}

pub fn save_box(path: &Path, record: &BoxRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_string_pretty(record)?;
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn load_box(path: &Path) -> Result<BoxRecord> {
    let data =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing box record {}", path.display()))
}
