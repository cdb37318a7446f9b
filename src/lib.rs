pub mod config;
pub mod overlay;
pub mod storage;

// Re-export vision types for convenience
pub use fitrs_vision::{
    composite, mask, pose, torso, Compositor, ErrorKind, GarmentAsset, Landmark, MaskChain,
    Pipeline, Point2D, Shoulders, TorsoBox, TorsoParams, TryOnError, WarpParams,
};
