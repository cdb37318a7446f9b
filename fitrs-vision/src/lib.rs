pub mod composite;
pub mod error;
pub mod garment;
pub mod geometry;
pub mod mask;
pub mod model;
pub mod pipeline;
pub mod pose;
pub mod torso;
pub mod warp;

// Re-export commonly used types
pub use composite::{Compositor, WarpParams};
pub use error::{ErrorKind, TryOnError};
pub use garment::GarmentAsset;
pub use geometry::{Landmark, Point2D, Shoulders};
pub use mask::MaskChain;
pub use pipeline::Pipeline;
pub use pose::{FixedLandmarks, MoveNet, PoseDetector};
pub use torso::{TorsoBox, TorsoParams};
