use std::path::Path;

use anyhow::{Context, Result};
#[cfg(any(feature = "openvino", feature = "cuda"))]
use ort::ep::{self, ExecutionProvider};
use ort::session::{
    builder::{GraphOptimizationLevel, SessionBuilder},
    Session,
};

/// Shared builder for every model session: full graph optimization plus
/// whichever execution providers were enabled at build time.
pub fn session_builder() -> Result<SessionBuilder> {
    #[allow(unused_mut)]
    let mut builder =
        Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

    #[cfg(feature = "openvino")]
    {
        let ep = ep::OpenVINO::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("openvino feature is enabled, onnx runtime not compiled with openvino")
        }
    }

    #[cfg(feature = "cuda")]
    {
        let ep = ep::CUDA::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("cuda feature is enabled, onnx runtime not compiled with cuda")
        }
    }

    Ok(builder)
}

/// Load a pose model once; the session is reused for every image.
///
/// No pose model ships with the crate, so it is read from a configured path
/// (`[pose] model` or `--model`) instead of being embedded in the binary.
pub fn pose_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        anyhow::bail!("pose model not found at {}", path.display());
    }
    session_builder()?
        .commit_from_file(path)
        .with_context(|| format!("load pose model {}", path.display()))
}
