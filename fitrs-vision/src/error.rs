use thiserror::Error;

/// Category of a [`TryOnError`], for callers that branch on the failure
/// instead of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    InvalidBox,
    EmptyMask,
    DegenerateGeometry,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TryOnError {
    /// Missing or malformed landmarks / images.
    #[error("invalid input: {0}")]
    Input(String),

    #[error("torso box is empty after clamping: {0}")]
    InvalidBox(String),

    #[error("garment mask has no visible pixels: {0}")]
    EmptyMask(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl TryOnError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TryOnError::Input(_) => ErrorKind::Input,
            TryOnError::InvalidBox(_) => ErrorKind::InvalidBox,
            TryOnError::EmptyMask(_) => ErrorKind::EmptyMask,
            TryOnError::DegenerateGeometry(_) => ErrorKind::DegenerateGeometry,
        }
    }
}

pub type Result<T> = std::result::Result<T, TryOnError>;
