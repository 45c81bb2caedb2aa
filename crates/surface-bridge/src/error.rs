use frame_formats::{CopyError, PixelFormat};

/// The host environment could not satisfy a surface request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("invalid dimensions {width}x{height} for {format}")]
    InvalidDimensions {
        format: PixelFormat,
        width: u32,
        height: u32,
    },
    #[error("host allocation failed: {0}")]
    Host(String),
}

/// Everything a bridge operation can fail with. All of these are
/// recovered at the dispatch boundary and handed back to the caller as
/// values; none escape as panics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("allocation failed: {0}")]
    Allocation(#[from] AllocationError),
    #[error("no surface registered for id {0}")]
    NotFound(i64),
    #[error(transparent)]
    Copy(#[from] CopyError),
    #[error("surface {0} already disposed")]
    SurfaceDisposed(i64),
    #[error("method not implemented: {0}")]
    Unimplemented(String),
    #[error("missing or malformed arguments: {0}")]
    BadArgs(String),
}
