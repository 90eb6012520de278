use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures while turning a stored frame into a displayable raster.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to decode pixel data: {0}")]
    Decode(String),

    #[error("requested frame {requested}, but only {available} frame(s) are available")]
    FrameOutOfRange { requested: u32, available: u32 },

    #[error("failed to materialize frame data: {0}")]
    Materialize(String),

    #[error("unsupported photometric interpretation `{interpretation}`: {reason}")]
    Unsupported {
        interpretation: String,
        reason: String,
    },

    #[error("malformed pixel buffer: {0}")]
    Buffer(String),
}
