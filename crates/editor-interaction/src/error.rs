use editor_core::ObjectId;
use thiserror::Error;

/// Errors surfaced at the editor boundary. Geometry itself never fails.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to parse editor config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("invalid viewport size {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },

    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
}

pub type Result<T> = std::result::Result<T, EditorError>;
