pub mod resume;
pub mod upload;
pub mod user;

use thiserror::Error;

/// Raised when a text column holds a value outside its enum's vocabulary.
#[derive(Debug, Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
