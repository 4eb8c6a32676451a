use thiserror::Error;

/// Failures the engine can report to its host.
///
/// None of these reach the end user: the effect logs them at the scheduler
/// boundary and keeps the last good filter state on screen.
#[derive(Debug, Error)]
pub enum GlassError {
    #[error("invalid field dimensions {width}x{height}")]
    InvalidGeometry { width: f64, height: f64 },

    #[error("failed to encode displacement bitmap: {0}")]
    Encode(#[from] image::ImageError),

    #[error("surface rejected {operation}: {reason}")]
    Surface {
        operation: &'static str,
        reason: String,
    },

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl GlassError {
    pub fn surface(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Surface {
            operation,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GlassError>;
