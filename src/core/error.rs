use std::error::Error;
use std::fmt;

/// Failures surfaced by the render pipeline. Degenerate viewports are
/// rejected before any work is dispatched; a worker failure abandons the
/// whole render attempt with no retry and no partial composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    InvalidViewport(String),
    WorkerFailure(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidViewport(reason) => {
                write!(formatter, "invalid viewport: {}", reason)
            }
            RenderError::WorkerFailure(reason) => {
                write!(formatter, "render worker failure: {}", reason)
            }
        }
    }
}

impl Error for RenderError {}
