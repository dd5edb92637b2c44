//! Pointer motion sinks.
//!
//! The scheduler talks to a sink through a small trait so that dry-run mode
//! and tests can swap out the real X11 backend.

mod x11;

pub use x11::X11Pointer;
use thiserror::Error;

/// Trait for pointer motion emitters.
pub trait PointerSink: Send {
    /// Move the pointer by `dx` pixels on the X axis, then immediately back,
    /// for a net displacement of zero.
    fn jiggle(&mut self, dx: i16) -> Result<(), PointerError>;
}

/// Errors that can occur while emitting pointer motion.
#[derive(Error, Debug)]
pub enum PointerError {
    #[error("X11 connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Pointer motion request failed: {0}")]
    MotionFailed(String),
}

/// Sink for dry-run mode: accepts every jiggle without touching a display.
#[derive(Debug, Default)]
pub struct NullPointer;

impl PointerSink for NullPointer {
    fn jiggle(&mut self, _dx: i16) -> Result<(), PointerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_pointer_always_succeeds() {
        let mut sink = NullPointer;
        assert!(sink.jiggle(1).is_ok());
        assert!(sink.jiggle(-32).is_ok());
    }
}
