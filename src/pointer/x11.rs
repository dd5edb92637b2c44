//! X11 pointer backend.
//!
//! Uses the core-protocol `WarpPointer` request with a null source window,
//! which moves the pointer relative to its current position.

use super::{PointerError, PointerSink};
use std::thread;
use std::time::Duration;
use tracing::{info, trace};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::ConnectionExt as _;
use x11rb::rust_connection::RustConnection;

/// Pause between the outbound and return motions, so the server registers
/// two distinct movements.
const RETURN_DELAY: Duration = Duration::from_millis(50);

/// Pointer motion via an X server connection.
pub struct X11Pointer {
    conn: RustConnection,
}

impl X11Pointer {
    /// Connect to the display named by `DISPLAY`.
    pub fn connect() -> Result<Self, PointerError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| PointerError::ConnectionFailed(e.to_string()))?;
        info!("Connected to X display (screen {screen_num})");
        Ok(Self { conn })
    }

    fn warp_relative(&self, dx: i16, dy: i16) -> Result<(), PointerError> {
        self.conn
            .warp_pointer(x11rb::NONE, x11rb::NONE, 0, 0, 0, 0, dx, dy)
            .map_err(|e| PointerError::MotionFailed(e.to_string()))?;
        self.conn
            .flush()
            .map_err(|e| PointerError::MotionFailed(e.to_string()))?;
        Ok(())
    }
}

impl PointerSink for X11Pointer {
    fn jiggle(&mut self, dx: i16) -> Result<(), PointerError> {
        trace!("Warping pointer by ({dx}, 0) and back");
        self.warp_relative(dx, 0)?;
        thread::sleep(RETURN_DELAY);
        self.warp_relative(-dx, 0)?;
        Ok(())
    }
}
