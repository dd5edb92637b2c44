//! Input activity observation via XInput2 raw events.
//!
//! Selects raw motion, button, and key events on the root window and feeds
//! every one into the activity tracker from a dedicated thread. Raw events
//! are delivered regardless of which window has focus, so no grab is needed.

use crate::activity::ActivityTracker;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xinput::{self, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;

/// How long the watcher thread sleeps between event batches while checking
/// for shutdown.
const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// Owns the observation connection and thread.
///
/// Dropping the connection on thread exit unregisters the event selection,
/// so no hook outlives the process.
pub struct InputWatcher {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputWatcher {
    /// Connect to the X server, select raw input events, and start the
    /// observation thread.
    pub fn start(tracker: Arc<ActivityTracker>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X display")?;
        let root = conn.setup().roots[screen_num].root;

        conn.xinput_xi_query_version(2, 0)
            .context("XInput2 version request failed")?
            .reply()
            .context("XInput2 not supported by this server")?;

        let mask = xinput::XIEventMask::RAW_MOTION
            | xinput::XIEventMask::RAW_BUTTON_PRESS
            | xinput::XIEventMask::RAW_KEY_PRESS
            | xinput::XIEventMask::RAW_KEY_RELEASE;
        conn.xinput_xi_select_events(
            root,
            &[xinput::EventMask {
                deviceid: xinput::Device::ALL.into(),
                mask: vec![mask],
            }],
        )
        .context("Failed to select raw input events")?
        .check()
        .context("Raw input event selection rejected by server")?;
        conn.flush().context("Failed to flush event selection")?;

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name("input-watcher".to_string())
            .spawn(move || watch_loop(&conn, &tracker, &flag))
            .context("Failed to spawn input watcher thread")?;

        info!("Input watcher started (raw motion/button/key events)");
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the observation thread and wait for it to release its resources.
    pub fn shutdown(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Input watcher thread panicked during shutdown");
            }
        }
        debug!("Input watcher stopped");
    }
}

/// Drain pending events, record activity, sleep, repeat until told to stop.
fn watch_loop(conn: &RustConnection, tracker: &ActivityTracker, running: &AtomicBool) {
    while running.load(Ordering::Relaxed) {
        loop {
            match conn.poll_for_event() {
                Ok(Some(event)) => {
                    if is_input_event(&event) {
                        trace!("Input activity observed");
                        tracker.record_activity(Instant::now());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Input watcher connection lost: {e}");
                    return;
                }
            }
        }
        thread::sleep(DRAIN_INTERVAL);
    }
}

fn is_input_event(event: &Event) -> bool {
    matches!(
        event,
        Event::XinputRawMotion(_)
            | Event::XinputRawButtonPress(_)
            | Event::XinputRawKeyPress(_)
            | Event::XinputRawKeyRelease(_)
    )
}
