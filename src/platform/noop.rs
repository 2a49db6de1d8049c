//! Non-Windows (noop) implementation of the enumeration seam.
//!
//! This exists so the crate (and binary) can compile and serve on non-Windows
//! targets. It reports no foreground window and no processes, which the
//! trackers degrade into empty/idle snapshots.

use crate::platform::types::{ProcessInfo, WindowHandle, WindowSystem};

/// An enumeration layer that sees nothing.
#[derive(Debug, Default)]
pub struct NoopSystem;

impl NoopSystem {
    pub fn new() -> Self {
        Self
    }
}

impl WindowSystem for NoopSystem {
    fn foreground_window(&self) -> Option<WindowHandle> {
        None
    }

    fn window_title(&self, _window: WindowHandle) -> String {
        String::new()
    }

    fn window_class(&self, _window: WindowHandle) -> String {
        String::new()
    }

    fn window_owner_pid(&self, _window: WindowHandle) -> Option<u32> {
        None
    }

    fn process_name(&self, _pid: u32) -> Option<String> {
        None
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        Vec::new()
    }

    fn process_windows(&self, _pid: u32) -> Vec<WindowHandle> {
        Vec::new()
    }

    fn uptime_seconds(&self) -> Option<f64> {
        None
    }
}
