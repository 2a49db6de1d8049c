//! Foreground window tracking.
//!
//! Samples the desktop's focused window, derives a human display title and
//! owning process label, and tracks how long the current title has been
//! active. Every OS failure degrades the affected field to empty/null; the
//! feed favors liveness over correctness and never raises to the caller.

use crate::platform::WindowSystem;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Title the desktop shell reports when no application window is focused.
const SHELL_PLACEHOLDER_TITLE: &str = "Program Manager";

/// Display title substituted when no meaningful title can be derived.
pub const IDLE_TITLE: &str = "摸鱼～～～";

/// Process label substituted when the owner cannot be resolved.
pub const IDLE_PROCESS: &str = "挂机ing...";

/// One sample of the foreground window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Display title; never raw-empty, the idle label substitutes.
    pub title: String,
    /// Owning process label, or the idle label on resolution failure.
    pub process: String,
    /// Seconds since boot, when the OS reports it.
    pub uptime_secs: Option<f64>,
    /// Seconds the current title has been active; `None` on the sample
    /// immediately after a title change.
    pub dwell_secs: Option<f64>,
}

impl WindowSnapshot {
    fn empty() -> Self {
        Self {
            title: String::new(),
            process: String::new(),
            uptime_secs: None,
            dwell_secs: None,
        }
    }
}

/// The single `(title, activation time)` latch behind dwell tracking.
///
/// There is no history of prior titles; the latch is overwritten wholesale
/// whenever the derived title changes.
#[derive(Debug, Default)]
struct FocusLatch {
    current: Option<(String, Instant)>,
}

impl FocusLatch {
    /// Record a sample of `title` at `now` and return the dwell duration,
    /// or `None` when the title just changed.
    fn observe(&mut self, title: &str, now: Instant) -> Option<Duration> {
        match &self.current {
            Some((held, activated)) if held == title => Some(now.duration_since(*activated)),
            _ => {
                self.current = Some((title.to_string(), now));
                None
            }
        }
    }
}

/// Samples the OS foreground window into [`WindowSnapshot`]s.
pub struct WindowTracker<S: WindowSystem> {
    system: Arc<S>,
    latch: Mutex<FocusLatch>,
}

impl<S: WindowSystem> WindowTracker<S> {
    pub fn new(system: Arc<S>) -> Self {
        Self {
            system,
            latch: Mutex::new(FocusLatch::default()),
        }
    }

    /// Sample the current foreground window. Never errors: OS query failure
    /// yields empty/null fields instead.
    pub fn sample(&self) -> WindowSnapshot {
        let Some(window) = self.system.foreground_window() else {
            return WindowSnapshot::empty();
        };

        let raw_title = self.system.window_title(window);
        let process_name = self
            .system
            .window_owner_pid(window)
            .and_then(|pid| self.system.process_name(pid));

        let title = derive_title(&raw_title);
        let process = derive_process_label(process_name.as_deref(), &raw_title);
        let uptime_secs = self.system.uptime_seconds();

        let dwell_secs = self
            .latch
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .observe(&title, Instant::now())
            .map(|d| d.as_secs_f64());

        WindowSnapshot {
            title,
            process,
            uptime_secs,
            dwell_secs,
        }
    }
}

/// Final path component, treating both `/` and `\` as separators.
fn basename(s: &str) -> &str {
    s.rsplit(['/', '\\']).next().unwrap_or(s)
}

/// Drop a trailing `.ext` suffix, keeping leading-dot names intact.
fn strip_extension(s: &str) -> &str {
    if let Some(dot) = s.rfind('.') {
        if dot > 0 && !s[..dot].chars().all(|c| c == '.') {
            return &s[..dot];
        }
    }
    s
}

/// Derive the display title from a raw window title.
fn derive_title(raw: &str) -> String {
    if raw == SHELL_PLACEHOLDER_TITLE {
        return IDLE_TITLE.to_string();
    }

    let mut title = basename(raw);
    if let Some((left, _)) = title.split_once(" - ") {
        title = left;
    }
    let title = strip_extension(title).trim();

    if title.is_empty() {
        IDLE_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Derive the owning-process label from the resolved executable name.
fn derive_process_label(resolved: Option<&str>, raw_title: &str) -> String {
    let name = resolved.map(basename).unwrap_or_default().trim();
    if raw_title == SHELL_PLACEHOLDER_TITLE || name.is_empty() {
        IDLE_PROCESS.to_string()
    } else {
        name.to_string()
    }
}
