//! Shared types for the window/process enumeration seam.

/// Opaque handle to a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowHandle(pub isize);

/// A running process as seen by the enumeration layer.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Executable file name, e.g. `cloudmusic.exe`.
    pub name: String,
}

/// Window and process queries the trackers sample from.
///
/// Every method is best-effort: a failed OS call maps to `None` or an empty
/// collection, never an error. Enumeration methods return eagerly collected
/// results in a deterministic order (processes by pid, windows by handle) so
/// first-match detection is stable across samples.
pub trait WindowSystem {
    /// The foreground (focused) top-level window, if any.
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// The window's title text; empty when unavailable.
    fn window_title(&self, window: WindowHandle) -> String;

    /// The window's class name; empty when unavailable.
    fn window_class(&self, window: WindowHandle) -> String;

    /// Pid of the process that owns the window.
    fn window_owner_pid(&self, window: WindowHandle) -> Option<u32>;

    /// Executable file name for a pid.
    fn process_name(&self, pid: u32) -> Option<String>;

    /// All running processes, sorted by pid.
    fn processes(&self) -> Vec<ProcessInfo>;

    /// Top-level windows owned by `pid`, sorted by handle.
    fn process_windows(&self, pid: u32) -> Vec<WindowHandle>;

    /// Seconds since boot, if the OS reports it.
    fn uptime_seconds(&self) -> Option<f64>;
}
