//! In-memory enumeration layer for tests.

use crate::platform::types::{ProcessInfo, WindowHandle, WindowSystem};
use std::collections::HashMap;

/// A scripted window/process layout.
#[derive(Debug, Default)]
pub struct FakeSystem {
    pub foreground: Option<WindowHandle>,
    pub titles: HashMap<isize, String>,
    pub classes: HashMap<isize, String>,
    pub owners: HashMap<isize, u32>,
    pub process_names: HashMap<u32, String>,
    pub uptime: Option<f64>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process by pid and executable name.
    pub fn add_process(&mut self, pid: u32, name: &str) {
        self.process_names.insert(pid, name.to_string());
    }

    /// Register a top-level window owned by `pid`.
    pub fn add_window(&mut self, handle: isize, pid: u32, title: &str) {
        self.titles.insert(handle, title.to_string());
        self.owners.insert(handle, pid);
    }

    pub fn set_class(&mut self, handle: isize, class: &str) {
        self.classes.insert(handle, class.to_string());
    }

    pub fn focus(&mut self, handle: isize) {
        self.foreground = Some(WindowHandle(handle));
    }
}

impl WindowSystem for FakeSystem {
    fn foreground_window(&self) -> Option<WindowHandle> {
        self.foreground
    }

    fn window_title(&self, window: WindowHandle) -> String {
        self.titles.get(&window.0).cloned().unwrap_or_default()
    }

    fn window_class(&self, window: WindowHandle) -> String {
        self.classes.get(&window.0).cloned().unwrap_or_default()
    }

    fn window_owner_pid(&self, window: WindowHandle) -> Option<u32> {
        self.owners.get(&window.0).copied()
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        self.process_names.get(&pid).cloned()
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        let mut processes: Vec<ProcessInfo> = self
            .process_names
            .iter()
            .map(|(pid, name)| ProcessInfo {
                pid: *pid,
                name: name.clone(),
            })
            .collect();
        processes.sort_by_key(|p| p.pid);
        processes
    }

    fn process_windows(&self, pid: u32) -> Vec<WindowHandle> {
        let mut windows: Vec<WindowHandle> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == pid)
            .map(|(handle, _)| WindowHandle(*handle))
            .collect();
        windows.sort();
        windows
    }

    fn uptime_seconds(&self) -> Option<f64> {
        self.uptime
    }
}
