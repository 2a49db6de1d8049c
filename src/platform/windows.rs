//! Windows implementation of the window/process enumeration seam.
//!
//! Window queries go through the Win32 API (`GetForegroundWindow`,
//! `EnumWindows`, `GetWindowTextW`, `GetClassNameW`); process identity and
//! seconds-since-boot come from `sysinfo`, with `GetTickCount64` as the
//! uptime fallback.

use crate::platform::types::{ProcessInfo, WindowHandle, WindowSystem};
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
use windows::Win32::System::SystemInformation::GetTickCount64;
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId,
};

/// The live Win32-backed enumeration layer.
pub struct Win32System {
    // sysinfo needs &mut to refresh; trait methods take &self.
    system: Mutex<System>,
}

impl Win32System {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for Win32System {
    fn default() -> Self {
        Self::new()
    }
}

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut core::ffi::c_void)
}

fn wide_to_string(buffer: &[u16], copied: i32) -> String {
    if copied <= 0 {
        return String::new();
    }
    OsString::from_wide(&buffer[..copied as usize])
        .to_string_lossy()
        .into_owned()
}

unsafe extern "system" fn collect_windows(handle: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam.0 as *mut Vec<WindowHandle>);
    windows.push(WindowHandle(handle.0 as isize));
    true.into()
}

impl WindowSystem for Win32System {
    fn foreground_window(&self) -> Option<WindowHandle> {
        let handle = unsafe { GetForegroundWindow() };
        if handle.is_invalid() {
            None
        } else {
            Some(WindowHandle(handle.0 as isize))
        }
    }

    fn window_title(&self, window: WindowHandle) -> String {
        unsafe {
            let length = GetWindowTextLengthW(hwnd(window));
            if length <= 0 {
                return String::new();
            }
            let mut buffer = vec![0u16; (length + 1) as usize];
            let copied = GetWindowTextW(hwnd(window), &mut buffer);
            wide_to_string(&buffer, copied)
        }
    }

    fn window_class(&self, window: WindowHandle) -> String {
        unsafe {
            let mut buffer = [0u16; 256];
            let copied = GetClassNameW(hwnd(window), &mut buffer);
            wide_to_string(&buffer, copied)
        }
    }

    fn window_owner_pid(&self, window: WindowHandle) -> Option<u32> {
        let mut pid: u32 = 0;
        unsafe {
            GetWindowThreadProcessId(hwnd(window), Some(&mut pid));
        }
        if pid == 0 {
            None
        } else {
            Some(pid)
        }
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        let mut system = self.system.lock().unwrap_or_else(|p| p.into_inner());
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[Pid::from_u32(pid)]),
            ProcessRefreshKind::everything(),
        );
        system
            .process(Pid::from_u32(pid))
            .map(|p| p.name().to_string_lossy().into_owned())
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        let mut system = self.system.lock().unwrap_or_else(|p| p.into_inner());
        system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::everything());
        let mut processes: Vec<ProcessInfo> = system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessInfo {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
            })
            .collect();
        processes.sort_by_key(|p| p.pid);
        processes
    }

    fn process_windows(&self, pid: u32) -> Vec<WindowHandle> {
        let mut all: Vec<WindowHandle> = Vec::new();
        unsafe {
            let _ = EnumWindows(
                Some(collect_windows),
                LPARAM(&mut all as *mut Vec<WindowHandle> as isize),
            );
        }
        let mut owned: Vec<WindowHandle> = all
            .into_iter()
            .filter(|w| self.window_owner_pid(*w) == Some(pid))
            .collect();
        owned.sort();
        owned
    }

    fn uptime_seconds(&self) -> Option<f64> {
        let uptime = System::uptime();
        if uptime > 0 {
            return Some(uptime as f64);
        }
        let ticks = unsafe { GetTickCount64() };
        if ticks > 0 {
            Some(ticks as f64 / 1000.0)
        } else {
            None
        }
    }
}
