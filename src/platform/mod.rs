//! OS window/process enumeration seam.
//!
//! The trackers only talk to the [`WindowSystem`] trait; the live Win32
//! implementation is selected on Windows, and a noop layer everywhere else so
//! the agent still compiles and serves (with empty/idle snapshots).

pub mod types;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(target_os = "windows"))]
pub mod noop;

#[cfg(test)]
pub mod fake;

pub use types::{ProcessInfo, WindowHandle, WindowSystem};

#[cfg(target_os = "windows")]
pub use windows::Win32System;

/// Platform-agnostic enumeration layer type alias.
#[cfg(target_os = "windows")]
pub type Platform = Win32System;

#[cfg(not(target_os = "windows"))]
pub use noop::NoopSystem;

/// Platform-agnostic enumeration layer type alias.
#[cfg(not(target_os = "windows"))]
pub type Platform = NoopSystem;
