//! Presence Agent - best-effort "what is the user doing right now" feed.
//!
//! Three independent detectors, each queryable on demand and composed only
//! through the HTTP delivery layer:
//!
//! - **WindowTracker** samples the desktop's foreground window, derives a
//!   display title and owning-process label, and tracks how long the current
//!   title has been active.
//! - **MusicDetector** scans known music players' windows and extracts a
//!   (track, artist) pair with noise and video filtering.
//! - **MobileAppIngester** accepts pushed app-identity payloads from a phone
//!   automation client and latches the last known app; the latch never
//!   expires on its own.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                    Presence Agent                     │
//! ├───────────────────────────────────────────────────────┤
//! │ ┌──────────────┐  ┌───────────────┐  ┌─────────────┐  │
//! │ │WindowTracker │  │ MusicDetector │  │  MobileApp  │  │
//! │ │  (dwell)     │  │  (heuristic)  │  │  Ingester   │  │
//! │ └──────┬───────┘  └───────┬───────┘  └──────┬──────┘  │
//! │        └───────── platform seam ────────────┘         │
//! │                        │                              │
//! │            HTTP snapshots / SSE streams               │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Detection is deliberately best-effort: every OS query failure degrades
//! the affected field to empty/null, and one detector's staleness never
//! blocks sampling of the other two.

pub mod config;
pub mod platform;
pub mod server;
pub mod tracker;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use platform::{Platform, ProcessInfo, WindowHandle, WindowSystem};
pub use tracker::{
    IngestError, IngestStatus, MobileApp, MobileAppIngester, MobileSnapshot, MusicDetector,
    PlaybackSnapshot, PlaybackStatus, WindowSnapshot, WindowTracker,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
