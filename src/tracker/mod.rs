//! The three detection/state engines.
//!
//! Each engine exposes a synchronous, bounded sampling or ingestion
//! operation and owns its own latched state; cadence is driven by whoever
//! polls (the delivery layer, a CLI one-shot, a test).

pub mod mobile;
pub mod music;
pub mod window;

pub use mobile::{IngestError, IngestStatus, MobileApp, MobileAppIngester, MobileSnapshot};
pub use music::{MusicDetector, PlaybackSnapshot, PlaybackStatus};
pub use window::{WindowSnapshot, WindowTracker};
