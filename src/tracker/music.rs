//! Playing-track detection from music player windows.
//!
//! Scans known music-player processes' top-level windows, filters out noise
//! and video content, cleans the player branding off the title, and splits
//! the remainder into a (track, artist) pair. Detection is heuristic and
//! best-effort: when nothing qualifies the snapshot is simply idle.

use crate::platform::{WindowHandle, WindowSystem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Executable names (lowercased) of the players we scan.
const MUSIC_PROCESSES: &[&str] = &[
    "cloudmusic.exe",
    "spotify.exe",
    "qqmusic.exe",
    "kwmusic.exe",
    "kugou.exe",
    "coriander_player.exe",
    "itunes.exe",
    "applemusic.exe",
];

/// Substrings marking a player window as showing video, not music.
const VIDEO_KEYWORDS: &[&str] = &[
    "youtube", "bilibili", "video", "电影", "剧集", "预告", "trailer", "mv",
];

/// Titles of non-content windows (input-method indicators, lyric overlays).
const NOISE_TITLES: &[&str] = &["default ime", "msctfime ui", "desktop lyrics", "桌面歌词"];

/// Branding suffixes players append after the track info.
const PLAYER_BRANDING: &[&str] = &[
    "网易云音乐",
    "CloudMusic",
    "QQ音乐",
    "Spotify",
    "酷狗",
    "酷我",
    "Coriander Player",
];

/// Titles shorter than this (in characters) are treated as noise.
const MIN_TITLE_CHARS: usize = 4;

/// The one player we fall back to a known main-window class for.
const CLOUDMUSIC_EXE: &str = "cloudmusic.exe";
const CLOUDMUSIC_MAIN_CLASS: &str = "OrpheusBrowserHost";

/// Whether a track was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Idle,
    Playing,
}

/// One sample of the playing-track heuristic.
///
/// `Idle` implies all content fields are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub title: Option<String>,
    /// May be `Some("")` when the title carried no artist half.
    pub artist: Option<String>,
    /// Executable name of the player the track came from.
    pub source: Option<String>,
}

impl PlaybackSnapshot {
    fn idle() -> Self {
        Self {
            status: PlaybackStatus::Idle,
            title: None,
            artist: None,
            source: None,
        }
    }

    fn playing(title: String, artist: String, source: String) -> Self {
        Self {
            status: PlaybackStatus::Playing,
            title: Some(title),
            artist: Some(artist),
            source: Some(source),
        }
    }
}

/// Detects the currently-playing track from player window titles.
pub struct MusicDetector<S: WindowSystem> {
    system: Arc<S>,
}

impl<S: WindowSystem> MusicDetector<S> {
    pub fn new(system: Arc<S>) -> Self {
        Self { system }
    }

    /// Scan player processes for a qualifying window title.
    ///
    /// Iteration is deterministic (processes by pid, windows by handle) and
    /// the first qualifying match wins.
    pub fn sample(&self) -> PlaybackSnapshot {
        let players = self
            .system
            .processes()
            .into_iter()
            .filter(|p| MUSIC_PROCESSES.contains(&p.name.to_lowercase().as_str()));

        for player in players {
            let exe = player.name.to_lowercase();

            for window in self.system.process_windows(player.pid) {
                let raw = self.system.window_title(window);
                if let Some((title, artist)) = qualify(&raw) {
                    return PlaybackSnapshot::playing(title, artist, exe);
                }
            }

            // CloudMusic sometimes only exposes the track on its main
            // browser-host window, which the top-level pass misses.
            if exe == CLOUDMUSIC_EXE {
                if let Some(window) = self.cloudmusic_main_window(player.pid) {
                    let raw = self.system.window_title(window);
                    let low = raw.to_lowercase();
                    if raw.chars().count() > MIN_TITLE_CHARS
                        && !NOISE_TITLES.contains(&low.as_str())
                    {
                        let (title, artist) = split_title_artist(&strip_branding(&raw));
                        if !title.is_empty() {
                            return PlaybackSnapshot::playing(title, artist, exe);
                        }
                    }
                }
            }
        }

        PlaybackSnapshot::idle()
    }

    fn cloudmusic_main_window(&self, pid: u32) -> Option<WindowHandle> {
        self.system
            .process_windows(pid)
            .into_iter()
            .find(|w| self.system.window_class(*w) == CLOUDMUSIC_MAIN_CLASS)
    }
}

/// Run the full filter + clean + split pipeline on one raw window title.
fn qualify(raw: &str) -> Option<(String, String)> {
    if raw.chars().count() < MIN_TITLE_CHARS {
        return None;
    }
    let low = raw.to_lowercase();
    if NOISE_TITLES.iter().any(|noise| low.contains(noise)) {
        return None;
    }
    if VIDEO_KEYWORDS.iter().any(|keyword| low.contains(keyword)) {
        return None;
    }

    let (title, artist) = split_title_artist(&strip_branding(raw));
    if title.is_empty() {
        None
    } else {
        Some((title, artist))
    }
}

/// Strip a trailing `separator + player branding` suffix, if present.
fn strip_branding(raw: &str) -> String {
    let trimmed = raw.trim();
    for brand in PLAYER_BRANDING {
        if trimmed.len() < brand.len() {
            continue;
        }
        let split = trimmed.len() - brand.len();
        if trimmed.is_char_boundary(split) && trimmed[split..].eq_ignore_ascii_case(brand) {
            let head = trimmed[..split].trim_end();
            let head = head.trim_end_matches(['-', '–', '—']).trim_end();
            return head.to_string();
        }
    }
    trimmed.to_string()
}

/// Split a cleaned title on the last `" - "`.
///
/// The longer trimmed half (by character count) becomes the track title,
/// the shorter the artist; on a tie the left half wins. Track titles run
/// longer than artist names on average.
fn split_title_artist(clean: &str) -> (String, String) {
    match clean.rsplit_once(" - ") {
        Some((left, right)) => {
            let left = left.trim();
            let right = right.trim();
            if left.chars().count() >= right.chars().count() {
                (left.to_string(), right.to_string())
            } else {
                (right.to_string(), left.to_string())
            }
        }
        None => (clean.trim().to_string(), String::new()),
    }
}
