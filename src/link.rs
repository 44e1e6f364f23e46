use std::path::PathBuf;

use serde::Serialize;

use crate::timestamp::format_clock;

pub const DEFAULT_EMBED_BASE_URL: &str = "https://www.youtube.com/embed";

/// Where the video is being played
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackContext {
    /// The hosting platform's embeddable player
    Hosted { canonical_id: String },
    /// A file the caller can seek in directly
    Local { file_path: PathBuf },
}

/// How to jump to a moment in the video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationAction {
    DeepLink { url: String, seconds: u64, clock: String },
    Seek { file_path: PathBuf, seconds: u64, clock: String },
}

impl NavigationAction {
    pub fn seconds(&self) -> u64 {
        match self {
            NavigationAction::DeepLink { seconds, .. } | NavigationAction::Seek { seconds, .. } => *seconds,
        }
    }

    pub fn clock(&self) -> &str {
        match self {
            NavigationAction::DeepLink { clock, .. } | NavigationAction::Seek { clock, .. } => clock,
        }
    }
}

impl std::fmt::Display for NavigationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationAction::DeepLink { url, .. } => write!(f, "{url}"),
            NavigationAction::Seek { file_path, seconds, .. } => {
                write!(f, "seek {} to {seconds}s", file_path.display())
            }
        }
    }
}

/// Turns offsets into navigation actions for one playback context
#[derive(Debug, Clone)]
pub struct TimestampLinker {
    embed_base_url: String,
}

impl Default for TimestampLinker {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_BASE_URL)
    }
}

impl TimestampLinker {
    pub fn new(embed_base_url: impl Into<String>) -> Self {
        Self {
            embed_base_url: embed_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn link(&self, start: f64, context: &PlaybackContext) -> NavigationAction {
        let seconds = whole_seconds(start);
        let clock = format_clock(seconds);
        match context {
            PlaybackContext::Hosted { canonical_id } => NavigationAction::DeepLink {
                url: format!("{}/{canonical_id}?start={seconds}&autoplay=1", self.embed_base_url),
                seconds,
                clock,
            },
            PlaybackContext::Local { file_path } => NavigationAction::Seek {
                file_path: file_path.clone(),
                seconds,
                clock,
            },
        }
    }
}

fn whole_seconds(offset: f64) -> u64 {
    if offset.is_finite() && offset > 0.0 {
        offset.floor() as u64
    } else {
        0
    }
}
