pub mod acquire;
pub mod config;
pub mod error;
pub mod highlight;
pub mod link;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod source;
pub mod subtitle;
pub mod summarize;
pub mod timestamp;
pub mod vtt;
pub mod youtube;

use serde::Serialize;

pub use error::{CaptionError, Error, SourceFailure, SummarizerError};
pub use reference::{VideoReference, resolve};

/// A single captioned segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionSegment {
    pub start: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub text: String,
}

impl CaptionSegment {
    pub fn new(start: f64, duration: Option<f64>, text: impl Into<String>) -> Self {
        Self {
            start: start.max(0.0),
            duration: duration.map(|d| d.max(0.0)),
            text: text.into(),
        }
    }
}

/// Which kind of source produced a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    DirectService,
    DownloadedFile,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::DirectService => write!(f, "caption service"),
            SourceKind::DownloadedFile => write!(f, "downloaded subtitles"),
        }
    }
}

/// Time-aligned transcript for a video
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub language: Option<String>,
    pub source: SourceKind,
    pub segments: Vec<CaptionSegment>,
}

impl Transcript {
    /// Builds a transcript, ordering segments by start offset.
    pub fn new(
        video_id: impl Into<String>,
        language: Option<String>,
        source: SourceKind,
        mut segments: Vec<CaptionSegment>,
    ) -> Self {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self {
            video_id: video_id.into(),
            language,
            source,
            segments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Cleaned transcript, ready for highlight extraction and summarization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTranscript {
    pub segments: Vec<CaptionSegment>,
    pub full_text: String,
}

/// A labeled key moment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub start: f64,
    pub label: String,
    pub excerpt: String,
}
