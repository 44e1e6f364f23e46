use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Request-level failures. Only these reach the caller of the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not extract a video id from: {0}")]
    InvalidReference(String),

    #[error("{}", describe_unavailable(.failures))]
    TranscriptUnavailable { failures: Vec<SourceFailure> },

    #[error("transcript contains no usable text")]
    EmptyTranscript,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Why one caption source did not produce a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CaptionError {
    #[error("captions are disabled for this video")]
    CaptionsDisabled,

    #[error("no transcript found in the requested languages")]
    NoTranscriptFound,

    #[error("caption service error: {0}")]
    ServiceError(String),

    #[error("subtitle download failed: {0}")]
    ToolFailure(String),

    #[error("could not parse downloaded subtitle data: {0}")]
    ParseFailure(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("source returned an empty transcript")]
    EmptyTranscript,
}

impl From<reqwest::Error> for CaptionError {
    fn from(e: reqwest::Error) -> Self {
        CaptionError::ServiceError(e.to_string())
    }
}

/// A single entry in the diagnostics carried by [`Error::TranscriptUnavailable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: CaptionError,
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Lead sentence for an exhausted fallback chain, chosen from what went wrong.
///
/// Unreadable subtitle data outranks transport trouble, which outranks plain
/// absence of captions.
fn headline(failures: &[SourceFailure]) -> &'static str {
    let any = |pred: fn(&CaptionError) -> bool| failures.iter().any(|f| pred(&f.reason));
    if failures.is_empty() {
        "no caption sources configured"
    } else if any(|r| matches!(r, CaptionError::ParseFailure(_))) {
        "could not parse downloaded subtitle data"
    } else if any(|r| {
        matches!(
            r,
            CaptionError::ServiceError(_) | CaptionError::ToolFailure(_) | CaptionError::Timeout(_)
        )
    }) {
        "could not fetch captions for this video"
    } else {
        "no captions available for this video"
    }
}

fn describe_unavailable(failures: &[SourceFailure]) -> String {
    if failures.is_empty() {
        return headline(failures).to_string();
    }
    let reasons = failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ");
    format!("{} ({reasons})", headline(failures))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizerError {
    #[error("summarization service not configured: {0}")]
    Unavailable(String),

    #[error("summarization service failed: {0}")]
    Service(String),

    #[error("summarization service timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for SummarizerError {
    fn from(e: reqwest::Error) -> Self {
        SummarizerError::Service(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_unavailable_lists_every_source() {
        let err = Error::TranscriptUnavailable {
            failures: vec![
                SourceFailure {
                    source: "direct-captions".to_string(),
                    reason: CaptionError::NoTranscriptFound,
                },
                SourceFailure {
                    source: "subtitle-download".to_string(),
                    reason: CaptionError::ParseFailure("no cues".to_string()),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("could not parse downloaded subtitle data ("));
        assert!(msg.contains("direct-captions: no transcript found"));
        assert!(msg.contains("subtitle-download: could not parse downloaded subtitle data: no cues"));
    }

    fn unavailable(reasons: Vec<CaptionError>) -> String {
        let failures = reasons
            .into_iter()
            .map(|reason| SourceFailure {
                source: "src".to_string(),
                reason,
            })
            .collect();
        Error::TranscriptUnavailable { failures }.to_string()
    }

    #[test]
    fn test_headline_follows_failure_kinds() {
        assert!(
            unavailable(vec![CaptionError::CaptionsDisabled, CaptionError::EmptyTranscript])
                .starts_with("no captions available for this video")
        );
        assert!(
            unavailable(vec![CaptionError::ParseFailure("no cues".to_string())])
                .starts_with("could not parse downloaded subtitle data")
        );
        assert!(
            unavailable(vec![
                CaptionError::NoTranscriptFound,
                CaptionError::Timeout(Duration::from_secs(60)),
            ])
            .starts_with("could not fetch captions for this video")
        );
        assert_eq!(unavailable(vec![]), "no caption sources configured");
    }

    #[test]
    fn test_timeout_keeps_sub_second_precision() {
        assert_eq!(CaptionError::Timeout(Duration::from_millis(250)).to_string(), "timed out after 250ms");
        assert_eq!(CaptionError::Timeout(Duration::from_secs(60)).to_string(), "timed out after 60s");
        assert_eq!(
            SummarizerError::Timeout(Duration::from_millis(1500)).to_string(),
            "summarization service timed out after 1.5s"
        );
    }

    #[test]
    fn test_caption_error_serializes_tagged() {
        let json = serde_json::to_value(CaptionError::ParseFailure("no cues".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "parse_failure", "detail": "no cues"}));
        let json = serde_json::to_value(CaptionError::CaptionsDisabled).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "captions_disabled"}));
    }
}
