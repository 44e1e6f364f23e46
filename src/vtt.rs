//! WebVTT cue parsing for downloaded subtitle files.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::CaptionSegment;
use crate::error::CaptionError;
use crate::timestamp::parse_cue_time;

static TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})\s+-->\s+((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})")
        .expect("valid regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\\[^}]*\}|\b(?:align|position|line|size|region|vertical):\S+").expect("valid regex")
});

/// Parse WebVTT content into caption segments.
///
/// Blocks without a timing line (header metadata, `NOTE`, `STYLE`, `REGION`) are ignored,
/// as are cues whose text is empty once markup is removed and cues with unreadable
/// timings. Fails when the content holds no cue with a readable timing line.
pub fn parse(content: &str) -> Result<Vec<CaptionSegment>, CaptionError> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");
    let body = match content.split_once('\n') {
        Some((first, rest)) if first.trim_start().starts_with("WEBVTT") => rest,
        None if content.trim_start().starts_with("WEBVTT") => "",
        _ => content.as_str(),
    };

    let mut segments = Vec::new();
    let mut timed_blocks = 0usize;
    let mut valid_timings = 0usize;

    for block in body.split("\n\n") {
        let lines: Vec<&str> = block.lines().collect();
        let Some(timing_idx) = lines.iter().position(|l| TIMING.is_match(l)) else {
            continue;
        };
        timed_blocks += 1;

        let Some(caps) = TIMING.captures(lines[timing_idx]) else {
            continue;
        };
        let (Some(start), Some(end)) = (parse_cue_time(&caps[1]), parse_cue_time(&caps[2])) else {
            debug!("Skipping cue with invalid timing: {}", lines[timing_idx]);
            continue;
        };
        valid_timings += 1;

        let text = lines[timing_idx + 1..]
            .iter()
            .map(|l| clean_cue_text(l))
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            continue;
        }

        segments.push(CaptionSegment::new(
            start as f64,
            Some(end.saturating_sub(start) as f64),
            text,
        ));
    }

    if timed_blocks == 0 {
        return Err(CaptionError::ParseFailure("no cue timing lines found".to_string()));
    }
    if valid_timings == 0 {
        return Err(CaptionError::ParseFailure(format!(
            "none of the {timed_blocks} cue timing lines could be read"
        )));
    }

    debug!("Parsed {} cues from {timed_blocks} timed blocks", segments.len());
    Ok(segments)
}

fn clean_cue_text(line: &str) -> String {
    let without_tags = TAG.replace_all(line, "");
    let without_directives = DIRECTIVE.replace_all(&without_tags, "");
    let decoded = html_escape::decode_html_entities(&without_directives);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
