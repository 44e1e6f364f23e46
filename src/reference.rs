use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::error::Error;

/// Query parameters added by share buttons and ad trackers. They never carry the id.
const TRACKING_PARAMS: &[&str] = &["si", "feature", "pp", "ab_channel", "fbclid", "gclid"];

/// A resolved video reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReference {
    pub raw_input: String,
    pub canonical_id: String,
}

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid regex"));

// Order matters: the first shape that matches wins.
static SHAPES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("watch", r"youtube\.com/watch\?(?:.*&)?v=([a-zA-Z0-9_-]{11})(?:[&#]|$)"),
        ("short", r"youtu\.be/([a-zA-Z0-9_-]{11})(?:[?&#/]|$)"),
        ("embed", r"youtube(?:-nocookie)?\.com/embed/([a-zA-Z0-9_-]{11})(?:[?&#/]|$)"),
        ("shorts", r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})(?:[?&#/]|$)"),
        ("live", r"youtube\.com/live/([a-zA-Z0-9_-]{11})(?:[?&#/]|$)"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// Extract the canonical id from any supported reference shape.
pub fn resolve(input: &str) -> Result<VideoReference, Error> {
    let trimmed = input.trim();
    let cleaned = strip_tracking_params(trimmed);

    let canonical_id = if BARE_ID.is_match(&cleaned) {
        debug!("Reference is a bare id: {cleaned}");
        Some(cleaned.clone())
    } else {
        SHAPES.iter().find_map(|(name, re)| {
            re.captures(&cleaned).map(|caps| {
                debug!("Reference matched {name} link");
                caps[1].to_string()
            })
        })
    };

    canonical_id
        .map(|canonical_id| VideoReference {
            raw_input: input.to_string(),
            canonical_id,
        })
        .ok_or_else(|| Error::InvalidReference(input.to_string()))
}

/// Remove tracking parameters, keeping every other parameter in its original order.
fn strip_tracking_params(input: &str) -> String {
    let Some((base, query)) = input.split_once('?') else {
        return input.to_string();
    };
    let (query, fragment) = match query.split_once('#') {
        Some((q, f)) => (q, Some(f)),
        None => (query, None),
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            !(TRACKING_PARAMS.contains(&key) || key.starts_with("utm_"))
        })
        .collect();

    let mut out = base.to_string();
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
