use crate::{Highlight, NormalizedTranscript};

pub const DEFAULT_HIGHLIGHT_COUNT: usize = 5;
pub const DEFAULT_EXCERPT_CHARS: usize = 120;
pub const DEFAULT_LABELS: &[&str] = &["Introduction", "Main Topic", "Example", "Insight", "Conclusion"];

/// Splits a transcript into chronological, labeled key moments
#[derive(Debug, Clone)]
pub struct HighlightSegmenter {
    count: usize,
    labels: Vec<String>,
    excerpt_chars: usize,
}

impl Default for HighlightSegmenter {
    fn default() -> Self {
        Self::new(
            DEFAULT_HIGHLIGHT_COUNT,
            DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            DEFAULT_EXCERPT_CHARS,
        )
    }
}

impl HighlightSegmenter {
    pub fn new(count: usize, labels: Vec<String>, excerpt_chars: usize) -> Self {
        Self {
            count,
            labels,
            excerpt_chars,
        }
    }

    /// Same labels and excerpt length, different number of highlights.
    pub fn with_count(&self, count: usize) -> Self {
        Self {
            count,
            ..self.clone()
        }
    }

    /// Produce `min(count, segments)` highlights ordered by start offset.
    ///
    /// Buckets are contiguous and differ in size by at most one segment; the
    /// earlier buckets take the remainder. Fixed `ceil(n / count)` chunks are not
    /// used because they can come up short (6 segments in chunks of 2 give 3
    /// highlights where 5 were asked for).
    pub fn segment(&self, transcript: &NormalizedTranscript) -> Vec<Highlight> {
        let segments = &transcript.segments;
        let n = segments.len();
        let k = self.count.min(n);
        if k == 0 {
            return Vec::new();
        }

        let base = n / k;
        let extra = n % k;
        let mut highlights = Vec::with_capacity(k);
        let mut start = 0;

        for i in 0..k {
            let len = base + usize::from(i < extra);
            let bucket = &segments[start..start + len];
            start += len;

            let text = bucket.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
            highlights.push(Highlight {
                start: bucket[0].start,
                label: self.label(i),
                excerpt: truncate_at_word(&text, self.excerpt_chars),
            });
        }

        highlights
    }

    fn label(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Section {}", index + 1))
    }
}

/// Shorten `text` to at most `max_chars` characters, cutting at a word boundary.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    const ELLIPSIS: &str = "...";
    let budget = max_chars.saturating_sub(ELLIPSIS.len());
    let cut = text.char_indices().nth(budget).map_or(text.len(), |(i, _)| i);
    let head = &text[..cut];

    // Back up to the last whole word unless the cut already landed on a boundary
    let head = if text[cut..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(i) if i > 0 => &head[..i],
            _ => head,
        }
    };
    format!("{}{ELLIPSIS}", head.trim_end())
}
