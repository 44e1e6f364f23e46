use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error::Error;
use crate::{CaptionSegment, NormalizedTranscript, Transcript};

/// Longest phrase (in words) checked for back-to-back repetition.
const MAX_REPEAT_PHRASE: usize = 4;

// Markup and caption artifacts that carry no spoken text
static NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"<[^>]*>",
        r"\{\\[^}]*\}",
        r"\b(?:align|position|line|size|region|vertical):\S+",
        r"\d+:\d{2}(?::\d{2})?[.,]\d{3}\s*-->\s*\d+:\d{2}(?::\d{2})?[.,]\d{3}",
        r"\[\d{1,2}:\d{2}(?::\d{2})?(?:[.,]\d{1,3})?\]",
        r"(?i)\[(?:music|applause|laughter|inaudible|silence|noise)\]",
        r"[♪♫]+",
        r">>",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Cleans caption text and drops near-duplicate consecutive segments.
///
/// Every step is idempotent, so normalizing already normalized output is a no-op.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    similarity_threshold: f64,
}

impl TextNormalizer {
    pub fn new(similarity_threshold: f64) -> Self {
        Self { similarity_threshold }
    }

    pub fn normalize(&self, transcript: &Transcript) -> Result<NormalizedTranscript, Error> {
        self.normalize_segments(&transcript.segments)
    }

    pub fn normalize_segments(&self, segments: &[CaptionSegment]) -> Result<NormalizedTranscript, Error> {
        if segments.is_empty() {
            return Err(Error::EmptyTranscript);
        }

        let mut retained: Vec<CaptionSegment> = Vec::with_capacity(segments.len());
        let mut last_key = String::new();
        let mut dropped = 0usize;

        for segment in segments {
            let text = clean_text(&segment.text);
            let key = comparison_key(&text);
            if key.is_empty() {
                dropped += 1;
                continue;
            }
            if !retained.is_empty() && similarity(&last_key, &key) > self.similarity_threshold {
                dropped += 1;
                continue;
            }
            retained.push(CaptionSegment {
                start: segment.start,
                duration: segment.duration,
                text,
            });
            last_key = key;
        }

        if retained.is_empty() {
            return Err(Error::EmptyTranscript);
        }
        debug!("Normalized {} segments, dropped {dropped}", segments.len());

        let full_text = retained.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
        Ok(NormalizedTranscript {
            segments: retained,
            full_text,
        })
    }
}

/// Similarity ratio in `[0, 1]` between two comparison keys.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Noise stripping and repeat collapsing, alternated until neither changes the text.
///
/// Collapsing a repeat can join tokens into a new noise match, e.g.
/// `1:00.000 1:00.000! --> 2:00.000`, so one pass of each is not enough.
fn clean_text(text: &str) -> String {
    let mut current = collapse_repeats(&strip_noise(text));
    loop {
        let next = collapse_repeats(&strip_noise(&current));
        if next == current {
            return next;
        }
        current = next;
    }
}

fn strip_noise(text: &str) -> String {
    let mut current = squash_whitespace(text);
    // Repeat until no pattern matches what the previous pass left behind
    loop {
        let mut next = current.clone();
        for re in NOISE.iter() {
            next = re.replace_all(&next, " ").into_owned();
        }
        let next = squash_whitespace(&next);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn collapse_repeats(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    loop {
        let mut changed = false;
        for n in 1..=MAX_REPEAT_PHRASE {
            let mut i = 0;
            while i + 2 * n <= words.len() {
                if phrase_eq(&words[i..i + n], &words[i + n..i + 2 * n]) {
                    words.drain(i + n..i + 2 * n);
                    changed = true;
                } else {
                    i += 1;
                }
            }
        }
        if !changed {
            return words.join(" ");
        }
    }
}

fn phrase_eq(a: &[&str], b: &[&str]) -> bool {
    a.iter().zip(b).all(|(x, y)| {
        let (x, y) = (word_core(x), word_core(y));
        !x.is_empty() && x == y
    })
}

fn word_core(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

fn comparison_key(text: &str) -> String {
    text.split_whitespace()
        .map(word_core)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceKind;

    fn seg(start: f64, text: &str) -> CaptionSegment {
        CaptionSegment::new(start, Some(1.0), text)
    }

    fn transcript(segments: Vec<CaptionSegment>) -> Transcript {
        Transcript::new("dQw4w9WgXcQ", Some("en".to_string()), SourceKind::DirectService, segments)
    }

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(0.85)
    }

    #[test]
    fn test_strip_noise() {
        assert_eq!(strip_noise("<i>hello</i>   <c.blue>there</c>"), "hello there");
        assert_eq!(strip_noise("[Music] ♪ la la ♪"), "la la");
        assert_eq!(strip_noise("[00:01:02] so align:start we begin"), "so we begin");
        assert_eq!(strip_noise(">> speaker two"), "speaker two");
    }

    #[test]
    fn test_collapse_repeated_words() {
        assert_eq!(collapse_repeats("the the the cat"), "the cat");
        assert_eq!(collapse_repeats("I I think so"), "I think so");
        assert_eq!(collapse_repeats("you know you know it works"), "you know it works");
        assert_eq!(collapse_repeats("Go go, GO now"), "Go now");
        assert_eq!(collapse_repeats("no repeats here"), "no repeats here");
    }

    #[test]
    fn test_similar_consecutive_segments_drop_the_later() {
        let t = transcript(vec![
            seg(0.0, "welcome back to the channel everyone"),
            seg(1.0, "welcome back to the channel everyone!"),
            seg(2.0, "today we talk about rust"),
        ]);
        let n = normalizer().normalize(&t).unwrap();
        assert_eq!(n.segments.len(), 2);
        assert_eq!(n.segments[0].start, 0.0);
        assert_eq!(n.segments[1].text, "today we talk about rust");
    }

    #[test]
    fn test_dissimilar_segments_both_kept() {
        let t = transcript(vec![
            seg(0.0, "welcome back to the channel"),
            seg(1.0, "today we talk about ownership"),
        ]);
        let n = normalizer().normalize(&t).unwrap();
        assert_eq!(n.segments.len(), 2);
        assert_eq!(n.full_text, "welcome back to the channel today we talk about ownership");
    }

    #[test]
    fn test_only_consecutive_duplicates_removed() {
        let t = transcript(vec![
            seg(0.0, "and that is the key point"),
            seg(1.0, "something else entirely different"),
            seg(2.0, "and that is the key point"),
        ]);
        let n = normalizer().normalize(&t).unwrap();
        assert_eq!(n.segments.len(), 3);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let t = transcript(vec![seg(0.0, "the quick brown fox"), seg(1.0, "the quick brown box")]);
        assert_eq!(TextNormalizer::new(0.99).normalize(&t).unwrap().segments.len(), 2);
        assert_eq!(TextNormalizer::new(0.5).normalize(&t).unwrap().segments.len(), 1);
    }

    #[test]
    fn test_noise_only_segments_dropped() {
        let t = transcript(vec![seg(0.0, "[Music]"), seg(3.0, "hello"), seg(4.0, "<c> </c>")]);
        let n = normalizer().normalize(&t).unwrap();
        assert_eq!(n.segments.len(), 1);
        assert_eq!(n.segments[0].start, 3.0);
    }

    #[test]
    fn test_idempotent() {
        let t = transcript(vec![
            seg(0.0, "<b>so so so</b> today today we"),
            seg(1.5, "so today we"),
            seg(2.0, "[Applause] look at   the the borrow checker"),
            seg(3.0, "look at the borrow checker!!"),
            seg(4.0, "and lifetimes >> and lifetimes"),
            seg(5.0, "which are fine"),
            seg(6.0, "intro words here 1:00.000 1:00.000! --> 2:00.000 keep going"),
        ]);
        let once = normalizer().normalize(&t).unwrap();
        let twice = normalizer().normalize_segments(&once.segments).unwrap();
        assert_eq!(once, twice);
        assert!(once.segments.len() < t.segments.len());
        assert_eq!(once.segments.last().unwrap().text, "intro words here keep going");
    }

    #[test]
    fn test_collapse_exposing_cue_timing_is_stripped() {
        assert_eq!(clean_text("intro 1:00.000 1:00.000! --> 2:00.000 outro"), "intro outro");
        assert_eq!(clean_text("[Music] the the end"), "the end");
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(normalizer().normalize(&transcript(vec![])), Err(Error::EmptyTranscript)));
        assert!(matches!(
            normalizer().normalize(&transcript(vec![seg(0.0, "[Music]")])),
            Err(Error::EmptyTranscript)
        ));
    }
}
