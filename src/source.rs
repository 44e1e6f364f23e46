use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Transcript;
use crate::error::CaptionError;

/// What to do when no transcript exists in any preferred language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguagePolicy {
    /// Use whatever language the video has
    #[default]
    AnyAvailable,
    /// Report `NoTranscriptFound` instead of switching language
    PreferredOnly,
}

/// A place a transcript can come from.
///
/// Implementations return their typed failure instead of retrying; the
/// acquirer decides whether to move on to the next source.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &'static str;

    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript, CaptionError>;
}

/// Pick the index of the best candidate language.
///
/// Preferences are tried in order; an exact code match wins over a regional
/// variant (`en` accepts `en-US`). Falls back to the first candidate only under
/// [`LanguagePolicy::AnyAvailable`].
pub fn pick_language<S: AsRef<str>>(candidates: &[S], preferences: &[String], policy: LanguagePolicy) -> Option<usize> {
    for pref in preferences {
        let pref = pref.to_ascii_lowercase();
        if let Some(i) = candidates.iter().position(|c| c.as_ref().eq_ignore_ascii_case(&pref)) {
            return Some(i);
        }
        if let Some(i) = candidates.iter().position(|c| {
            let c = c.as_ref().to_ascii_lowercase();
            c.split(['-', '_']).next() == Some(pref.as_str())
        }) {
            return Some(i);
        }
    }
    match policy {
        LanguagePolicy::AnyAvailable if !candidates.is_empty() => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(langs: &[&str]) -> Vec<String> {
        langs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_language_in_preference_order() {
        let candidates = ["de", "fr", "en"];
        assert_eq!(pick_language(&candidates, &prefs(&["fr", "en"]), LanguagePolicy::PreferredOnly), Some(1));
        assert_eq!(pick_language(&candidates, &prefs(&["ja", "en"]), LanguagePolicy::PreferredOnly), Some(2));
    }

    #[test]
    fn test_pick_language_regional_variant() {
        let candidates = ["en-GB", "en"];
        assert_eq!(pick_language(&candidates, &prefs(&["en"]), LanguagePolicy::PreferredOnly), Some(1));
        let candidates = ["pt-BR"];
        assert_eq!(pick_language(&candidates, &prefs(&["pt"]), LanguagePolicy::PreferredOnly), Some(0));
    }

    #[test]
    fn test_pick_language_policy() {
        let candidates = ["ta", "hi"];
        assert_eq!(pick_language(&candidates, &prefs(&["en"]), LanguagePolicy::PreferredOnly), None);
        assert_eq!(pick_language(&candidates, &prefs(&["en"]), LanguagePolicy::AnyAvailable), Some(0));
        let none: [&str; 0] = [];
        assert_eq!(pick_language(&none, &prefs(&["en"]), LanguagePolicy::AnyAvailable), None);
    }

    #[test]
    fn test_policy_deserializes_kebab_case() {
        #[derive(Deserialize)]
        struct Wrap {
            policy: LanguagePolicy,
        }
        let w: Wrap = toml::from_str(r#"policy = "preferred-only""#).unwrap();
        assert_eq!(w.policy, LanguagePolicy::PreferredOnly);
    }
}
