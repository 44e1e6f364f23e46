use async_trait::async_trait;
use log::debug;
use serde::Serialize;

use crate::error::SummarizerError;
use crate::highlight::truncate_at_word;

pub const DEFAULT_MAX_INPUT_CHARS: usize = 12_000;

/// Sentences kept by the extractive fallback.
const FALLBACK_SENTENCES: usize = 3;
/// Used when the transcript has no sentence punctuation at all.
const FALLBACK_CHARS: usize = 800;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes video transcripts. \
Write a short summary of two or three sentences that captures the main point of the video. \
Reply with the summary only.";

/// External text-to-text service used for the prose summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, target_language: &str) -> Result<String, SummarizerError>;
}

/// Where the summary text came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum SummaryOrigin {
    Model,
    Extractive(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub text: String,
    pub origin: SummaryOrigin,
}

impl Summary {
    /// A note for the reader when the summary is not the service's output.
    pub fn notice(&self) -> Option<String> {
        match &self.origin {
            SummaryOrigin::Model => None,
            SummaryOrigin::Extractive(reason) => Some(format!(
                "summary is extract-based because the summarization service failed ({reason})"
            )),
        }
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn bound_input(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// First few sentences of the transcript, used when no service summary is available.
pub fn extractive_summary(full_text: &str) -> String {
    let text = full_text.trim();
    let mut end = None;
    let mut found = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|(_, next)| next.is_whitespace()) {
            found += 1;
            if found == FALLBACK_SENTENCES {
                end = Some(i + c.len_utf8());
                break;
            }
        }
    }

    match end {
        Some(end) => text[..end].to_string(),
        None if found > 0 => text.to_string(),
        None => truncate_at_word(text, FALLBACK_CHARS),
    }
}

/// Hosted LLM APIs the summarizer can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Anthropic,
    OpenAi,
}

impl Provider {
    /// `claude*` models go to Anthropic, everything else to OpenAI.
    fn for_model(model: &str) -> Self {
        if model.starts_with("claude") {
            Provider::Anthropic
        } else {
            Provider::OpenAi
        }
    }

    fn name(self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic",
            Provider::OpenAi => "OpenAI",
        }
    }

    fn api_key_var(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn request(self, client: &reqwest::Client, api_key: &str) -> reqwest::RequestBuilder {
        match self {
            Provider::Anthropic => client
                .post("https://api.anthropic.com/v1/messages")
                .header("x-api-key", api_key)
                .header("anthropic-version", "2023-06-01"),
            Provider::OpenAi => client
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(api_key),
        }
    }

    fn body(self, model: &str, prompt: &Prompt) -> serde_json::Value {
        match self {
            Provider::Anthropic => serde_json::json!({
                "model": model,
                "max_tokens": 1024,
                "system": prompt.system,
                "messages": [{"role": "user", "content": prompt.user}],
            }),
            Provider::OpenAi => serde_json::json!({
                "model": model,
                "messages": [
                    {"role": "system", "content": prompt.system},
                    {"role": "user", "content": prompt.user},
                ],
            }),
        }
    }

    /// Pull the reply text out of a response body; `None` if it is missing or blank.
    fn reply_text(self, json: &serde_json::Value) -> Option<String> {
        let text = match self {
            Provider::Anthropic => json
                .get("content")?
                .as_array()?
                .iter()
                .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|block| block.get("text")?.as_str())
                .collect::<String>(),
            Provider::OpenAi => json
                .pointer("/choices/0/message/content")?
                .as_str()?
                .to_string(),
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// System and user messages for one summary request
#[derive(Debug, Clone, PartialEq, Eq)]
struct Prompt {
    system: String,
    user: String,
}

impl Prompt {
    fn new(transcript: &str, target_language: &str) -> Self {
        Self {
            system: format!("{SYSTEM_PROMPT} Write it in the language whose ISO 639-1 code is \"{target_language}\"."),
            user: format!("Transcript:\n\n{transcript}"),
        }
    }
}

/// Summaries from a hosted LLM (Anthropic for `claude*` models, OpenAI otherwise)
pub struct LlmSummarizer {
    client: reqwest::Client,
    model: String,
}

impl LlmSummarizer {
    pub fn new(client: reqwest::Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, text: &str, target_language: &str) -> Result<String, SummarizerError> {
        let provider = Provider::for_model(&self.model);
        let api_key = std::env::var(provider.api_key_var()).map_err(|_| {
            SummarizerError::Unavailable(format!("{} environment variable not set", provider.api_key_var()))
        })?;

        debug!(
            "Summarizing via {} API with model {} into {target_language}",
            provider.name(),
            self.model
        );

        let resp = provider
            .request(&self.client, &api_key)
            .json(&provider.body(&self.model, &Prompt::new(text, target_language)))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SummarizerError::Service(format!("{} API returned {status}: {body}", provider.name())));
        }

        let json: serde_json::Value = resp.json().await?;
        provider
            .reply_text(&json)
            .ok_or_else(|| SummarizerError::Service(format!("unexpected {} API response format", provider.name())))
    }
}
