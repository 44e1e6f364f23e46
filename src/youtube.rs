use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::error::CaptionError;
use crate::source::{CaptionSource, LanguagePolicy, pick_language};
use crate::{CaptionSegment, SourceKind, Transcript};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Captions fetched straight from YouTube's InnerTube player API
pub struct DirectCaptionService {
    client: reqwest::Client,
    policy: LanguagePolicy,
}

impl DirectCaptionService {
    pub fn new(client: reqwest::Client, policy: LanguagePolicy) -> Self {
        Self { client, policy }
    }
}

#[async_trait]
impl CaptionSource for DirectCaptionService {
    fn name(&self) -> &'static str {
        "direct-captions"
    }

    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript, CaptionError> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");
        let hl = languages.first().map(String::as_str).unwrap_or("en");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": hl,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let track = select_track(resp, languages, self.policy)?;
        debug!(
            "Using caption track: lang={} generated={}",
            track.language_code,
            track.is_generated()
        );

        // Step 3: Fetch the caption XML
        let caption_xml = self
            .client
            .get(&track.base_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_caption_xml(&caption_xml)?;

        Ok(Transcript::new(
            video_id,
            Some(track.language_code),
            SourceKind::DirectService,
            segments,
        ))
    }
}

fn extract_api_key(html: &str) -> Result<String, CaptionError> {
    let patterns = [r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#, r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#];
    for pattern in patterns {
        let re = Regex::new(pattern).map_err(|e| CaptionError::ServiceError(e.to_string()))?;
        if let Some(caps) = re.captures(html) {
            return Ok(caps[1].to_string());
        }
    }
    Err(CaptionError::ServiceError(
        "could not extract InnerTube API key from watch page".to_string(),
    ))
}

/// Map a player response onto the track to download, or the reason there is none.
fn select_track(
    resp: InnerTubePlayerResponse,
    languages: &[String],
    policy: LanguagePolicy,
) -> Result<CaptionTrack, CaptionError> {
    if let Some(status) = &resp.playability_status {
        match status.status.as_deref() {
            Some("OK") | None => {}
            Some(s) => {
                let reason = status.reason.clone().unwrap_or_else(|| s.to_string());
                return Err(CaptionError::ServiceError(format!("video not playable: {reason}")));
            }
        }
    }

    let renderer = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .ok_or(CaptionError::CaptionsDisabled)?;

    let mut tracks = renderer.caption_tracks.unwrap_or_default();
    if tracks.is_empty() {
        return Err(CaptionError::NoTranscriptFound);
    }

    // Authored tracks ahead of auto-generated ones, otherwise in listing order
    tracks.sort_by_key(CaptionTrack::is_generated);

    let codes: Vec<&str> = tracks.iter().map(|t| t.language_code.as_str()).collect();
    let idx = pick_language(&codes, languages, policy).ok_or(CaptionError::NoTranscriptFound)?;
    Ok(tracks.swap_remove(idx))
}

fn parse_caption_xml(xml: &str) -> Result<Vec<CaptionSegment>, CaptionError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    // (start, duration, text) of the cue being read
    let mut current: Option<(f64, Option<f64>, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if matches!(e.name().as_ref(), b"text" | b"p") => {
                // Legacy tracks use seconds (start/dur), format 3 uses milliseconds (t/d)
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                    match attr.key.as_ref() {
                        b"start" => start = value,
                        b"dur" => dur = value,
                        b"t" => start = value.map(|v| v / 1000.0),
                        b"d" => dur = value.map(|v| v / 1000.0),
                        _ => {}
                    }
                }
                current = start.map(|s| (s, dur, String::new()));
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"br" => {
                if let Some((_, _, text)) = current.as_mut() {
                    text.push(' ');
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, _, text)) = current.as_mut() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    text.push_str(&html_escape::decode_html_entities(&raw_text));
                }
            }
            Ok(Event::End(ref e)) if matches!(e.name().as_ref(), b"text" | b"p") => {
                if let Some((start, duration, text)) = current.take() {
                    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !text.is_empty() {
                        segments.push(CaptionSegment::new(start, duration, text));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CaptionError::ServiceError(format!("error parsing caption XML: {e}"))),
            _ => {}
        }
    }

    Ok(segments)
}
