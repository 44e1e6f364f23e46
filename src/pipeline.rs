use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::acquire::TranscriptAcquirer;
use crate::config::PipelineConfig;
use crate::error::{Error, SummarizerError};
use crate::highlight::HighlightSegmenter;
use crate::link::{NavigationAction, PlaybackContext, TimestampLinker};
use crate::normalize::TextNormalizer;
use crate::source::CaptionSource;
use crate::subtitle::SubtitleDownload;
use crate::summarize::{Summarizer, Summary, SummaryOrigin, bound_input, extractive_summary};
use crate::youtube::DirectCaptionService;
use crate::{Highlight, SourceKind, resolve};

/// One video to summarize. Unset fields fall back to the pipeline configuration.
#[derive(Debug, Clone, Default)]
pub struct SummaryRequest {
    pub reference: String,
    pub languages: Option<Vec<String>>,
    pub highlight_count: Option<usize>,
    pub target_language: Option<String>,
    /// Play from this file instead of the hosted player.
    pub local_file: Option<PathBuf>,
}

impl SummaryRequest {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub video_id: String,
    pub source: SourceKind,
    pub language: Option<String>,
    pub playback: PlaybackContext,
    pub summary: Summary,
    pub highlights: Vec<Highlight>,
    pub navigation: Vec<NavigationAction>,
}

/// Caption sources in their fixed fallback order: the caption service, then subtitle download.
pub fn default_sources(
    config: &PipelineConfig,
    client: reqwest::Client,
    downloader: Option<Vec<String>>,
) -> Vec<Arc<dyn CaptionSource>> {
    let mut download = SubtitleDownload::new(config.language_policy);
    if let Some(command) = downloader {
        download = download.with_command(command);
    }
    vec![
        Arc::new(DirectCaptionService::new(client, config.language_policy)),
        Arc::new(download),
    ]
}

/// Resolve → acquire → normalize → {highlights, summary} → navigation.
///
/// Holds no per-request state, so one pipeline can serve concurrent requests.
pub struct Pipeline {
    config: PipelineConfig,
    acquirer: TranscriptAcquirer,
    normalizer: TextNormalizer,
    segmenter: HighlightSegmenter,
    linker: TimestampLinker,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        sources: Vec<Arc<dyn CaptionSource>>,
        summarizer: Option<Arc<dyn Summarizer>>,
    ) -> Result<Self, Error> {
        config.validate()?;
        let acquirer = TranscriptAcquirer::new(sources, config.source_timeout);
        debug!("Caption sources: {:?}", acquirer.source_names());
        Ok(Self {
            acquirer,
            normalizer: TextNormalizer::new(config.similarity_threshold),
            segmenter: HighlightSegmenter::new(
                config.highlight_count,
                config.highlight_labels.clone(),
                config.excerpt_chars,
            ),
            linker: TimestampLinker::new(config.embed_base_url.clone()),
            summarizer,
            config,
        })
    }

    pub async fn run(&self, request: &SummaryRequest) -> Result<SummaryReport, Error> {
        let reference = resolve(&request.reference)?;
        let video_id = reference.canonical_id;
        info!("Summarizing video {video_id}");

        let segmenter = match request.highlight_count {
            Some(0) => return Err(Error::Config("highlight count must be at least 1".to_string())),
            Some(k) => self.segmenter.with_count(k),
            None => self.segmenter.clone(),
        };
        let languages = request
            .languages
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.config.languages);
        let target_language = request
            .target_language
            .as_deref()
            .unwrap_or(&self.config.target_language);

        let transcript = self.acquirer.acquire(&video_id, languages).await?;
        let normalized = self.normalizer.normalize(&transcript)?;

        let (highlights, summary) = tokio::join!(
            async { segmenter.segment(&normalized) },
            self.summarize(&normalized.full_text, target_language)
        );

        let playback = match &request.local_file {
            Some(file_path) => PlaybackContext::Local {
                file_path: file_path.clone(),
            },
            None => PlaybackContext::Hosted {
                canonical_id: video_id.clone(),
            },
        };
        let navigation = highlights.iter().map(|h| self.linker.link(h.start, &playback)).collect();

        Ok(SummaryReport {
            video_id,
            source: transcript.source,
            language: transcript.language,
            playback,
            summary,
            highlights,
            navigation,
        })
    }

    /// Ask the summarization service, degrading to an extractive summary on any failure.
    async fn summarize(&self, full_text: &str, target_language: &str) -> Summary {
        let Some(summarizer) = &self.summarizer else {
            return fallback_summary(full_text, "no summarization service configured");
        };

        let input = bound_input(full_text, self.config.summary_max_chars);
        let timeout = self.config.summarizer_timeout;
        let result = tokio::time::timeout(timeout, summarizer.summarize(input, target_language))
            .await
            .unwrap_or(Err(SummarizerError::Timeout(timeout)));

        match result {
            Ok(text) if !text.trim().is_empty() => Summary {
                text: text.trim().to_string(),
                origin: SummaryOrigin::Model,
            },
            Ok(_) => fallback_summary(full_text, "summarization service returned an empty response"),
            Err(e) => {
                warn!("Summarizer failed, using extractive summary: {e}");
                fallback_summary(full_text, &e.to_string())
            }
        }
    }
}

fn fallback_summary(full_text: &str, reason: &str) -> Summary {
    Summary {
        text: extractive_summary(full_text),
        origin: SummaryOrigin::Extractive(reason.to_string()),
    }
}
