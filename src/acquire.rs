use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::Transcript;
use crate::error::{CaptionError, Error, SourceFailure};
use crate::source::CaptionSource;

/// Progress through the fallback chain
enum AcquireState {
    NotStarted,
    TryingSource(usize),
    Success(Transcript),
    Exhausted,
}

/// Tries caption sources in order until one yields a non-empty transcript.
pub struct TranscriptAcquirer {
    sources: Vec<Arc<dyn CaptionSource>>,
    timeout: Duration,
}

impl TranscriptAcquirer {
    pub fn new(sources: Vec<Arc<dyn CaptionSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn acquire(&self, video_id: &str, languages: &[String]) -> Result<Transcript, Error> {
        let mut failures = Vec::with_capacity(self.sources.len());
        let mut state = AcquireState::NotStarted;

        loop {
            state = match state {
                AcquireState::NotStarted => AcquireState::TryingSource(0),
                AcquireState::TryingSource(i) if i >= self.sources.len() => AcquireState::Exhausted,
                AcquireState::TryingSource(i) => {
                    let source = &self.sources[i];
                    debug!("Trying caption source {} ({}/{})", source.name(), i + 1, self.sources.len());
                    match self.attempt(source.as_ref(), video_id, languages).await {
                        Ok(transcript) => {
                            info!(
                                "Transcript for {video_id} from {}: {} segments",
                                source.name(),
                                transcript.segments.len()
                            );
                            AcquireState::Success(transcript)
                        }
                        Err(reason) => {
                            warn!("Caption source {} failed for {video_id}: {reason}", source.name());
                            failures.push(SourceFailure {
                                source: source.name().to_string(),
                                reason,
                            });
                            AcquireState::TryingSource(i + 1)
                        }
                    }
                }
                AcquireState::Success(transcript) => return Ok(transcript),
                AcquireState::Exhausted => return Err(Error::TranscriptUnavailable { failures }),
            };
        }
    }

    /// One bounded attempt; empty transcripts and timeouts count as failures.
    async fn attempt(
        &self,
        source: &dyn CaptionSource,
        video_id: &str,
        languages: &[String],
    ) -> Result<Transcript, CaptionError> {
        let transcript = tokio::time::timeout(self.timeout, source.fetch(video_id, languages))
            .await
            .map_err(|_| CaptionError::Timeout(self.timeout))??;
        if transcript.is_empty() {
            return Err(CaptionError::EmptyTranscript);
        }
        Ok(transcript)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{CaptionSegment, SourceKind};

    /// Test double returning a canned result and recording its calls.
    pub(crate) struct StubSource {
        pub name: &'static str,
        pub result: Result<Vec<CaptionSegment>, CaptionError>,
        pub delay: Option<Duration>,
        pub calls: Mutex<Vec<String>>,
    }

    impl StubSource {
        pub fn ok(name: &'static str, segments: Vec<CaptionSegment>) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Ok(segments),
                delay: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn err(name: &'static str, err: CaptionError) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Err(err),
                delay: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn slow(name: &'static str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Ok(vec![CaptionSegment::new(0.0, None, "too late")]),
                delay: Some(delay),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CaptionSource for StubSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, video_id: &str, _languages: &[String]) -> Result<Transcript, CaptionError> {
            self.calls.lock().unwrap().push(video_id.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.result
                .clone()
                .map(|segments| Transcript::new(video_id, Some("en".to_string()), SourceKind::DownloadedFile, segments))
        }
    }

    pub(crate) fn chain(sources: &[&Arc<StubSource>]) -> Vec<Arc<dyn CaptionSource>> {
        sources.iter().map(|s| Arc::clone(s) as Arc<dyn CaptionSource>).collect()
    }

    fn seg(start: f64, text: &str) -> CaptionSegment {
        CaptionSegment::new(start, None, text)
    }

    fn langs() -> Vec<String> {
        vec!["en".to_string()]
    }

    #[tokio::test]
    async fn test_first_source_wins() {
        let direct = StubSource::ok("direct", vec![seg(0.0, "hello")]);
        let download = StubSource::ok("download", vec![seg(0.0, "other")]);
        let acquirer = TranscriptAcquirer::new(chain(&[&direct, &download]), Duration::from_secs(5));

        let t = acquirer.acquire("dQw4w9WgXcQ", &langs()).await.unwrap();
        assert_eq!(t.segments[0].text, "hello");
        assert_eq!(direct.call_count(), 1);
        assert_eq!(download.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_transcript_found_falls_back_to_download() {
        let direct = StubSource::err("direct", CaptionError::NoTranscriptFound);
        let download = StubSource::ok("download", vec![seg(1.0, "from file")]);
        let acquirer = TranscriptAcquirer::new(chain(&[&direct, &download]), Duration::from_secs(5));

        let t = acquirer.acquire("dQw4w9WgXcQ", &langs()).await.unwrap();
        assert_eq!(t.segments[0].text, "from file");
        assert_eq!(direct.call_count(), 1);
        assert_eq!(download.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_advances_chain() {
        let direct = StubSource::ok("direct", vec![]);
        let download = StubSource::ok("download", vec![seg(1.0, "from file")]);
        let acquirer = TranscriptAcquirer::new(chain(&[&direct, &download]), Duration::from_secs(5));

        let t = acquirer.acquire("dQw4w9WgXcQ", &langs()).await.unwrap();
        assert_eq!(t.segments.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_lists_every_failure() {
        let direct = StubSource::err("direct", CaptionError::CaptionsDisabled);
        let download = StubSource::ok("download", vec![]);
        let acquirer = TranscriptAcquirer::new(chain(&[&direct, &download]), Duration::from_secs(5));

        match acquirer.acquire("dQw4w9WgXcQ", &langs()).await {
            Err(Error::TranscriptUnavailable { failures }) => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].source, "direct");
                assert_eq!(failures[0].reason, CaptionError::CaptionsDisabled);
                assert_eq!(failures[1].source, "download");
                assert_eq!(failures[1].reason, CaptionError::EmptyTranscript);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_advances_chain() {
        let direct = StubSource::slow("direct", Duration::from_secs(120));
        let download = StubSource::ok("download", vec![seg(2.0, "quick")]);
        let acquirer = TranscriptAcquirer::new(chain(&[&direct, &download]), Duration::from_secs(10));

        let t = acquirer.acquire("dQw4w9WgXcQ", &langs()).await.unwrap();
        assert_eq!(t.segments[0].text, "quick");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_timeout_is_reported_exactly() {
        let direct = StubSource::slow("direct", Duration::from_secs(5));
        let acquirer = TranscriptAcquirer::new(chain(&[&direct]), Duration::from_millis(250));

        match acquirer.acquire("dQw4w9WgXcQ", &langs()).await {
            Err(Error::TranscriptUnavailable { failures }) => {
                assert_eq!(failures[0].reason, CaptionError::Timeout(Duration::from_millis(250)));
                assert!(failures[0].to_string().ends_with("timed out after 250ms"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_sources() {
        let acquirer = TranscriptAcquirer::new(vec![], Duration::from_secs(1));
        assert!(matches!(
            acquirer.acquire("dQw4w9WgXcQ", &langs()).await,
            Err(Error::TranscriptUnavailable { failures }) if failures.is_empty()
        ));
    }
}
