use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, warn};
use tempfile::TempDir;

use crate::error::CaptionError;
use crate::source::{CaptionSource, LanguagePolicy, pick_language};
use crate::{SourceKind, Transcript, vtt};

/// Subtitles fetched with an external downloader (yt-dlp) and parsed from WebVTT
pub struct SubtitleDownload {
    command: Vec<String>,
    policy: LanguagePolicy,
    scratch_root: Option<PathBuf>,
}

impl SubtitleDownload {
    pub fn new(policy: LanguagePolicy) -> Self {
        Self {
            command: vec!["yt-dlp".to_string()],
            policy,
            scratch_root: None,
        }
    }

    /// Use a different downloader invocation, e.g. `["python3", "-m", "yt_dlp"]`.
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    async fn download(&self, url: &str, sub_langs: &str, auto_subs: bool, dir: &Path) -> Result<(), CaptionError> {
        let (program, prefix) = self
            .command
            .split_first()
            .ok_or_else(|| CaptionError::ToolFailure("no subtitle downloader configured".to_string()))?;
        let template = dir.join("%(id)s.%(ext)s");

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(prefix).args(["--skip-download", "--write-sub"]);
        if auto_subs {
            cmd.arg("--write-auto-sub");
        }
        cmd.args(["--sub-langs", sub_langs, "--sub-format", "vtt", "--no-playlist", "--no-warnings", "-o"])
            .arg(&template)
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Downloading subtitles via {program}: langs={sub_langs} auto={auto_subs} url={url}");

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CaptionError::ToolFailure(format!(
                    "{program} not found. Install it to enable subtitle downloads:\n  \
                     pip install yt-dlp\n  \
                     or: brew install yt-dlp"
                )));
            }
            Err(e) => return Err(CaptionError::ToolFailure(format!("failed to run {program}: {e}"))),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
            return Err(CaptionError::ToolFailure(format!("{program} exited with {}: {detail}", output.status)));
        }
        Ok(())
    }
}

#[async_trait]
impl CaptionSource for SubtitleDownload {
    fn name(&self) -> &'static str {
        "subtitle-download"
    }

    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript, CaptionError> {
        let scratch = ScratchDir::new(self.scratch_root.as_deref())
            .map_err(|e| CaptionError::ToolFailure(format!("could not create scratch directory: {e}")))?;
        let url = format!("https://www.youtube.com/watch?v={video_id}");

        let mut files = Vec::new();
        if !languages.is_empty() {
            self.download(&url, &sub_langs_arg(languages), true, scratch.path()).await?;
            files = list_subtitles(scratch.path()).await?;
        }
        if files.is_empty() && self.policy == LanguagePolicy::AnyAvailable {
            debug!("No subtitles in preferred languages for {video_id}, requesting any language");
            self.download(&url, "all", false, scratch.path()).await?;
            files = list_subtitles(scratch.path()).await?;
        }

        let codes: Vec<&str> = files.iter().map(|(_, lang)| lang.as_str()).collect();
        let idx = pick_language(&codes, languages, LanguagePolicy::AnyAvailable).ok_or(CaptionError::NoTranscriptFound)?;
        let (path, lang) = files.swap_remove(idx);
        debug!("Parsing subtitle file {}", path.display());

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CaptionError::ParseFailure(format!("could not read {}: {e}", path.display())))?;
        let segments = vtt::parse(&content)?;

        Ok(Transcript::new(video_id, Some(lang), SourceKind::DownloadedFile, segments))
    }
}

/// Temporary directory removed when dropped, on every exit path.
///
/// Removal failures are logged rather than returned so they never replace the
/// result of the fetch that owned the directory.
struct ScratchDir {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl ScratchDir {
    fn new(root: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vidsum-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!("Created scratch dir {}", dir.path().display());
        Ok(Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!("Removed scratch dir {}", self.path.display()),
                Err(e) => warn!("ResourceCleanupFailure: could not remove {}: {e}", self.path.display()),
            }
        }
    }
}

/// `en` also accepts regional variants such as `en-US`.
fn sub_langs_arg(languages: &[String]) -> String {
    languages
        .iter()
        .map(|l| format!("{l},{l}-.*"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Subtitle files in `dir` with the language code taken from `<id>.<lang>.vtt`, sorted by name.
async fn list_subtitles(dir: &Path) -> Result<Vec<(PathBuf, String)>, CaptionError> {
    let scratch_error = |e: std::io::Error| CaptionError::ToolFailure(format!("could not read scratch directory: {e}"));
    let mut entries = tokio::fs::read_dir(dir).await.map_err(scratch_error)?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(scratch_error)? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("vtt") {
            continue;
        }
        let lang = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|stem| stem.rsplit_once('.'))
            .map(|(_, lang)| lang.to_string())
            .unwrap_or_default();
        files.push((path, lang));
    }
    files.sort();
    Ok(files)
}
