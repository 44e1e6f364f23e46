use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use eyre::{Result, bail};
use log::{debug, info, warn};

mod cli;

use cli::{Cli, OutputFormat};
use vidsum::config::{Config, DEFAULT_MODEL};
use vidsum::pipeline::{Pipeline, SummaryRequest, default_sources};
use vidsum::summarize::{LlmSummarizer, Summarizer};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("vidsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidsum")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp_line = match tool_version("yt-dlp") {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found, needed for the subtitle download fallback)".to_string(),
    };

    let log_path = log_dir().join("vidsum.log");

    format!(
        "\nOPTIONAL TOOLS:\n{yt_dlp_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        vidsum::config::config_path().display(),
        log_path.display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file: {e}");
        if cli.verbose {
            eprintln!("Ignoring config file: {e}");
        }
        Config::default()
    });
    let pipeline_config = config.pipeline_config()?;

    // CLI flags take priority over the config file
    let model = cli
        .model
        .clone()
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    if cli.verbose {
        let config_path = vidsum::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        debug!("Resolved config: {pipeline_config:?}");
    }

    let client = reqwest::Client::new();
    let sources = default_sources(&pipeline_config, client.clone(), config.downloader.clone());
    let summarizer: Option<Arc<dyn Summarizer>> = if cli.no_summary {
        None
    } else {
        Some(Arc::new(LlmSummarizer::new(client, model)))
    };
    let pipeline = Pipeline::new(pipeline_config, sources, summarizer)?;

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.iter().all(|u| u.trim().is_empty()) {
        bail!("no URL or video ID provided\n\nUsage: vidsum <URL>\n       echo <URL> | vidsum");
    }

    let mut rendered_reports = Vec::new();
    for url_input in &urls {
        let url_input = url_input.trim();
        if url_input.is_empty() {
            continue;
        }

        let request = SummaryRequest {
            reference: url_input.to_string(),
            languages: (!cli.languages.is_empty()).then(|| cli.languages.clone()),
            highlight_count: cli.highlights,
            target_language: cli.target_lang.clone(),
            local_file: cli.local_file.clone(),
        };
        let report = pipeline.run(&request).await?;

        if cli.verbose {
            eprintln!(
                "Video: {}\nSource: {}\nLanguage: {}\nHighlights: {}",
                report.video_id,
                report.source,
                report.language.as_deref().unwrap_or("unknown"),
                report.highlights.len(),
            );
            if let Some(notice) = report.summary.notice() {
                eprintln!("Note: {notice}");
            }
        }

        let rendered = match cli.format {
            OutputFormat::Text => vidsum::output::render_text(&report),
            OutputFormat::Json => vidsum::output::render_json(&report)?,
        };
        rendered_reports.push(rendered);
    }

    let rendered = rendered_reports.join("\n\n");
    if let Some(ref path) = cli.output {
        std::fs::write(path, &rendered)?;
        if cli.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{rendered}");
    }

    Ok(())
}
