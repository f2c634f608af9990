use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipdrop::cli::{Cli, Commands, OutputFormat, ParanoidMode};
use clipdrop::config::Config;
use clipdrop::transcript::parse_vtt;
use clipdrop::youtube::{
    find_youtube_url, matches_language, select_caption_track, validate_url, CaptionTrack,
    YoutubeClient, YtDlp,
};
use clipdrop::{output, utils, YoutubeError};

/// Options of the `youtube` command
struct YoutubeOptions {
    filename: Option<PathBuf>,
    url: Option<String>,
    lang: Option<String>,
    format: Option<OutputFormat>,
    chapters: bool,
    force: bool,
    paranoid: Option<ParanoidMode>,
    refresh: bool,
    cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("clipdrop=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "clipdrop=info".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Youtube {
            filename,
            url,
            lang,
            format,
            chapters,
            force,
            paranoid,
            refresh,
            cache_dir,
        } => {
            let options = YoutubeOptions {
                filename,
                url,
                lang,
                format,
                chapters,
                force,
                paranoid,
                refresh,
                cache_dir,
            };
            download_transcript(&config, options, cli.quiet).await
        }
        Commands::Captions { url } => list_captions(&config, url, cli.quiet).await,
        Commands::Check => check_ytdlp(&config),
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                match Config::config_path() {
                    Some(path) => println!("Config file: {}", path.display()),
                    None => println!("Could not determine config directory"),
                }
                println!("Use `clipdrop config --show` to print the effective settings.");
            }
            Ok(())
        }
    }
}

fn create_spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// URL from `--url`, or the first YouTube URL in text piped on stdin
fn read_url(url: Option<String>) -> Result<String> {
    let text = match url {
        Some(url) => url,
        None => {
            let mut stdin = std::io::stdin();
            if stdin.is_terminal() {
                anyhow::bail!(
                    "No URL given. Pass --url or pipe one in, e.g. `pbpaste | clipdrop youtube`"
                );
            }
            let mut buffer = String::new();
            stdin
                .read_to_string(&mut buffer)
                .context("Failed to read URL from stdin")?;
            buffer
        }
    };

    if text.trim().is_empty() {
        anyhow::bail!("No URL given: input is empty");
    }

    let url = find_youtube_url(&text)
        .ok_or_else(|| YoutubeError::InvalidUrl(text.trim().to_string()))?;
    Ok(url.to_string())
}

fn client_for(config: &Config, cache_dir: Option<&Path>) -> Result<YoutubeClient<YtDlp>> {
    Ok(YoutubeClient::new(config.ytdlp(), config.cache_store(cache_dir)?))
}

fn print_available(captions: &[CaptionTrack]) {
    eprintln!("Available languages:");
    for track in captions {
        eprintln!("  {}: {}", track.language_code, track.display_name);
    }
}

async fn download_transcript(config: &Config, options: YoutubeOptions, quiet: bool) -> Result<()> {
    let url = read_url(options.url)?;
    let video_id = validate_url(&url)?;
    println!("Found YouTube video: {}", style(&video_id).cyan());

    let client = client_for(config, options.cache_dir.as_deref())?;
    if options.refresh {
        client
            .cache()
            .clear(&video_id)
            .context("Failed to clear cache")?;
        tracing::debug!("Cleared cache for {}", video_id);
    }

    let spinner = create_spinner("Fetching video info...", quiet);
    let info = client.fetch_video_info(&url).await;
    spinner.finish_and_clear();
    let info = info?;
    println!(
        "Title: {} ({})",
        style(&info.title).bold(),
        utils::format_duration(info.duration)
    );

    let spinner = create_spinner("Listing captions...", quiet);
    let captions = client.list_captions(&url).await;
    spinner.finish_and_clear();
    let captions = captions?;

    let preferred = options
        .lang
        .or_else(|| config.output.default_language.clone())
        .filter(|lang| !lang.trim().is_empty());

    let track = select_caption_track(&captions, preferred.as_deref())
        .ok_or_else(|| YoutubeError::NoCaptions(video_id.to_string()))?;

    if let Some(lang) = preferred.as_deref() {
        if !matches_language(track, lang) {
            eprintln!(
                "{} No captions found for language: '{}'",
                style("✗").red(),
                lang
            );
            print_available(&captions);
            return Err(YoutubeError::NoCaptions(format!("language: {}", lang)).into());
        }
    }
    println!(
        "Selected: {} ({})",
        style(&track.display_name).green(),
        track.kind_label()
    );

    let spinner = create_spinner("Downloading subtitles...", quiet);
    let vtt_path = client.fetch_vtt(&url, &track.language_code).await;
    spinner.finish_and_clear();
    let vtt_path = vtt_path?;

    let vtt = fs_err::read_to_string(&vtt_path).context("Failed to read subtitle file")?;
    let cues = parse_vtt(&vtt);
    if cues.is_empty() {
        anyhow::bail!("Subtitle file contains no captions: {}", vtt_path.display());
    }

    let chapters = if options.chapters {
        let chapters = info.chapters.clone().unwrap_or_default();
        if chapters.is_empty() {
            println!("No chapters available for this video");
        } else {
            println!("Adding {} chapter markers", chapters.len());
        }
        chapters
    } else {
        Vec::new()
    };

    let format = options
        .format
        .or_else(|| options.filename.as_deref().and_then(OutputFormat::from_extension))
        .unwrap_or(config.output.default_format);

    let path = match options.filename {
        Some(filename) => {
            utils::validate_filename(&filename.to_string_lossy())?;
            if filename.extension().is_none() {
                filename.with_extension(format.extension())
            } else {
                filename
            }
        }
        None => PathBuf::from(format!(
            "{}.{}",
            utils::sanitize_filename(&info.title),
            format.extension()
        )),
    };

    let content = output::render(&cues, &format, &chapters, options.paranoid)?;
    output::save_to_file(&path, &content, options.force)?;

    let size = fs_err::metadata(&path).map(|m| m.len()).unwrap_or(0);
    println!(
        "{} Saved {} transcript to {} ({}, {} cues)",
        style("✓").green(),
        format,
        style(path.display()).bold(),
        utils::format_file_size(size),
        cues.len()
    );
    Ok(())
}

async fn list_captions(config: &Config, url: Option<String>, quiet: bool) -> Result<()> {
    let url = read_url(url)?;
    let video_id = validate_url(&url)?;

    let client = client_for(config, None)?;
    let spinner = create_spinner("Listing captions...", quiet);
    let captions = client.list_captions(&url).await;
    spinner.finish_and_clear();
    let captions = captions?;

    println!("Captions for {}:", style(&video_id).cyan());
    for track in &captions {
        println!(
            "  {}: {} [{}]",
            track.language_code,
            track.display_name,
            track.kind_label()
        );
    }
    Ok(())
}

fn check_ytdlp(config: &Config) -> Result<()> {
    let (available, message) = client_for(config, None)?.tool_available();
    if available {
        println!("{} {}", style("✓").green(), message);
        Ok(())
    } else {
        tracing::debug!("{}", message);
        Err(YoutubeError::YtDlpNotFound.into())
    }
}
