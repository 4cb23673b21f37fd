//! Командная строка reel-sync

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use reel_sync::config::{DurationSource, ReelSyncConfig};
use reel_sync::inference::{DisabledInference, OpenAiCompatibleClient};
use reel_sync::notification::{
    CompositeProgressObserver, LogProgressObserver, ProgressBarObserver, WriterProgressObserver,
};
use reel_sync::utils::ffmpeg::{encoder_version, locate_tool};
use reel_sync::utils::logger::init_logger;
use reel_sync::{BuildRequest, ReelSync};

#[derive(Debug, Parser)]
#[command(name = "reel-sync")]
#[command(about = "Compose a captioned vertical video from stills, narration and a timed script.")]
struct Args {
    /// Path to a JSON config file (environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append progress updates to this file
    #[arg(long, global = true)]
    progress_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the final video from images, narration, script and transcript
    Build(BuildCmd),
    /// Generate images from a prompt file, one prompt per line
    Images(ImagesCmd),
    /// Change narration speed without changing pitch
    Tempo(TempoCmd),
    /// Print the measured duration of an audio file
    Probe(ProbeCmd),
    /// Show which encoder and probe executables will be used
    Tools,
}

#[derive(Debug, Parser)]
struct BuildCmd {
    /// Image files in display order
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Narration audio file
    #[arg(long)]
    audio: PathBuf,

    /// Script file with `(0s-5s) Image 1: ...` markers
    #[arg(long)]
    script: PathBuf,

    /// Transcript file
    #[arg(long)]
    transcript: PathBuf,

    /// Directory for intermediate files and output.mp4
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Narration tempo applied in place before measuring; 1.0 disables it
    #[arg(long)]
    tempo: Option<f64>,

    /// Where per-image durations come from
    #[arg(long, value_enum)]
    durations: Option<DurationArg>,
}

#[derive(Debug, Parser)]
struct ImagesCmd {
    /// File with one image prompt per line
    prompts: PathBuf,

    /// Build directory; images go to <dir>/img
    #[arg(short, long)]
    output_dir: PathBuf,
}

#[derive(Debug, Parser)]
struct TempoCmd {
    /// Input audio file
    input: PathBuf,

    /// Output file; defaults to rewriting the input in place
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Speed factor, below 1.0 slows playback
    #[arg(long, default_value_t = 0.9)]
    factor: f64,
}

#[derive(Debug, Parser)]
struct ProbeCmd {
    /// Audio file to measure
    audio: PathBuf,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum DurationArg {
    Inference,
    Markers,
    Auto,
}

impl From<DurationArg> for DurationSource {
    fn from(arg: DurationArg) -> Self {
        match arg {
            DurationArg::Inference => DurationSource::Inference,
            DurationArg::Markers => DurationSource::Markers,
            DurationArg::Auto => DurationSource::Auto,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ReelSyncConfig> {
    let config = match path {
        Some(path) => ReelSyncConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReelSyncConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Прогресс-бар в терминале, иначе строки в журнал; плюс файл прогресса
fn attach_observers(engine: &mut ReelSync, progress_log: Option<&Path>) -> Result<()> {
    let mut composite = CompositeProgressObserver::new();
    if std::io::stderr().is_terminal() {
        composite.add_observer(Box::new(ProgressBarObserver::default()));
    } else {
        composite.add_observer(Box::new(LogProgressObserver::new()));
    }
    if let Some(path) = progress_log {
        composite.add_observer(Box::new(WriterProgressObserver::append_to(path)?));
    }
    engine.add_observer(Box::new(composite));
    Ok(())
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    log::debug!("reel-sync {} starting", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Build(cmd) => {
            if let Some(tempo) = cmd.tempo {
                config.narration_tempo = if tempo == 1.0 { None } else { Some(tempo) };
            }
            if let Some(source) = cmd.durations {
                config.duration_source = source.into();
            }

            let request = BuildRequest {
                images: cmd.images,
                audio_path: cmd.audio,
                script: read_text(&cmd.script).await?,
                transcript: read_text(&cmd.transcript).await?,
                output_dir: cmd.output_dir,
            };

            let mut engine = if request.needs_inference(config.duration_source) {
                ReelSync::from_config(config)?
            } else {
                log::info!("Markers and a split transcript given, building without an API key");
                ReelSync::new(config, Arc::new(DisabledInference))
            };
            attach_observers(&mut engine, args.progress_log.as_deref())?;

            let output = engine.build(&request).await?;
            println!("{}", output.final_video.display());
        }
        Command::Images(cmd) => {
            let prompts: Vec<String> = read_text(&cmd.prompts)
                .await?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();

            let generator = OpenAiCompatibleClient::from_config(&config)?;
            let mut engine = ReelSync::new(config, Arc::new(generator.clone()));
            attach_observers(&mut engine, args.progress_log.as_deref())?;

            let images = engine.acquire_images(&prompts, &cmd.output_dir, &generator).await?;
            for image in images {
                println!("{}", image.display());
            }
        }
        Command::Tempo(cmd) => {
            let output = cmd.output.unwrap_or_else(|| cmd.input.clone());
            reel_sync::media::adjust_tempo(&config, &cmd.input, &output, cmd.factor).await?;
            println!("{}", output.display());
        }
        Command::Probe(cmd) => {
            let duration = reel_sync::media::probe_audio_duration(&config, &cmd.audio).await?;
            println!("{:.3}", duration);
        }
        Command::Tools => {
            for tool in [&config.ffmpeg_path, &config.ffprobe_path] {
                match locate_tool(tool) {
                    Ok(path) => {
                        let version =
                            encoder_version(&path).await.unwrap_or_else(|e| e.to_string());
                        println!("{}: {} ({})", tool.display(), path.display(), version);
                    }
                    Err(e) => println!("{}: {}", tool.display(), e),
                }
            }
        }
    }

    Ok(())
}
