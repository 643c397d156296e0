//! Prism command line entry point.

use clap::Parser;
use prism_app::{AppBuilder, LoggingConfig, PipelineConfig, SourceConfig};
use std::path::PathBuf;

/// Prism - live RGBD capture and label fusion
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON pipeline config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with color/ and depth/ PNG pairs to play back
    #[arg(short, long, conflicts_with = "synthetic")]
    recording: Option<PathBuf>,

    /// Use the built-in synthetic scene (default without --recording)
    #[arg(long)]
    synthetic: bool,

    /// Output directory for saves and recordings
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Loop the recording instead of pausing at its end
    #[arg(long = "loop")]
    looping: bool,

    /// Start capturing immediately
    #[arg(long)]
    capture: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Send traces to Tracy (needs the `tracy` feature)
    #[arg(long)]
    tracy: bool,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match PipelineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Application error: {}", e);
                std::process::exit(1);
            }
        },
        None => PipelineConfig::default(),
    };

    let source = match args.recording {
        Some(dir) if !args.synthetic => SourceConfig::Recording {
            dir,
            looping: args.looping,
        },
        _ => SourceConfig::Synthetic,
    };

    let mut builder = AppBuilder::new()
        .with_config(config)
        .with_source(source)
        .with_capture_on_start(args.capture)
        .with_logging(LoggingConfig {
            level: args.log_level,
            enable_tracy: args.tracy,
        });
    if let Some(output) = args.output {
        builder = builder.with_output_dir(output);
    }

    if let Err(e) = builder.run() {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
