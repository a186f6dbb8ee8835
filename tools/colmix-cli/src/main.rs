//! Colmix CLI: mix two video or image sources by interleaving columns.
//!
//! Usage:
//!   colmix mix <SOURCE1> <SOURCE2>   Run the mixing pipeline
//!   colmix probe <PATH>              Show how an input will be read
//!   colmix check                     Check the GStreamer installation
//!   colmix config                    Show or initialize the config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colmix_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "colmix",
    about = "Column-interleave mixer for two video or image sources",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mix two sources until Ctrl+C or the duration elapses
    Mix {
        /// First source; its resolution is the output resolution
        source1: PathBuf,

        /// Second source; resized to match the first if needed
        source2: PathBuf,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<f64>,

        /// Write the last mixed frame to this PNG on exit
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Print the source dimensions overlay whenever it changes
        #[arg(long)]
        overlay: bool,

        /// Compositor wait per channel before a cycle is skipped
        #[arg(long)]
        take_timeout_ms: Option<u64>,

        /// Re-emission rate for still images
        #[arg(long)]
        image_fps: Option<u32>,
    },

    /// Show how an input path will be read
    Probe {
        /// Video or image file
        path: PathBuf,
    },

    /// Check that GStreamer and the required elements are available
    Check,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    colmix_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Mix {
            source1,
            source2,
            duration,
            snapshot,
            overlay,
            take_timeout_ms,
            image_fps,
        } => {
            if let Some(ms) = take_timeout_ms {
                config.mixer.take_timeout_ms = ms;
            }
            if let Some(fps) = image_fps {
                config.mixer.image_fps = fps;
            }
            config.mixer.validate()?;
            commands::mix::run(
                source1,
                source2,
                config.mixer,
                commands::mix::MixOptions {
                    duration,
                    snapshot,
                    overlay,
                },
            )
            .await
        }
        Commands::Probe { path } => commands::probe::run(path, &config.mixer),
        Commands::Check => commands::check::run(),
        Commands::Config { init } => commands::config::run(&config, init),
    }
}
