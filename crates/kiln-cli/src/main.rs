//! Kiln CLI - prompt, image or video to an editable 3D object

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{classify, generate, health, inspect, texture, upload};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Turn prompts, images and videos into 3D objects with editable materials", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug events from every Kiln crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a 3D model from a text prompt
    Generate {
        /// Description of the object
        prompt: String,
    },

    /// Generate a texture image from a text prompt
    Texture {
        /// Description of the surface
        prompt: String,
    },

    /// Turn an image, video or model file into a bound scene
    Upload {
        /// Path to the file
        file: String,

        /// Declared MIME type (e.g. video/mp4)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Show how a file would be treated
    Classify {
        /// Path or file name
        file: String,

        /// Declared MIME type
        #[arg(long, default_value = "")]
        mime: String,
    },

    /// Bind an asset reference with a material and print the scene summary
    Inspect {
        /// Model path or placeholder reference
        reference: String,

        /// Base color as #rrggbb or #rgb
        #[arg(long)]
        color: Option<String>,

        /// Roughness, clamped to [0, 1]
        #[arg(long)]
        roughness: Option<f32>,

        /// Metalness, clamped to [0, 1]
        #[arg(long)]
        metalness: Option<f32>,

        /// Color map image path
        #[arg(long)]
        texture: Option<String>,
    },

    /// Probe the generation backend
    Health,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "kiln=debug" } else { "kiln=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate { prompt } => generate::run(&prompt),
        Commands::Texture { prompt } => texture::run(&prompt),
        Commands::Upload { file, mime } => upload::run(&file, mime.as_deref()),
        Commands::Classify { file, mime } => classify::run(&file, &mime),
        Commands::Inspect {
            reference,
            color,
            roughness,
            metalness,
            texture,
        } => inspect::run(inspect::InspectArgs {
            reference,
            color,
            roughness,
            metalness,
            texture,
        }),
        Commands::Health => health::run(),
    }
}
