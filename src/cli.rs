use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the upload/download web server
    Serve {
        /// Address to bind (overrides config)
        #[arg(short, long)]
        address: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the whole pipeline on one media file
    Process {
        /// Input audio or video file
        #[arg(short, long)]
        input: PathBuf,

        /// Target subtitle language
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Directory for the subtitle and processed media (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Extract mono 16kHz audio from a media file
    Extract {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe audio into an SRT file
    Transcribe {
        /// Input audio or video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,

        /// Spoken language, or `auto` (overrides config)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Translate an existing SRT file
    Translate {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,

        /// Target language
        #[arg(short, long)]
        target_lang: String,
    },

    /// Burn subtitles into a video
    Embed {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// SRT subtitle file
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete intermediate files
    Cleanup {
        /// Files to delete
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List available whisper models and their status
    Models {
        /// Download all missing models
        #[arg(short, long)]
        download: bool,
    },
}
