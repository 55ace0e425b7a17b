use clap::{ArgAction, Parser};
use std::{net::SocketAddr, path::PathBuf};

/// Snapchef server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "snapchef", version, about = "Photo-to-recipe generation API server")]
pub struct Config {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease verbosity (-q, -qq, -qqq)
    #[arg(short = 'q', action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Address to bind the HTTP server to
    #[arg(long, env = "SNAPCHEF_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Directory to store preview thumbnails
    #[arg(long, env = "SNAPCHEF_MEDIA_DIR", default_value = "media")]
    pub media_dir: PathBuf,

    /// Optional log file path (logs are written to stdout + this file)
    #[arg(long, env = "SNAPCHEF_LOG_FILE", default_value = "snapchef.logs")]
    pub log_file: PathBuf,

    /// API key for the vision LLM (the server refuses to start without it)
    #[arg(long, env = "SNAPCHEF_LLM_API_KEY")]
    pub llm_api_key: Option<String>,

    /// Vision-capable LLM model to use
    #[arg(long, env = "SNAPCHEF_LLM_MODEL", default_value = "google/gemini-2.5-flash")]
    pub llm_model: String,

    /// LLM API URL (OpenAI-compatible chat completions endpoint)
    #[arg(long, env = "SNAPCHEF_LLM_API_URL", default_value = "https://openrouter.ai/api/v1")]
    pub llm_api_url: String,

    /// Timeout for one LLM generation call, in seconds
    #[arg(long, env = "SNAPCHEF_LLM_TIMEOUT_SECS", default_value_t = 120)]
    pub llm_timeout_secs: u64,

    /// Maximum accepted size of one uploaded image, in megabytes
    #[arg(long, env = "SNAPCHEF_MAX_IMAGE_MB", default_value_t = 10)]
    pub max_image_mb: usize,
}

impl Config {
    #[must_use]
    pub fn verbosity_delta(&self) -> i16 {
        i16::from(self.verbose) - i16::from(self.quiet)
    }

    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity_delta() {
            d if d <= -2 => "error",
            -1 => "warn",
            0 => "info,snapchef=info,axum=info,tower_http=info",
            1 => "debug,snapchef=debug,axum=info,tower_http=info",
            2 => "trace,snapchef=trace,axum=debug,tower_http=trace,hyper=info",
            _ => "trace,snapchef=trace,axum=trace,tower_http=trace,hyper=debug",
        }
    }

    #[must_use]
    pub fn max_image_bytes(&self) -> usize {
        self.max_image_mb * 1024 * 1024
    }
}
