use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shared::config::{Config, ConfigError};
use shared::{DEFAULT_API_BASE_URL, DEFAULT_PICKER_QUALITY, DEFAULT_REQUEST_TIMEOUT_MS};

/// Terminal client for the ArogyaAI health assistant
#[derive(Debug, Parser)]
#[command(name = "arogya", version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct Settings {
    /// Backend base URL
    #[arg(long, global = true, env = "AROGYA_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub base_url: String,

    /// Directory holding the session store
    #[arg(long, global = true, env = "AROGYA_DATA_DIR", default_value = ".arogya")]
    pub data_dir: PathBuf,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, env = "AROGYA_TIMEOUT_MS", default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Image quality factor handed to the picker (0.0-1.0)
    #[arg(long, global = true, default_value_t = DEFAULT_PICKER_QUALITY)]
    pub picker_quality: f32,
}

impl Settings {
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        Config::new(&self.base_url)?
            .with_request_timeout_ms(self.timeout_ms)?
            .with_picker_quality(self.picker_quality)
    }
}

#[derive(Debug, Clone, Args)]
pub struct CredentialArgs {
    #[arg(long, env = "AROGYA_EMAIL")]
    pub email: String,

    #[arg(long, env = "AROGYA_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account
    Signup(CredentialArgs),

    /// Log in and store the session token
    Login(CredentialArgs),

    /// Check whether the backend is up
    Health,

    /// Log in and send one message, an image, or both
    Ask {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Message text
        #[arg(short, long)]
        message: Option<String>,

        /// Image file to attach
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Log in and chat interactively
    Session(CredentialArgs),
}
