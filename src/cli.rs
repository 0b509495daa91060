//! CLI parser
use std::num::{NonZeroU16, NonZeroU64, NonZeroUsize};
use std::path::PathBuf;

use clap::Parser;

use crate::config::ProviderKind;
use crate::gemini::GEMINI_API_BASE_URL;
use crate::task::TASK_API_BASE_URL;

#[derive(Parser, Debug)]
#[command(name = "brand-portrait", about = "Turns an uploaded photo into a branded generated image")]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "BRAND_PORTRAIT_DEBUG")]
    /// Enable debug logging. Env: BRAND_PORTRAIT_DEBUG
    pub debug: bool,

    #[clap(long, short, default_value = "5000", env = "BRAND_PORTRAIT_PORT")]
    /// http listener, defaults to `5000`.
    pub port: NonZeroU16,

    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "BRAND_PORTRAIT_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    pub listen_address: String,

    #[clap(long, value_enum, default_value = "gemini", env = "BRAND_PORTRAIT_PROVIDER")]
    /// Which image API handles uploads.
    pub provider: ProviderKind,

    #[clap(long, default_value = "inputs", env = "BRAND_PORTRAIT_INPUT_DIR")]
    /// Where uploaded photos are stored.
    pub input_dir: PathBuf,

    #[clap(long, default_value = "outputs/images", env = "BRAND_PORTRAIT_OUTPUT_DIR")]
    /// Where generated images are written.
    pub output_dir: PathBuf,

    #[clap(
        long,
        default_value = "assets/indigo_logo.png",
        env = "BRAND_PORTRAIT_LOGO_PATH"
    )]
    /// Logo sent as a reference image to Gemini.
    pub logo_path: PathBuf,

    #[clap(long, default_value = "indigo", env = "BRAND_PORTRAIT_OUTPUT_PREFIX")]
    /// Generated files are named `<prefix>_<n>.png`.
    pub output_prefix: String,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    /// Gemini API key, required with `--provider gemini`.
    pub google_api_key: Option<String>,

    #[arg(long, env = "TASK_API_KEY", hide_env_values = true)]
    /// Task API key, required with `--provider task`.
    pub task_api_key: Option<String>,

    #[clap(long, default_value = GEMINI_API_BASE_URL, env = "GEMINI_API_BASE_URL")]
    pub gemini_api_base_url: String,

    #[clap(long, default_value = TASK_API_BASE_URL, env = "TASK_API_BASE_URL")]
    pub task_api_base_url: String,

    #[clap(long, default_value = "5", env = "BRAND_PORTRAIT_POLL_INTERVAL_SECS")]
    /// Seconds between task status queries.
    pub poll_interval_secs: NonZeroU64,

    #[clap(long, default_value = "300", env = "BRAND_PORTRAIT_POLL_TIMEOUT_SECS")]
    /// Seconds before a task is abandoned.
    pub poll_timeout_secs: NonZeroU64,

    #[clap(long, default_value = "4", env = "BRAND_PORTRAIT_MAX_CONCURRENT")]
    /// Generations allowed in flight at once; further requests get 503.
    pub max_concurrent: NonZeroUsize,
}
