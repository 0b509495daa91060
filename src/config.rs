//! Config handling

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::ValueEnum;
use tracing::log::LevelFilter;
use url::Url;

use crate::cli::CliOptions;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// One synchronous multimodal call, images returned inline.
    Gemini,
    /// Asynchronous task creation followed by status polling.
    Task,
}

/// Provider credentials and endpoints.
#[derive(Clone, Debug)]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        base_url: String,
    },
    Task {
        api_key: String,
        base_url: String,
        poll_interval: Duration,
        timeout: Duration,
    },
}

/// Everything the service needs, resolved once at startup and passed down explicitly.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub logo_path: PathBuf,
    pub output_prefix: String,
    pub max_concurrent: usize,
}

fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("base URL must not be empty");
    }
    let parsed = Url::parse(trimmed).with_context(|| format!("invalid base URL {trimmed:?}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.trim_end_matches('/').to_string()),
        scheme => Err(anyhow!("base URL must be http or https, got {scheme}")),
    }
}

fn required_key(value: Option<&str>, name: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{name} is not set"))
}

impl AppConfig {
    pub fn from_cli(cli: &CliOptions) -> Result<Self> {
        let provider = match cli.provider {
            ProviderKind::Gemini => ProviderConfig::Gemini {
                api_key: required_key(cli.google_api_key.as_deref(), "GOOGLE_API_KEY")?,
                base_url: validate_base_url(&cli.gemini_api_base_url)?,
            },
            ProviderKind::Task => ProviderConfig::Task {
                api_key: required_key(cli.task_api_key.as_deref(), "TASK_API_KEY")?,
                base_url: validate_base_url(&cli.task_api_base_url)?,
                poll_interval: Duration::from_secs(cli.poll_interval_secs.get()),
                timeout: Duration::from_secs(cli.poll_timeout_secs.get()),
            },
        };
        if cli.output_prefix.trim().is_empty() {
            bail!("output prefix must not be empty");
        }

        Ok(Self {
            provider,
            input_dir: cli.input_dir.clone(),
            output_dir: cli.output_dir.clone(),
            logo_path: cli.logo_path.clone(),
            output_prefix: cli.output_prefix.trim().to_string(),
            max_concurrent: cli.max_concurrent.get(),
        })
    }

    pub fn provider_kind(&self) -> ProviderKind {
        match self.provider {
            ProviderConfig::Gemini { .. } => ProviderKind::Gemini,
            ProviderConfig::Task { .. } => ProviderKind::Task,
        }
    }

    /// Creates the input and output directories if they are missing.
    pub async fn prepare_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.input_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> CliOptions {
        let mut argv = vec!["brand-portrait"];
        argv.extend_from_slice(args);
        CliOptions::try_parse_from(argv).expect("parse cli")
    }

    #[test]
    fn gemini_requires_google_key() {
        let cli = parse(&["--provider", "gemini", "--google-api-key", "  "]);
        let err = AppConfig::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn task_config_carries_poll_settings() {
        let cli = parse(&[
            "--provider",
            "task",
            "--task-api-key",
            "secret",
            "--task-api-base-url",
            "http://localhost:9999/",
            "--poll-interval-secs",
            "2",
        ]);
        let config = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(config.provider_kind(), ProviderKind::Task);
        match config.provider {
            ProviderConfig::Task {
                base_url,
                poll_interval,
                timeout,
                ..
            } => {
                assert_eq!(base_url, "http://localhost:9999");
                assert_eq!(poll_interval, Duration::from_secs(2));
                assert_eq!(timeout, Duration::from_secs(300));
            }
            other => panic!("unexpected provider {other:?}"),
        }
        assert_eq!(config.output_prefix, "indigo");
        assert_eq!(config.max_concurrent, 4);
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(validate_base_url("ftp://example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
        assert_eq!(
            validate_base_url("https://example.com/v1/").unwrap(),
            "https://example.com/v1"
        );
    }

    #[tokio::test]
    async fn prepare_dirs_creates_both_directories() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[
            "--google-api-key",
            "key",
            "--input-dir",
            dir.path().join("in").to_str().unwrap(),
            "--output-dir",
            dir.path().join("out/images").to_str().unwrap(),
        ]);
        let config = AppConfig::from_cli(&cli).unwrap();
        config.prepare_dirs().await.unwrap();
        assert!(dir.path().join("in").is_dir());
        assert!(dir.path().join("out/images").is_dir());
    }
}
