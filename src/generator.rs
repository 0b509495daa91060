//! Runs one upload through request building, the provider call and result materialisation.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{AppConfig, ProviderConfig};
use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::materialize::{collect_urls, save_inline_images};
use crate::prompt::{SKYDIVER_PROMPT, TASK_PROMPT};
use crate::request::{GenerationRequest, ReferenceImage};
use crate::task::{TaskClient, TaskPoller};

/// What a successful generation produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationResult {
    /// Files written to the output directory.
    Saved(Vec<PathBuf>),
    /// URLs hosted by the provider.
    Remote(Vec<String>),
}

impl GenerationResult {
    pub fn len(&self) -> usize {
        match self {
            GenerationResult::Saved(paths) => paths.len(),
            GenerationResult::Remote(urls) => urls.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The configured provider, with the settings it needs for every request.
#[derive(Clone, Debug)]
pub enum Generator {
    Gemini {
        client: GeminiClient,
        logo_path: PathBuf,
        output_dir: PathBuf,
        output_prefix: String,
    },
    Task {
        client: TaskClient,
        poller: TaskPoller,
    },
}

impl Generator {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(match &config.provider {
            ProviderConfig::Gemini { api_key, base_url } => Generator::Gemini {
                client: GeminiClient::new(api_key.clone(), base_url.clone()),
                logo_path: config.logo_path.clone(),
                output_dir: config.output_dir.clone(),
                output_prefix: config.output_prefix.clone(),
            },
            ProviderConfig::Task {
                api_key,
                base_url,
                poll_interval,
                timeout,
            } => Generator::Task {
                client: TaskClient::new(api_key.clone(), base_url.clone(), *timeout)?,
                poller: TaskPoller::new(*poll_interval, *timeout),
            },
        })
    }

    /// Generates from a saved upload. Blocks until the provider is done.
    pub async fn run(&self, image_path: &Path, image: Vec<u8>) -> Result<GenerationResult> {
        match self {
            Generator::Gemini {
                client,
                logo_path,
                output_dir,
                output_prefix,
            } => {
                let logo = ReferenceImage::load(logo_path).await?;
                let request =
                    GenerationRequest::new(SKYDIVER_PROMPT, image_path.to_path_buf(), image)
                        .with_reference(logo);
                let content = client.generate(&request).await?;
                let paths = save_inline_images(&content, output_dir, output_prefix).await?;
                info!("saved {} generated image(s)", paths.len());
                Ok(GenerationResult::Saved(paths))
            }
            Generator::Task { client, poller } => {
                let request =
                    GenerationRequest::new(TASK_PROMPT, image_path.to_path_buf(), image);
                let urls = client.generate(&request, poller).await?;
                Ok(GenerationResult::Remote(collect_urls(urls)))
            }
        }
    }
}
