use std::{path::PathBuf, sync::Arc};

use engine::{
    DEFAULT_IMAGE_COUNT, ImgModBox,
    export::{DirectoryTarget, HttpFetcher, SystemClipboard},
    image_model::Model,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Contents of the config file. Every field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fal_key: Option<String>,
    pub model: Model,
    pub image_count: usize,
    pub download_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fal_key: None,
            model: Model::default(),
            image_count: DEFAULT_IMAGE_COUNT,
            download_dir: None,
        }
    }
}

impl Config {
    /// Replaces values that cannot be used, with a warning.
    pub fn validated(self) -> Self {
        if self.image_count == 0 {
            warn!("image_count in the config is 0, using {DEFAULT_IMAGE_COUNT}");
            return Self {
                image_count: DEFAULT_IMAGE_COUNT,
                ..self
            };
        }
        self
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Values from the environment and the command line. They are applied on
/// top of the config file but never written back to it.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub fal_key: Option<String>,
    pub model: Option<Model>,
    pub image_count: Option<usize>,
    pub download_dir: Option<PathBuf>,
}

impl Overrides {
    pub fn new(env_key: Option<String>, cli: Cli) -> Self {
        let env_key = env_key.filter(|k| !k.trim().is_empty());
        Self {
            fal_key: cli.fal_key.or(env_key),
            model: cli.model,
            image_count: cli.count,
            download_dir: cli.download_dir,
        }
    }

    pub fn apply(&self, config: &Config) -> Config {
        Config {
            fal_key: self.fal_key.clone().or_else(|| config.fal_key.clone()),
            model: self.model.unwrap_or(config.model),
            image_count: self.image_count.unwrap_or(config.image_count),
            download_dir: self
                .download_dir
                .clone()
                .or_else(|| config.download_dir.clone()),
        }
    }
}

pub struct Context {
    /// What is stored on disk, edited by the settings screen.
    pub config: Config,
    overrides: Overrides,
    effective: Config,
    pub image_model: ImgModBox,
    pub fetcher: Arc<HttpFetcher>,
    pub clipboard: Arc<SystemClipboard>,
    pub downloads: Arc<DirectoryTarget>,
}

impl Context {
    pub fn new(config: Config, overrides: Overrides) -> Self {
        let effective = overrides.apply(&config);
        log_credentials(&effective);
        Self {
            image_model: effective.model.make(effective.fal_key.clone()),
            downloads: Arc::new(DirectoryTarget::new(effective.download_dir())),
            fetcher: Arc::new(HttpFetcher::new()),
            clipboard: Arc::new(SystemClipboard),
            config,
            overrides,
            effective,
        }
    }

    /// Config with environment and command line applied.
    pub fn effective(&self) -> &Config {
        &self.effective
    }

    pub fn image_count(&self) -> usize {
        self.effective.image_count
    }

    /// Swaps in a new file config and rebuilds everything that depends on it.
    pub fn set_config(&mut self, config: Config) {
        let fetcher = self.fetcher.clone();
        *self = Self {
            fetcher,
            ..Self::new(config, self.overrides.clone())
        };
    }
}

fn log_credentials(cfg: &Config) {
    if cfg.fal_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
        info!("FAL key is available, using {}", cfg.model);
    } else {
        warn!("No FAL key configured, generating images will fail until one is set");
    }
}
