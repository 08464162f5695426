//! Multi-source configuration loader: built-in defaults, an optional
//! TOML file, then `SECIDX_*`-prefixed environment variables, highest
//! precedence last (spec.md §9 "Ad-hoc JSON-typed config map").

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::SecIdxConfig;

pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { file: None, env_prefix: "SECIDX".to_string() }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(self) -> Result<SecIdxConfig> {
        let mut builder = config::Config::builder();
        builder = builder.add_source(config::Config::try_from(&SecIdxConfig::default())?);

        if let Some(path) = &self.file {
            if path.exists() {
                builder = builder.add_source(
                    config::File::from(path.clone()).required(false).format(config::FileFormat::Toml),
                );
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix).separator("_").try_parsing(true),
        );

        let built = builder.build().context("failed to build configuration")?;
        let config: SecIdxConfig = built.try_deserialize().context("failed to deserialize configuration")?;
        Ok(config)
    }

    pub fn load_or_default(self) -> SecIdxConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
