use crate::backend::Backend;
use anyhow::Context;
use config::{Config, Environment, File, Source};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::instrument;

pub const CONFIG_FILE_NAME: &str = "voxmix";
pub const ENV_PREFIX: &str = "voxmix";
/// Backend value requesting runtime detection, same as leaving `backend` unset.
pub const AUTO_BACKEND: &str = "auto";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct MixerConfig {
    /// Backend to run the sample kernels on. Detected at runtime if unset or `auto`.
    #[serde(default, deserialize_with = "deserialize_backend")]
    pub backend: Option<Backend>,
}

impl MixerConfig {
    /// Loads the config from the built-in defaults, an optional `voxmix.{toml,json,...}` file in
    /// the working directory and `VOXMIX_*` environment variables, in increasing precedence.
    pub fn parse() -> anyhow::Result<Self> {
        Self::load(
            File::with_name(CONFIG_FILE_NAME).required(false),
            Self::environment(),
        )
    }

    /// `VOXMIX_BACKEND` sets `backend`, nested keys would be separated by `__`.
    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    #[instrument(level = "debug", skip_all, err)]
    pub(crate) fn load<S>(source: S, environment: Environment) -> anyhow::Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(Config::try_from(&MixerConfig::default())?)
            .add_source(source)
            .add_source(environment)
            .build()
            .context("Failed to build config")?
            .try_deserialize::<Self>()
            .context("Failed to deserialize config")?;

        tracing::debug!(?config, "Loaded mixer config");
        Ok(config)
    }
}

fn deserialize_backend<'de, D>(deserializer: D) -> Result<Option<Backend>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.eq_ignore_ascii_case(AUTO_BACKEND) => value
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
