use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::KiraError;
use crate::gene::FieldSet;
use crate::gene::OneOrMany;
use crate::identifier::Scopes;
use crate::species::Species;

pub const DEFAULT_CONFIG_FILE: &str = "kira-gsr.json";
pub const DEFAULT_BASE_URL: &str = "https://mygene.info/v3";
pub const BASE_URL_ENV: &str = "MYGENE_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Terms per POST; larger batches are split.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub provider: Option<ProviderSettings>,
    #[serde(default)]
    pub species: Option<Species>,
    #[serde(default)]
    pub scopes: Option<OneOrMany<String>>,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub provider: ProviderSettings,
    pub species: Species,
    pub scopes: Option<Scopes>,
    pub extra_fields: Vec<String>,
}

impl ResolvedConfig {
    /// Base field set with the configured extra fields appended.
    pub fn field_set(&self) -> FieldSet {
        let mut fields = FieldSet::defaults();
        for field in &self.extra_fields {
            fields.insert(field);
        }
        fields
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; the default file is optional.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let mut provider = config.provider.unwrap_or_default();
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                provider.base_url = base_url.trim().to_string();
            }
        }
        if provider.batch_size == 0 {
            return Err(KiraError::ConfigParse(
                "provider.batch_size must be positive".to_string(),
            ));
        }

        let scopes = match config.scopes {
            None => None,
            Some(OneOrMany::One(scope)) => Some(Scopes::from_list(vec![scope])?),
            Some(OneOrMany::Many(scopes)) => Some(Scopes::from_list(scopes)?),
        };

        Ok(ResolvedConfig {
            schema_version,
            provider,
            species: config.species.unwrap_or_default(),
            scopes,
            extra_fields: config.fields,
        })
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    1000
}
