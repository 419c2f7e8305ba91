//! Configuration loading from TOML files

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use panfinder_core::{CountCheck, HttpConfig};
use panfinder_scicat::Facility;

/// Global configuration for panfinder
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub http: HttpSection,
    pub desy: ScicatSection,
    pub maxiv: ScicatSection,
    pub ill: IllSection,
    pub esrf: EsrfSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("../data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Seconds
    pub connect_timeout: u64,
    /// Seconds, whole request
    pub request_timeout: u64,
    pub user_agent: Option<String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        let defaults = HttpConfig::default();
        Self {
            connect_timeout: defaults.connect_timeout.as_secs(),
            request_timeout: defaults.request_timeout.as_secs(),
            user_agent: None,
        }
    }
}

impl HttpSection {
    pub fn http_config(&self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(self.request_timeout),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

/// `[desy]` / `[maxiv]`. Unset values keep the facility defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScicatSection {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub catalog_url: Option<String>,
    /// Enables the PaNOSC join for facilities without one
    #[serde(deserialize_with = "deserialize_env_var")]
    pub panosc_url: Option<String>,
    pub join_key: Option<String>,
    pub batch_limit: Option<NonZeroUsize>,
    /// Fail on published data count mismatch
    pub strict: Option<bool>,
}

impl ScicatSection {
    pub fn collector_config(&self, facility: Facility, data_dir: &Path) -> panfinder_scicat::Config {
        let mut config = panfinder_scicat::Config::for_facility(facility);
        if let Some(url) = &self.catalog_url {
            config.catalog_url = url.clone();
        }
        if let Some(url) = &self.panosc_url {
            config.panosc = Some(panfinder_scicat::PanoscSource {
                url: url.clone(),
                join_key: facility.panosc_join_key().to_string(),
                count_check: CountCheck::Warn,
            });
        }
        if let (Some(key), Some(panosc)) = (&self.join_key, config.panosc.as_mut()) {
            panosc.join_key = key.clone();
        }
        if let Some(limit) = self.batch_limit {
            config.batch_limit = limit;
        }
        if let Some(strict) = self.strict {
            config.count_check = count_check(strict);
        }
        config.output_dir = data_dir.to_path_buf();
        config
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IllSection {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub panosc_url: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub doi_url: Option<String>,
    pub batch_limit: Option<NonZeroUsize>,
    pub strict: Option<bool>,
}

impl IllSection {
    pub fn collector_config(&self, data_dir: &Path) -> panfinder_ill::Config {
        let mut config = panfinder_ill::Config::default();
        if let Some(url) = &self.panosc_url {
            config.panosc_url = url.clone();
        }
        if let Some(url) = &self.doi_url {
            config.doi_url = url.clone();
        }
        if let Some(limit) = self.batch_limit {
            config.batch_limit = limit;
        }
        if let Some(strict) = self.strict {
            config.count_check = count_check(strict);
        }
        config.output_dir = data_dir.to_path_buf();
        config
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EsrfSection {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub panosc_url: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub icat_plus_url: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub portal_url: Option<String>,
    pub batch_limit: Option<NonZeroUsize>,
    pub strict: Option<bool>,
    /// Documents per catalogue run; below 1 means all
    pub count: i64,
    /// Catalogue session token, skips the browser
    #[serde(deserialize_with = "deserialize_env_var")]
    pub session_token: Option<String>,
}

impl Default for EsrfSection {
    fn default() -> Self {
        Self {
            panosc_url: None,
            icat_plus_url: None,
            portal_url: None,
            batch_limit: None,
            strict: None,
            count: panfinder_esrf::config::DEFAULT_DOCUMENT_COUNT,
            session_token: None,
        }
    }
}

impl EsrfSection {
    /// ESRF files live in their own subdirectory
    pub fn collector_config(&self, data_dir: &Path) -> panfinder_esrf::Config {
        let mut config = panfinder_esrf::Config::default();
        if let Some(url) = &self.panosc_url {
            config.panosc_url = url.clone();
        }
        if let Some(url) = &self.icat_plus_url {
            config.icat_plus_url = url.clone();
        }
        if let Some(url) = &self.portal_url {
            config.portal_url = url.clone();
        }
        if let Some(limit) = self.batch_limit {
            config.batch_limit = limit;
        }
        if let Some(strict) = self.strict {
            config.count_check = count_check(strict);
        }
        config.output_dir = data_dir.join("esrf");
        config
    }
}

fn count_check(strict: bool) -> CountCheck {
    if strict {
        CountCheck::Strict
    } else {
        CountCheck::Warn
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./panfinder.toml (current directory)
    /// 2. ~/.config/panfinder/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("panfinder.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "panfinder") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn scicat(&self, facility: Facility) -> panfinder_scicat::Config {
        let section = match facility {
            Facility::Desy => &self.desy,
            Facility::Maxiv => &self.maxiv,
        };
        section.collector_config(facility, &self.output.data_dir)
    }

    pub fn ill(&self) -> panfinder_ill::Config {
        self.ill.collector_config(&self.output.data_dir)
    }

    pub fn esrf(&self) -> panfinder_esrf::Config {
        self.esrf.collector_config(&self.output.data_dir)
    }
}
