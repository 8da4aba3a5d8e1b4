//! Site configuration, loaded once at startup from TOML and passed down
//! explicitly.
//!
//! ```toml
//! [analytics]
//! ga_measurement_id = "G-ZYCR2GTVQ8"
//! enable_clearbit = true
//! clearbit_key = "pk_..."
//!
//! [leads]
//! portal_id = "244225374"
//! default_form = "b631cbcc-1f01-47f9-926c-715a4cb2cd8a"
//!
//! [leads.forms]
//! contact = "b631cbcc-1f01-47f9-926c-715a4cb2cd8a"
//!
//! [storage]
//! backend = "json"
//! connection_string = "./state"
//! persisted_calculators = ["pipeline_velocity", "saas_compass"]
//! ```
//!
//! Every section and key is optional; missing values take the defaults
//! below.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{CalculatorId, FormId};
use crate::store::StoreConfig;

pub const DEFAULT_ENDPOINT: &str = "https://api.hsforms.com/submissions/v3/integration/submit";
pub const DEFAULT_PORTAL_ID: &str = "244225374";
pub const DEFAULT_FORM_GUID: &str = "b631cbcc-1f01-47f9-926c-715a4cb2cd8a";
pub const DEFAULT_GA_MEASUREMENT_ID: &str = "G-ZYCR2GTVQ8";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("unknown form id '{0}' in [leads.forms]")]
    UnknownForm(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub analytics: AnalyticsConfig,
    pub leads: LeadsConfig,
    pub storage: StorageConfig,
}

/// Third-party tracking scripts. A provider is only loaded when it is both
/// enabled and has a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    pub ga_measurement_id: Option<String>,
    pub enable_clearbit: bool,
    pub clearbit_key: Option<String>,
    pub enable_sixsense: bool,
    pub sixsense_key: Option<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            ga_measurement_id: Some(DEFAULT_GA_MEASUREMENT_ID.to_string()),
            enable_clearbit: false,
            clearbit_key: None,
            enable_sixsense: false,
            sixsense_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsProvider {
    GoogleAnalytics { measurement_id: String },
    Clearbit { key: String },
    SixSense { key: String },
}

impl AnalyticsProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GoogleAnalytics { .. } => "google_analytics",
            Self::Clearbit { .. } => "clearbit",
            Self::SixSense { .. } => "sixsense",
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl AnalyticsConfig {
    /// Providers to load, in a stable order.
    pub fn enabled_providers(&self) -> Vec<AnalyticsProvider> {
        let mut providers = Vec::new();
        if let Some(measurement_id) = non_blank(&self.ga_measurement_id) {
            providers.push(AnalyticsProvider::GoogleAnalytics { measurement_id });
        }
        if self.enable_clearbit {
            match non_blank(&self.clearbit_key) {
                Some(key) => providers.push(AnalyticsProvider::Clearbit { key }),
                None => warn!("clearbit enabled without clearbit_key, skipping"),
            }
        }
        if self.enable_sixsense {
            match non_blank(&self.sixsense_key) {
                Some(key) => providers.push(AnalyticsProvider::SixSense { key }),
                None => warn!("sixsense enabled without sixsense_key, skipping"),
            }
        }
        providers
    }
}

/// Hosted CRM form endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeadsConfig {
    /// Base URL; `/{portal_id}/{form_guid}` is appended.
    pub endpoint: String,
    pub portal_id: String,
    /// GUID used for any form id missing from `forms`.
    pub default_form: Option<String>,
    pub timeout_secs: u64,
    pub page_uri: String,
    pub page_name: String,
    /// Form id (e.g. `quota_cliff`) to form GUID.
    pub forms: BTreeMap<String, String>,
}

impl Default for LeadsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            portal_id: DEFAULT_PORTAL_ID.to_string(),
            default_form: Some(DEFAULT_FORM_GUID.to_string()),
            timeout_secs: 10,
            page_uri: "https://gtm-360.com/tools".to_string(),
            page_name: "GTM-360 Tools".to_string(),
            forms: BTreeMap::new(),
        }
    }
}

impl LeadsConfig {
    /// GUID of the hosted form that receives `form`.
    pub fn form_guid(
        &self,
        form: FormId,
    ) -> Option<&str> {
        self.forms
            .get(form.as_str())
            .or(self.default_form.as_ref())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: String,
    pub connection_string: String,
    /// Calculators whose inputs are written through to the store.
    pub persisted_calculators: Vec<CalculatorId>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "json".to_string(),
            connection_string: "./.gtm360-state".to_string(),
            persisted_calculators: CalculatorId::all().to_vec(),
        }
    }
}

impl StorageConfig {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.backend.clone(),
            connection_string: self.connection_string.clone(),
        }
    }

    pub fn persists(
        &self,
        id: CalculatorId,
    ) -> bool {
        self.persisted_calculators.contains(&id)
    }
}

impl SiteConfig {
    /// Reads and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(unknown) = self.leads.forms.keys().find(|k| FormId::parse(k).is_none()) {
            return Err(ConfigError::UnknownForm(unknown.clone()));
        }
        if self.leads.portal_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "leads.portal_id",
                reason: "must not be empty".to_string(),
            });
        }
        if self.leads.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "leads.timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.storage.backend.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "storage.backend",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
