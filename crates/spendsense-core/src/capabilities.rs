//! Capability router for per-call model and timeout selection
//!
//! Each inference capability may run on its own model and always runs under
//! its own timeout, so a hang in one call cannot stall unrelated analyses.
//! There are no retries and no fallback models: a failed call is terminal.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/spendsense/config/capabilities.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/capabilities.toml");

/// The four remote capabilities behind the inference gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Assign one category per transaction
    Categorize,
    /// Flag unusual transactions against category and monthly norms
    DetectAnomalies,
    /// Natural-language savings advice with monthly estimates
    SuggestSavingsTips,
    /// Turn a PDF statement into raw transactions
    ExtractFromDocument,
}

impl Capability {
    /// Get the config key for this capability
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Categorize => "categorize",
            Self::DetectAnomalies => "detect_anomalies",
            Self::SuggestSavingsTips => "suggest_savings_tips",
            Self::ExtractFromDocument => "extract_from_document",
        }
    }

    /// Get all capabilities
    pub fn all() -> &'static [Capability] {
        &[
            Self::Categorize,
            Self::DetectAnomalies,
            Self::SuggestSavingsTips,
            Self::ExtractFromDocument,
        ]
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Capability::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown capability: {}", s))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for a single capability
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityConfig {
    /// Model override (None = backend default model)
    pub model: Option<String>,
    /// Timeout for one remote call
    pub timeout: Duration,
}

/// Router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Default model override for all capabilities
    pub default_model: Option<String>,
    /// Default timeout
    pub default_timeout: Duration,
    /// Per-capability configurations
    pub capabilities: HashMap<Capability, CapabilityConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            default_timeout: Duration::from_secs(60),
            capabilities: HashMap::new(),
        }
    }
}

/// Resolves model and timeout per capability
#[derive(Debug, Clone, Default)]
pub struct CapabilityRouter {
    config: RouterConfig,
    config_path: Option<PathBuf>,
}

impl CapabilityRouter {
    /// Create a router from the override file or the embedded defaults
    pub fn new() -> Result<Self> {
        let config = load_config(None)?;
        Ok(Self {
            config,
            config_path: default_config_path(),
        })
    }

    /// Like `new`, falling back to the built-in defaults when the config
    /// cannot be loaded
    pub fn load_or_default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load capability config, using defaults");
            Self::default()
        })
    }

    /// Create with a custom config path
    pub fn with_config_path(path: PathBuf) -> Result<Self> {
        let config = load_config(Some(&path))?;
        Ok(Self {
            config,
            config_path: Some(path),
        })
    }

    /// Create with an explicit configuration (for testing)
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    /// Model to use for a capability, falling back to `backend_default`
    pub fn model_for<'a>(&'a self, capability: Capability, backend_default: &'a str) -> &'a str {
        self.config
            .capabilities
            .get(&capability)
            .and_then(|c| c.model.as_deref())
            .or(self.config.default_model.as_deref())
            .unwrap_or(backend_default)
    }

    /// Timeout for one remote call of a capability
    pub fn timeout_for(&self, capability: Capability) -> Duration {
        self.config
            .capabilities
            .get(&capability)
            .map(|c| c.timeout)
            .unwrap_or(self.config.default_timeout)
    }

    /// Get the router configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Get the config path (if using file-based config)
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| {
        d.join("spendsense")
            .join("config")
            .join("capabilities.toml")
    })
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&PathBuf>) -> Result<RouterConfig> {
    let path = override_path.cloned().or_else(default_config_path);

    let content = match path {
        Some(path) if path.exists() => fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    capabilities: Option<HashMap<String, RawCapabilityConfig>>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawCapabilityConfig {
    model: Option<String>,
    timeout_secs: Option<u64>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<RouterConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid capabilities TOML: {}", e)))?;

    let mut config = RouterConfig::default();

    if let Some(defaults) = raw.defaults {
        config.default_model = defaults.model;
        if let Some(timeout) = defaults.timeout_secs {
            config.default_timeout = Duration::from_secs(timeout);
        }
    }

    if let Some(capabilities) = raw.capabilities {
        for (name, raw_config) in capabilities {
            let Ok(capability) = name.parse::<Capability>() else {
                tracing::warn!(capability = %name, "Ignoring unknown capability in config");
                continue;
            };

            config.capabilities.insert(
                capability,
                CapabilityConfig {
                    model: raw_config.model,
                    timeout: raw_config
                        .timeout_secs
                        .map(Duration::from_secs)
                        .unwrap_or(config.default_timeout),
                },
            );
        }
    }

    Ok(config)
}
