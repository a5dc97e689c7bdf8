//! Configuration file support for riskscore callers
//!
//! Loads caller configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.riskscorerc.json` in project root
//! 3. `riskscore.config.json` in project root
//!
//! All fields are optional. CLI flags take precedence over config file values.
//! Scoring thresholds are intentionally not configurable: every consumer must
//! classify with the same constants.

use crate::dates::parse_iso_date;
use crate::scoring::SuggestedResponse;
use crate::EngineOptions;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names checked during discovery, in order
const CONFIG_FILE_NAMES: &[&str] = &[".riskscorerc.json", "riskscore.config.json"];

/// riskscore configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskscoreConfig {
    /// Response applied when an actionable risk has none (default: Mitigar)
    #[serde(default)]
    pub default_response: Option<String>,

    /// Pin "today" for status evaluation (`YYYY-MM-DD`, default: system date)
    #[serde(default)]
    pub evaluation_date: Option<String>,

    /// Clear gated control attributes on write (default: true)
    #[serde(default)]
    pub normalize_control_flags: Option<bool>,
}

/// Resolved configuration with parsed values
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub default_response: SuggestedResponse,
    pub evaluation_date: Option<NaiveDate>,
    pub normalize_control_flags: bool,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl RiskscoreConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref response) = self.default_response {
            let parsed: SuggestedResponse = response
                .parse()
                .with_context(|| format!("invalid default_response: {}", response))?;
            if parsed == SuggestedResponse::Aceitar {
                anyhow::bail!(
                    "default_response cannot be Aceitar (it only applies to risks that require action)"
                );
            }
        }

        if let Some(ref date) = self.evaluation_date {
            if parse_iso_date(date).is_none() {
                anyhow::bail!("evaluation_date must be a YYYY-MM-DD date (got {})", date);
            }
        }

        Ok(())
    }

    /// Resolve config into parsed form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let default_response = match &self.default_response {
            Some(response) => response.parse()?,
            None => SuggestedResponse::default(),
        };

        Ok(ResolvedConfig {
            default_response,
            evaluation_date: self.evaluation_date.as_deref().and_then(parse_iso_date),
            normalize_control_flags: self.normalize_control_flags.unwrap_or(true),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        RiskscoreConfig::default().resolve()
    }

    /// Engine options derived from this configuration
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            default_response: self.default_response,
            normalize_control_flags: self.normalize_control_flags,
        }
    }

    /// The evaluation day: pinned date if configured, else `fallback`
    pub fn today_or(&self, fallback: NaiveDate) -> NaiveDate {
        self.evaluation_date.unwrap_or(fallback)
    }
}

/// Discover and load a config file from the project root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(RiskscoreConfig, PathBuf)>> {
    for name in CONFIG_FILE_NAMES {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<RiskscoreConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: RiskscoreConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (RiskscoreConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    tracing::debug!(config_path = ?resolved.config_path, "configuration resolved");
    Ok(resolved)
}
