// src/config.rs
//
// Application configuration
//
// PRINCIPLES:
// - Every setting has a default; a missing file is not an error
// - Explicit lookup order: RIGSMITH_CONFIG, then {CONFIG_DIR}/rigsmith/config.json
// - Environment overrides are applied last
// - Invalid values fail loudly with AppError::Config

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::domain::{CurrencyConverter, DEFAULT_HEADROOM_PERCENT};
use crate::error::{AppError, AppResult};
use crate::integrations::DEFAULT_BASE_URL;

pub const CONFIG_PATH_VAR: &str = "RIGSMITH_CONFIG";
pub const API_URL_VAR: &str = "RIGSMITH_API_URL";
pub const PAGE_SIZE_VAR: &str = "RIGSMITH_PAGE_SIZE";
pub const TIMEOUT_VAR: &str = "RIGSMITH_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Display-currency units per base-currency unit
    pub display_per_base: f64,
    pub display_symbol: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let converter = CurrencyConverter::default();
        Self {
            display_per_base: converter.display_per_base,
            display_symbol: converter.symbol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    pub headroom_percent: u32,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            headroom_percent: DEFAULT_HEADROOM_PERCENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChooserConfig {
    pub page_size: u32,
    /// Upper search bound in display currency
    pub default_max_price: f64,
}

impl Default for ChooserConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            default_max_price: 999_999.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub pricing: PricingConfig,
    pub power: PowerConfig,
    pub chooser: ChooserConfig,
}

impl AppConfig {
    /// Load from the usual locations, then apply environment overrides
    pub fn load() -> AppResult<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("{} is not valid: {}", path.display(), e))
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_VAR).filter(|v| !v.trim().is_empty()) {
            self.catalog.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(PAGE_SIZE_VAR) {
            self.chooser.page_size = parse_var(PAGE_SIZE_VAR, &raw)?;
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            self.catalog.timeout_secs = parse_var(TIMEOUT_VAR, &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.catalog.base_url.trim().is_empty() {
            return Err(AppError::Config("catalog.base_url is empty".to_string()));
        }
        if self.chooser.page_size == 0 {
            return Err(AppError::Config("chooser.page_size must be at least 1".to_string()));
        }
        if !(self.pricing.display_per_base.is_finite() && self.pricing.display_per_base > 0.0) {
            return Err(AppError::Config(
                "pricing.display_per_base must be a positive number".to_string(),
            ));
        }
        if self.power.headroom_percent < 100 {
            return Err(AppError::Config(
                "power.headroom_percent must be at least 100".to_string(),
            ));
        }
        Ok(())
    }

    pub fn currency(&self) -> CurrencyConverter {
        CurrencyConverter::new(
            self.pricing.display_per_base,
            self.pricing.display_symbol.clone(),
        )
    }
}

/// Config file location
///
/// Path structure: {CONFIG_DIR}/rigsmith/config.json
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join("rigsmith").join("config.json"))
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.catalog.base_url, "http://localhost:8000");
        assert_eq!(config.catalog.timeout(), Duration::from_secs(30));
        assert_eq!(config.chooser.page_size, 10);
        assert_eq!(config.power.headroom_percent, 120);
        assert!((config.pricing.display_per_base - 88.7).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"catalog": {{"base_url": "http://catalog:9000"}}}}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.catalog.base_url, "http://catalog:9000");
        assert_eq!(config.catalog.timeout_secs, 30);
        assert_eq!(config.chooser.page_size, 10);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (API_URL_VAR, "http://10.0.0.2:8000"),
            (PAGE_SIZE_VAR, "25"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.catalog.base_url, "http://10.0.0.2:8000");
        assert_eq!(config.chooser.page_size, 25);
        assert_eq!(config.catalog.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|name| (name == TIMEOUT_VAR).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_zero_page_size_fails_validation() {
        let mut config = AppConfig::default();
        config.chooser.page_size = 0;
        assert!(config.validate().is_err());
    }
}
