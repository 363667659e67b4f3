//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. CAMBIO_CONFIG (path to a TOML file, highest priority)              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cambio/cambio.toml (Linux)                               │
//! │     ~/Library/Application Support/com.cambio.budget/cambio.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     fallback rate 36.00, no markup, es-VE number format                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [rates]
//! enabled = true
//! endpoint = "https://api.exchangerate-api.com/v4/latest/USD"
//! quote_currency = "VES"
//! timeout_secs = 10
//!
//! [budget]
//! fallback_rate = 36.0
//! default_percentage = 0.0
//!
//! [display]
//! decimals = 2
//! thousands_separator = "."
//! decimal_separator = ","
//! ```
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use cambio_core::{Currency, RateInfo, RateStatus, DEFAULT_FALLBACK_RATE};
use cambio_rates::{RateConfig, RateError};

/// Environment variable holding an explicit config file path.
pub const CONFIG_PATH_ENV: &str = "CAMBIO_CONFIG";

// =============================================================================
// Config Errors
// =============================================================================

/// Why a config file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[rates]` section was rejected by the rate source.
    #[error("[rates] {0}")]
    Rates(#[from] RateError),

    #[error("[{section}] {message}")]
    Invalid {
        section: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(section: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            section,
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Budget Settings
// =============================================================================

/// Defaults for a new budget session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSettings {
    /// Rate used while the fetch is pending and after it fails.
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: f64,

    /// Markup percentage the session starts with.
    #[serde(default)]
    pub default_percentage: f64,
}

fn default_fallback_rate() -> f64 {
    DEFAULT_FALLBACK_RATE
}

impl Default for BudgetSettings {
    fn default() -> Self {
        BudgetSettings {
            fallback_rate: default_fallback_rate(),
            default_percentage: 0.0,
        }
    }
}

// =============================================================================
// Display Settings
// =============================================================================

/// How amounts are rendered for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Fractional digits shown.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,

    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
}

fn default_decimals() -> usize {
    2
}

fn default_thousands_separator() -> String {
    ".".to_string()
}

fn default_decimal_separator() -> String {
    ",".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            decimals: default_decimals(),
            thousands_separator: default_thousands_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl DisplaySettings {
    /// Formats an amount with grouped thousands and fixed decimals.
    ///
    /// ## Example
    /// ```rust
    /// use cambio_bridge_lib::state::DisplaySettings;
    ///
    /// let display = DisplaySettings::default();
    /// assert_eq!(display.format_amount(1500.0), "1.500,00");
    /// assert_eq!(display.format_amount(-1234567.891), "-1.234.567,89");
    /// ```
    pub fn format_amount(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return amount.to_string();
        }

        let fixed = format!("{:.*}", self.decimals, amount.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

        let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3);
        for (i, digit) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push_str(&self.thousands_separator);
            }
            grouped.push(digit);
        }

        if !frac_part.is_empty() {
            grouped.push_str(&self.decimal_separator);
            grouped.push_str(frac_part);
        }

        // No "-0,00" for tiny negatives that round to zero.
        let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
        if amount < 0.0 && !is_zero {
            grouped.insert(0, '-');
        }
        grouped
    }

    /// Formats an amount followed by its currency code.
    pub fn format_money(&self, amount: f64, currency: Currency) -> String {
        format!("{} {}", self.format_amount(amount), currency.code())
    }

    /// Renders the exchange-rate line shown above the form.
    ///
    /// ## Example
    /// ```rust
    /// use cambio_bridge_lib::state::DisplaySettings;
    /// use cambio_core::{RateInfo, RateStatus};
    ///
    /// let info = RateInfo { rate: 36.0, status: RateStatus::Fallback, fallback_rate: 36.0, settled_at: None };
    /// assert_eq!(DisplaySettings::default().rate_label(&info), "36,00 (por defecto)");
    /// ```
    pub fn rate_label(&self, info: &RateInfo) -> String {
        let rate = self.format_amount(info.rate);
        match info.status {
            RateStatus::Fetched => rate,
            RateStatus::Fallback => format!("{} (por defecto)", rate),
            RateStatus::Pending => format!("{} (cargando)", rate),
        }
    }
}

// =============================================================================
// Main Application Configuration
// =============================================================================

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Exchange-rate source.
    #[serde(default)]
    pub rates: RateConfig,

    /// Session defaults.
    #[serde(default)]
    pub budget: BudgetSettings,

    /// Number formatting.
    #[serde(default)]
    pub display: DisplaySettings,
}

impl AppConfig {
    /// Loads configuration from file and defaults.
    ///
    /// ## Load Order
    /// 1. `config_path`, if given
    /// 2. `CAMBIO_CONFIG`, if set
    /// 3. The platform config directory
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.rates.validate()?;

        let fallback = self.budget.fallback_rate;
        if !fallback.is_finite() || fallback <= 0.0 {
            return Err(ConfigError::invalid(
                "budget",
                format!("fallback_rate must be a positive number, got: {}", fallback),
            ));
        }

        if !self.budget.default_percentage.is_finite() {
            return Err(ConfigError::invalid("budget", "default_percentage must be a number"));
        }

        if self.display.decimals > 8 {
            return Err(ConfigError::invalid("display", "decimals must be at most 8"));
        }

        if self.display.decimal_separator.is_empty()
            || self.display.decimal_separator == self.display.thousands_separator
        {
            return Err(ConfigError::invalid(
                "display",
                "decimal_separator must be non-empty and differ from thousands_separator",
            ));
        }

        Ok(())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "cambio", "budget")
            .map(|dirs| dirs.config_dir().join("cambio.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fallback_info(rate: f64, status: RateStatus) -> RateInfo {
        RateInfo {
            rate,
            status,
            fallback_rate: 36.0,
            settled_at: None,
        }
    }

    #[test]
    fn test_format_amount() {
        let display = DisplaySettings::default();
        assert_eq!(display.format_amount(0.0), "0,00");
        assert_eq!(display.format_amount(7.5), "7,50");
        assert_eq!(display.format_amount(999.999), "1.000,00");
        assert_eq!(display.format_amount(1500.0), "1.500,00");
        assert_eq!(display.format_amount(36.71), "36,71");
        assert_eq!(display.format_amount(123456789.0), "123.456.789,00");
        assert_eq!(display.format_amount(-0.001), "0,00");
        assert_eq!(display.format_amount(-42.5), "-42,50");
    }

    #[test]
    fn test_format_amount_custom_separators() {
        let display = DisplaySettings {
            decimals: 0,
            thousands_separator: ",".into(),
            decimal_separator: ".".into(),
        };
        assert_eq!(display.format_amount(1234567.4), "1,234,567");
    }

    #[test]
    fn test_format_money() {
        let display = DisplaySettings::default();
        assert_eq!(display.format_money(240.0, Currency::Ves), "240,00 VES");
        assert_eq!(display.format_money(8.8, Currency::Usd), "8,80 USD");
    }

    #[test]
    fn test_rate_label() {
        let display = DisplaySettings::default();
        assert_eq!(display.rate_label(&fallback_info(40.0, RateStatus::Fetched)), "40,00");
        assert_eq!(
            display.rate_label(&fallback_info(36.0, RateStatus::Fallback)),
            "36,00 (por defecto)"
        );
        assert_eq!(
            display.rate_label(&fallback_info(36.0, RateStatus::Pending)),
            "36,00 (cargando)"
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.budget.fallback_rate, 36.0);
        assert_eq!(config.display.decimals, 2);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.budget.fallback_rate = 0.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { section: "budget", .. }));
        assert!(err.to_string().starts_with("[budget] fallback_rate"));

        config.budget.fallback_rate = 38.0;
        config.display.decimal_separator = ".".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { section: "display", .. })
        ));

        config.display.decimal_separator = ",".into();
        config.display.decimals = 12;
        assert!(config.validate().is_err());

        config.display.decimals = 2;
        config.rates.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Rates(_)));
        assert!(err.to_string().starts_with("[rates]"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("cambio-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[budget]\nfallback_rate = 38.5\n\n[rates]\nenabled = false").unwrap();

        let config = AppConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.budget.fallback_rate, 38.5);
        assert!(!config.rates.enabled);
        assert_eq!(config.display, DisplaySettings::default());
    }

    #[test]
    fn test_unparsable_file_is_parse_error() {
        let path = std::env::temp_dir().join(format!("cambio-test-syntax-{}.toml", std::process::id()));
        std::fs::write(&path, "[budget\nfallback_rate = ").unwrap();

        let result = AppConfig::load(Some(path.clone()));
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("cambio-test-does-not-exist.toml");
        assert_eq!(AppConfig::load(Some(path)).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("cambio-test-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[budget]\nfallback_rate = -1\n").unwrap();

        assert!(matches!(
            AppConfig::load(Some(path.clone())),
            Err(ConfigError::Invalid { section: "budget", .. })
        ));
        assert_eq!(AppConfig::load_or_default(Some(path.clone())), AppConfig::default());
        std::fs::remove_file(&path).ok();
    }
}
