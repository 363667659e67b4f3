//! # Config Commands
//!
//! Commands for retrieving application configuration.

use tracing::debug;

use crate::state::AppConfig;

/// Gets the current application configuration.
///
/// ## When Used
/// - Startup (number format, default markup for the percentage field)
///
/// ## Returns
/// Complete configuration (read-only)
pub fn get_config(config: &AppConfig) -> AppConfig {
    debug!("get_config command");
    config.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_serializes_sections() {
        let json = serde_json::to_value(get_config(&AppConfig::default())).unwrap();
        assert_eq!(json["budget"]["fallback_rate"], 36.0);
        assert_eq!(json["display"]["decimal_separator"], ",");
        assert_eq!(json["rates"]["quote_currency"], "VES");
    }
}
