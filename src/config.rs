// Runtime tunables for the shell core

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ShellError, ShellResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Columns used when a grid domain is registered without an explicit count
    pub default_grid_columns: usize,
    /// How much harder perpendicular offset counts than distance in spatial layouts
    pub perpendicular_weight: f64,
    /// Domain that takes over when the active domain is unregistered.
    /// `None` leaves the shell without an active domain until the display layer picks one.
    pub fallback_domain: Option<String>,
    /// Buffered events per broadcast subscriber before it starts lagging
    pub event_capacity: usize,
    pub title_prefix: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            default_grid_columns: 3,
            perpendicular_weight: 2.0,
            fallback_domain: None,
            event_capacity: 64,
            title_prefix: "Window - ".to_string(),
        }
    }
}

impl ShellConfig {
    pub fn from_json_str(json: &str) -> ShellResult<Self> {
        let config: ShellConfig = serde_json::from_str(json)
            .map_err(|e| ShellError::InvalidArgument(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ShellResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ShellError::InvalidArgument(format!("config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> ShellResult<()> {
        if self.default_grid_columns == 0 {
            return Err(ShellError::InvalidArgument(
                "default_grid_columns must be at least 1".to_string(),
            ));
        }
        if !self.perpendicular_weight.is_finite() || self.perpendicular_weight < 0.0 {
            return Err(ShellError::InvalidArgument(
                "perpendicular_weight must be a non-negative number".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ShellError::InvalidArgument(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ShellConfig::from_json_str(r#"{ "fallback_domain": "osbar-nav" }"#).unwrap();
        assert_eq!(config.fallback_domain.as_deref(), Some("osbar-nav"));
        assert_eq!(config.default_grid_columns, 3);
        assert_eq!(config.perpendicular_weight, 2.0);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = ShellConfig::from_json_str(r#"{ "grid": 4 }"#);
        assert!(matches!(result, Err(ShellError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_columns_rejected() {
        let result = ShellConfig::from_json_str(r#"{ "default_grid_columns": 0 }"#);
        assert!(result.is_err());
    }
}
