use thiserror::Error;

pub type TrackingResult<T> = Result<T, TrackingError>;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),
}

impl TrackingError {
    /// True for misconfigurations the host is expected to surface to its operator.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::ConfigLoad(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;

    #[test]
    fn test_config_error_display() {
        let err = TrackingError::Config("No Tapfiliate account id defined".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: No Tapfiliate account id defined"
        );
        assert!(err.is_config());
    }

    #[test]
    fn test_malformed_toml_maps_to_config_load() {
        let err = AdapterConfig::from_toml_str("account_id = ").unwrap_err();
        assert!(matches!(err, TrackingError::ConfigLoad(_)));
        assert!(err.is_config());
        assert!(err.to_string().starts_with("Configuration load error"));
    }
}
