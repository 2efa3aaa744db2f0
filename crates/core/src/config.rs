use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{TrackingError, TrackingResult};
use crate::types::{CustomerType, Hook};

/// Adapter configuration supplied by the host when the plugin is created.
/// Loadable from environment variables with the prefix `TAPFILIATE__` and
/// TOML config files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdapterConfig {
    /// Tapfiliate account id. Required by `initialize`.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// Query parameter carrying the referral code, when not the vendor's default.
    #[serde(default)]
    pub referral_code_param: Option<String>,
    #[serde(default)]
    pub disable: HookToggles,
}

/// Per-hook opt-outs. A disabled hook becomes a no-op.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookToggles {
    #[serde(default)]
    pub initialize: bool,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub identify: bool,
    #[serde(default)]
    pub loaded: bool,
}

impl HookToggles {
    pub fn is_disabled(&self, hook: Hook) -> bool {
        match hook {
            Hook::Initialize => self.initialize,
            Hook::Ready => self.ready,
            Hook::Identify => self.identify,
            Hook::Loaded => self.loaded,
        }
    }

    pub fn set(&mut self, hook: Hook, disabled: bool) {
        match hook {
            Hook::Initialize => self.initialize = disabled,
            Hook::Ready => self.ready = disabled,
            Hook::Identify => self.identify = disabled,
            Hook::Loaded => self.loaded = disabled,
        }
    }
}

impl AdapterConfig {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Default::default()
        }
    }

    pub fn with_customer_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = customer_type;
        self
    }

    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    pub fn with_referral_code_param(mut self, param: impl Into<String>) -> Self {
        self.referral_code_param = Some(param.into());
        self
    }

    pub fn with_disabled(mut self, hook: Hook) -> Self {
        self.disable.set(hook, true);
        self
    }

    pub fn is_disabled(&self, hook: Hook) -> bool {
        self.disable.is_disabled(hook)
    }

    /// The configured account id, or a configuration error when it is missing or empty.
    pub fn require_account_id(&self) -> TrackingResult<&str> {
        match self.account_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(TrackingError::Config(
                "No Tapfiliate account id defined".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn load() -> TrackingResult<Self> {
        let config = config::Config::builder()
            .add_source(env_source())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load from an optional TOML file, with environment variables layered on top.
    pub fn load_with_file(path: impl AsRef<Path>) -> TrackingResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(env_source())
            .build()?;
        let loaded: Self = config.try_deserialize()?;
        debug!(
            path = %path.as_ref().display(),
            has_account_id = loaded.account_id.is_some(),
            "adapter configuration loaded"
        );
        Ok(loaded)
    }

    pub fn from_toml_str(toml: &str) -> TrackingResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("TAPFILIATE")
        .separator("__")
        .try_parsing(true)
}
