use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form user traits, forwarded to the vendor as `meta_data`.
pub type Traits = serde_json::Map<String, serde_json::Value>;

/// Customer classification the vendor attaches to an identified user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    #[default]
    Customer,
    Trial,
    Lead,
}

impl CustomerType {
    /// Action tag used on the vendor entry point.
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerType::Customer => "customer",
            CustomerType::Trial => "trial",
            CustomerType::Lead => "lead",
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(CustomerType::Customer),
            "trial" => Ok(CustomerType::Trial),
            "lead" => Ok(CustomerType::Lead),
            other => Err(format!("unknown customer type '{other}'")),
        }
    }
}

/// Lifecycle hooks the host pipeline can drive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Hook {
    Initialize,
    Ready,
    Identify,
    Loaded,
}

/// Payload handed to the `identify` hook.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentifyPayload {
    pub user_id: String,
    #[serde(default)]
    pub traits: Traits,
}

impl IdentifyPayload {
    pub fn new(user_id: impl Into<String>, traits: Traits) -> Self {
        Self {
            user_id: user_id.into(),
            traits,
        }
    }
}

/// Arguments of an ad-hoc conversion report. Both fields pass through unvalidated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversionArgs {
    pub external_id: Option<String>,
    pub amount: Option<f64>,
}

impl ConversionArgs {
    pub fn new(external_id: Option<String>, amount: Option<f64>) -> Self {
        Self {
            external_id,
            amount,
        }
    }
}
