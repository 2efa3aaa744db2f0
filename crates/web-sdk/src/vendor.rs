//! Vendor call model: the closed set of shapes the `tap(...)` entry point
//! accepts, plus the page-global object that either queues or dispatches them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tapfiliate_core::types::{CustomerType, Traits};

/// Where the vendor serves its tracking script.
pub const VENDOR_SCRIPT_URL: &str = "https://script.tapfiliate.com/tapfiliate.js";

/// Global name of the vendor entry point.
pub const ENTRY_POINT: &str = "tap";

/// Global holding the entry point's name, read by the vendor's own bootstrap.
pub const OBJECT_MARKER: &str = "TapfiliateObject";

/// Integration tag sent with `create`.
pub const INTEGRATION_TAG: &str = "javascript";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOptions {
    pub integration: String,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            integration: INTEGRATION_TAG.to_string(),
        }
    }
}

/// Options for `detect`. Unset fields are omitted so the vendor applies its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_code_param: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetaOptions {
    pub meta_data: Traits,
}

/// One invocation of the vendor entry point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum VendorCall {
    Create {
        account_id: String,
        options: CreateOptions,
    },
    Detect {
        options: DetectOptions,
    },
    /// `customer`, `trial` or `lead`, depending on `customer_type`.
    Identify {
        customer_type: CustomerType,
        customer_id: String,
        options: MetaOptions,
    },
    Conversion {
        external_id: Option<String>,
        amount: Option<f64>,
        options: MetaOptions,
    },
}

impl VendorCall {
    pub fn create(account_id: impl Into<String>) -> Self {
        VendorCall::Create {
            account_id: account_id.into(),
            options: CreateOptions::default(),
        }
    }

    /// Leading action tag of the call.
    pub fn action(&self) -> &'static str {
        match self {
            VendorCall::Create { .. } => "create",
            VendorCall::Detect { .. } => "detect",
            VendorCall::Identify { customer_type, .. } => customer_type.as_str(),
            VendorCall::Conversion { .. } => "conversion",
        }
    }

    /// Positional argument list as the vendor script receives it.
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            VendorCall::Create {
                account_id,
                options,
            } => vec![json!(self.action()), json!(account_id), json!(options)],
            VendorCall::Detect { options } => vec![json!(self.action()), json!(options)],
            VendorCall::Identify {
                customer_id,
                options,
                ..
            } => vec![json!(self.action()), json!(customer_id), json!(options)],
            VendorCall::Conversion {
                external_id,
                amount,
                options,
            } => vec![
                json!(self.action()),
                json!(external_id),
                json!(amount),
                json!(options),
            ],
        }
    }
}

/// Receiver for calls once the real vendor script has taken over.
pub trait VendorDispatch: Send + Sync {
    fn dispatch(&self, call: VendorCall);
}

/// What currently sits behind the entry point.
#[derive(Clone)]
pub enum EntryPoint {
    /// Snippet placeholder; the queue appears on first invocation.
    Placeholder { queue: Option<Vec<VendorCall>> },
    /// The vendor's own implementation.
    Script(Arc<dyn VendorDispatch>),
}

/// The page-global vendor object (`window.tap`).
#[derive(Clone)]
pub struct VendorGlobal {
    pub entry: EntryPoint,
    pub loaded: Option<bool>,
}

impl VendorGlobal {
    pub fn placeholder() -> Self {
        Self {
            entry: EntryPoint::Placeholder { queue: None },
            loaded: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.entry, EntryPoint::Placeholder { .. })
    }

    /// Calls buffered by the placeholder, oldest first.
    pub fn queue(&self) -> Option<&[VendorCall]> {
        match &self.entry {
            EntryPoint::Placeholder { queue } => queue.as_deref(),
            EntryPoint::Script(_) => None,
        }
    }
}

impl std::fmt::Debug for VendorGlobal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entry = match &self.entry {
            EntryPoint::Placeholder { queue } => {
                format!("placeholder({} queued)", queue.as_ref().map_or(0, Vec::len))
            }
            EntryPoint::Script(_) => "script".to_string(),
        };
        f.debug_struct("VendorGlobal")
            .field("entry", &entry)
            .field("loaded", &self.loaded)
            .finish()
    }
}
