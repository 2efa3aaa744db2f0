//! Tapfiliate adapter: loads `tapfiliate.js`, bootstraps `window.tap` and
//! translates lifecycle hooks into `tap(...)` calls.

use std::sync::Arc;

use tracing::{debug, info};

use tapfiliate_core::config::AdapterConfig;
use tapfiliate_core::error::TrackingResult;
use tapfiliate_core::types::{ConversionArgs, Hook, IdentifyPayload};
use tapfiliate_core::user_state::{anonymous_user, UserStateSource};

use super::{LifecycleHooks, PluginInfo};
use crate::loader::insert_script_if_absent;
use crate::page::Page;
use crate::vendor::{DetectOptions, MetaOptions, VendorCall, VENDOR_SCRIPT_URL};

/// Browser-side Tapfiliate plugin.
pub struct TapfiliatePlugin {
    info: PluginInfo,
    page: Arc<Page>,
    user_state: Arc<dyn UserStateSource>,
}

impl TapfiliatePlugin {
    pub fn new(info: PluginInfo, page: Arc<Page>) -> Self {
        Self {
            info,
            page,
            user_state: anonymous_user(),
        }
    }

    /// Source of the traits reported with conversions.
    pub fn with_user_state(mut self, source: Arc<dyn UserStateSource>) -> Self {
        self.user_state = source;
        self
    }

    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.info.config
    }

    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    /// Report a conversion with the user's traits as they are right now.
    /// Neither argument is validated.
    pub fn conversion(&self, args: &ConversionArgs) {
        let call = VendorCall::Conversion {
            external_id: args.external_id.clone(),
            amount: args.amount,
            options: MetaOptions {
                meta_data: self.user_state.traits(),
            },
        };
        debug!(
            external_id = ?args.external_id,
            amount = ?args.amount,
            "reporting conversion"
        );
        self.page.globals().call(call);
    }
}

impl LifecycleHooks for TapfiliatePlugin {
    fn name(&self) -> &str {
        self.info.name
    }

    fn initialize(&self, config: &AdapterConfig) -> TrackingResult<()> {
        if config.is_disabled(Hook::Initialize) {
            debug!(plugin = self.info.name, "initialize disabled");
            return Ok(());
        }
        let account_id = config.require_account_id()?;

        let inserted = insert_script_if_absent(self.page.document(), VENDOR_SCRIPT_URL);
        let globals = self.page.globals();
        globals.bootstrap_vendor();
        globals.call(VendorCall::create(account_id));

        info!(
            plugin = self.info.name,
            account_id,
            script_inserted = inserted,
            "tapfiliate initialized"
        );
        Ok(())
    }

    fn ready(&self, config: &AdapterConfig) {
        if config.is_disabled(Hook::Ready) {
            return;
        }
        self.page.globals().call(VendorCall::Detect {
            options: DetectOptions {
                cookie_domain: config.cookie_domain.clone(),
                referral_code_param: config.referral_code_param.clone(),
            },
        });
    }

    fn identify(&self, config: &AdapterConfig, payload: &IdentifyPayload) {
        if config.is_disabled(Hook::Identify) {
            return;
        }
        self.page.globals().call(VendorCall::Identify {
            customer_type: config.customer_type,
            customer_id: payload.user_id.clone(),
            options: MetaOptions {
                meta_data: payload.traits.clone(),
            },
        });
    }

    fn loaded(&self, config: &AdapterConfig) -> bool {
        if config.is_disabled(Hook::Loaded) {
            return false;
        }
        self.page.globals().vendor_loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, MemoryDocument, ScriptElement};
    use crate::plugin::{tapfiliate_plugin, Environment, Plugin};
    use serde_json::json;
    use tapfiliate_core::types::{CustomerType, Traits};
    use tapfiliate_core::user_state::{shared_user_state, UserState};

    fn traits(value: serde_json::Value) -> Traits {
        value.as_object().cloned().unwrap()
    }

    struct Fixture {
        document: Arc<MemoryDocument>,
        page: Arc<Page>,
    }

    fn fixture() -> Fixture {
        let document = Arc::new(MemoryDocument::new());
        let page = Arc::new(Page::new(document.clone()));
        Fixture { document, page }
    }

    fn browser_plugin(fx: &Fixture, config: AdapterConfig) -> TapfiliatePlugin {
        match tapfiliate_plugin(config, Environment::Browser(fx.page.clone())) {
            Plugin::Browser(plugin) => plugin,
            Plugin::Server(_) => panic!("expected browser plugin"),
        }
    }

    fn vendor_script_count(document: &MemoryDocument) -> usize {
        document
            .script_sources()
            .iter()
            .filter(|src| src.as_str() == VENDOR_SCRIPT_URL)
            .count()
    }

    #[test]
    fn test_initialize_loads_bootstraps_and_creates() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1"));

        plugin.initialize(plugin.config()).unwrap();

        assert_eq!(vendor_script_count(&fx.document), 1);
        let globals = fx.page.globals();
        assert!(globals.is_vendor_defined());
        assert_eq!(globals.object_marker().as_deref(), Some("tap"));
        assert_eq!(globals.pending_calls(), vec![VendorCall::create("acct-1")]);
        assert_eq!(
            globals.pending_calls()[0].arguments()[2],
            json!({"integration": "javascript"})
        );
    }

    #[test]
    fn test_repeated_initialize_inserts_one_script() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1"));

        for _ in 0..3 {
            plugin.initialize(plugin.config()).unwrap();
        }

        assert_eq!(vendor_script_count(&fx.document), 1);
        assert_eq!(fx.page.globals().pending_calls().len(), 3);
    }

    #[test]
    fn test_initialize_with_existing_page_script() {
        let fx = fixture();
        fx.document
            .append_to_body(ScriptElement::async_classic(VENDOR_SCRIPT_URL));
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1"));

        plugin.initialize(plugin.config()).unwrap();

        assert_eq!(vendor_script_count(&fx.document), 1);
        assert!(fx.document.head_scripts().is_empty());
        assert!(fx.page.globals().is_vendor_defined());
    }

    #[test]
    fn test_initialize_without_account_id_fails_cleanly() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::default());

        let err = plugin.initialize(plugin.config()).unwrap_err();
        assert!(err.is_config());
        assert_eq!(vendor_script_count(&fx.document), 0);
        assert!(!fx.page.globals().is_vendor_defined());
        assert!(fx.page.globals().pending_calls().is_empty());
    }

    #[test]
    fn test_initialize_disabled_does_nothing() {
        let fx = fixture();
        let config = AdapterConfig::new("acct-1").with_disabled(Hook::Initialize);
        let plugin = browser_plugin(&fx, config);

        plugin.initialize(plugin.config()).unwrap();

        assert!(fx.document.scripts().is_empty());
        assert!(!fx.page.globals().is_vendor_defined());
        assert!(fx.page.globals().object_marker().is_none());
    }

    #[test]
    fn test_initialize_disabled_skips_account_check() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::default().with_disabled(Hook::Initialize));
        assert!(plugin.initialize(plugin.config()).is_ok());
    }

    #[test]
    fn test_ready_issues_detect_with_overrides() {
        let fx = fixture();
        let config = AdapterConfig::new("acct-1")
            .with_cookie_domain(".shop.example")
            .with_referral_code_param("via");
        let plugin = browser_plugin(&fx, config);
        plugin.initialize(plugin.config()).unwrap();

        plugin.ready(plugin.config());

        let calls = fx.page.globals().pending_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1].arguments(),
            vec![
                json!("detect"),
                json!({"cookie_domain": ".shop.example", "referral_code_param": "via"}),
            ]
        );
    }

    #[test]
    fn test_ready_disabled_is_noop() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1").with_disabled(Hook::Ready));
        plugin.initialize(plugin.config()).unwrap();

        plugin.ready(plugin.config());

        assert_eq!(fx.page.globals().pending_calls().len(), 1);
    }

    #[test]
    fn test_ready_before_initialize_is_silent() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1"));
        plugin.ready(plugin.config());
        assert!(!fx.page.globals().is_vendor_defined());
    }

    #[test]
    fn test_identify_default_customer_type() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1"));
        plugin.initialize(plugin.config()).unwrap();

        plugin.identify(
            plugin.config(),
            &IdentifyPayload::new("u1", traits(json!({"plan": "pro"}))),
        );

        let calls = fx.page.globals().pending_calls();
        let identify: Vec<_> = calls.iter().filter(|c| c.action() == "customer").collect();
        assert_eq!(identify.len(), 1);
        assert_eq!(
            identify[0].arguments(),
            vec![json!("customer"), json!("u1"), json!({"meta_data": {"plan": "pro"}})]
        );
    }

    #[test]
    fn test_identify_trial_customer_type() {
        let fx = fixture();
        let config = AdapterConfig::new("acct-1").with_customer_type(CustomerType::Trial);
        let plugin = browser_plugin(&fx, config);
        plugin.initialize(plugin.config()).unwrap();

        plugin.identify(
            plugin.config(),
            &IdentifyPayload::new("u1", traits(json!({"plan": "pro"}))),
        );

        let calls = fx.page.globals().pending_calls();
        assert_eq!(calls.last().unwrap().action(), "trial");
        assert!(calls.iter().all(|c| c.action() != "customer"));
    }

    #[test]
    fn test_identify_disabled_is_noop() {
        let fx = fixture();
        let plugin =
            browser_plugin(&fx, AdapterConfig::new("acct-1").with_disabled(Hook::Identify));
        plugin.initialize(plugin.config()).unwrap();

        plugin.identify(plugin.config(), &IdentifyPayload::new("u1", Traits::new()));

        assert_eq!(fx.page.globals().pending_calls().len(), 1);
    }

    #[test]
    fn test_loaded_probe() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1"));
        assert!(!plugin.loaded(plugin.config()));

        plugin.initialize(plugin.config()).unwrap();
        assert!(!plugin.loaded(plugin.config()));

        fx.page.globals().set_vendor_loaded(Some(true));
        assert!(plugin.loaded(plugin.config()));

        fx.page.globals().set_vendor_loaded(Some(false));
        assert!(!plugin.loaded(plugin.config()));
    }

    #[test]
    fn test_loaded_disabled_always_false() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1").with_disabled(Hook::Loaded));
        plugin.initialize(plugin.config()).unwrap();
        fx.page.globals().set_vendor_loaded(Some(true));

        assert!(!plugin.loaded(plugin.config()));
    }

    #[test]
    fn test_conversion_uses_live_traits() {
        let fx = fixture();
        let state: Arc<UserState> = shared_user_state();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1")).with_user_state(state.clone());
        plugin.initialize(plugin.config()).unwrap();

        let identify_traits = traits(json!({"plan": "free"}));
        state.identify("u1", &identify_traits);
        plugin.identify(plugin.config(), &IdentifyPayload::new("u1", identify_traits));
        state.set_trait("plan", json!("pro"));

        plugin.conversion(&ConversionArgs::new(Some("tx-1".into()), Some(42.0)));

        let calls = fx.page.globals().pending_calls();
        let conversions: Vec<_> = calls.iter().filter(|c| c.action() == "conversion").collect();
        assert_eq!(conversions.len(), 1);
        assert_eq!(
            conversions[0],
            &VendorCall::Conversion {
                external_id: Some("tx-1".into()),
                amount: Some(42.0),
                options: MetaOptions {
                    meta_data: traits(json!({"plan": "pro"})),
                },
            }
        );
    }

    #[test]
    fn test_conversion_passes_absent_values() {
        let fx = fixture();
        let plugin = browser_plugin(&fx, AdapterConfig::new("acct-1"));
        plugin.initialize(plugin.config()).unwrap();

        plugin.conversion(&ConversionArgs::default());

        let calls = fx.page.globals().pending_calls();
        assert_eq!(
            calls.last().unwrap().arguments(),
            vec![json!("conversion"), json!(null), json!(null), json!({"meta_data": {}})]
        );
    }
}
