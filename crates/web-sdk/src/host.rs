//! Reference host pipeline: registers plugins, drives their lifecycle hooks
//! in order, and owns the live user state.
//!
//! Hook failures are logged and collected, never propagated: a broken plugin
//! must not take the page down with it.

use std::sync::Arc;

use tracing::{debug, error, info};

use tapfiliate_core::error::TrackingError;
use tapfiliate_core::types::{ConversionArgs, Hook, IdentifyPayload, Traits};
use tapfiliate_core::user_state::{shared_user_state, UserState};

use crate::plugin::{LifecycleHooks, Plugin};

/// A hook that failed while the host was driving a plugin.
#[derive(Debug)]
pub struct HookFailure {
    pub plugin: String,
    pub hook: Hook,
    pub error: TrackingError,
}

/// Drives registered plugins through the page lifecycle.
pub struct AnalyticsHost {
    plugins: Vec<Plugin>,
    user_state: Arc<UserState>,
    page_loaded: bool,
}

impl AnalyticsHost {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            user_state: shared_user_state(),
            page_loaded: false,
        }
    }

    pub fn user_state(&self) -> &Arc<UserState> {
        &self.user_state
    }

    /// Register a plugin and hand it the host's live user state.
    pub fn register(&mut self, plugin: Plugin) {
        info!(
            plugin = plugin.name(),
            browser = plugin.hooks().is_some(),
            "plugin registered"
        );
        let plugin = plugin.with_user_state(self.user_state.clone());
        self.plugins.push(plugin);
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn plugin(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// Page load: `initialize` then `ready` on every plugin with hooks. Runs
    /// once per host; later calls return no failures and do nothing.
    pub fn page_load(&mut self) -> Vec<HookFailure> {
        if self.page_loaded {
            debug!("page already loaded, skipping lifecycle");
            return Vec::new();
        }
        self.page_loaded = true;

        let mut failures = Vec::new();
        for plugin in &self.plugins {
            let Some(hooks) = plugin.hooks() else {
                continue;
            };
            let config = plugin.config();
            if let Err(e) = hooks.initialize(config) {
                error!(plugin = plugin.name(), error = %e, "plugin initialize failed");
                failures.push(HookFailure {
                    plugin: plugin.name().to_string(),
                    hook: Hook::Initialize,
                    error: e,
                });
                continue;
            }
            hooks.ready(config);
        }

        info!(
            plugins = self.plugins.len(),
            failed = failures.len(),
            "page lifecycle started"
        );
        failures
    }

    /// Record the user in live state, then fan out to `identify` hooks.
    pub fn identify(&self, user_id: &str, traits: Traits) {
        self.user_state.identify(user_id, &traits);
        let payload = IdentifyPayload::new(user_id, traits);
        for plugin in &self.plugins {
            if let Some(hooks) = plugin.hooks() {
                hooks.identify(plugin.config(), &payload);
            }
        }
        debug!(user_id, "user identified");
    }

    /// Update one trait of the current user without re-identifying.
    pub fn set_trait(&self, key: &str, value: serde_json::Value) {
        self.user_state.set_trait(key, value);
    }

    /// Report a conversion through the named plugin. Returns whether a
    /// browser plugin by that name exists.
    pub fn conversion(&self, plugin_name: &str, args: &ConversionArgs) -> bool {
        match self.plugin(plugin_name).and_then(Plugin::hooks) {
            Some(hooks) => {
                hooks.conversion(args);
                true
            }
            None => {
                debug!(plugin = plugin_name, "no browser plugin for conversion");
                false
            }
        }
    }

    /// True when at least one plugin has hooks and every such plugin reports
    /// its vendor as loaded. Without any browser plugin there is no vendor.
    pub fn loaded(&self) -> bool {
        let probes: Vec<bool> = self
            .plugins
            .iter()
            .filter_map(|p| p.hooks().map(|hooks| hooks.loaded(p.config())))
            .collect();
        !probes.is_empty() && probes.iter().all(|loaded| *loaded)
    }
}

impl Default for AnalyticsHost {
    fn default() -> Self {
        Self::new()
    }
}
