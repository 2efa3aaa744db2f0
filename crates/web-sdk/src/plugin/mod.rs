//! Analytics plugins: the surface the host pipeline drives.
//!
//! A plugin is built once per page for a given [`Environment`]. In a browser
//! it carries the full hook set ([`LifecycleHooks`]); anywhere else it is
//! reduced to its name and configuration, so no DOM access can be attempted.

pub mod tapfiliate;

use std::sync::Arc;

use serde::Serialize;

use tapfiliate_core::config::AdapterConfig;
use tapfiliate_core::error::TrackingResult;
use tapfiliate_core::types::IdentifyPayload;
use tapfiliate_core::user_state::UserStateSource;

use crate::page::Page;

pub use tapfiliate::TapfiliatePlugin;

/// Name the Tapfiliate plugin registers under.
pub const PLUGIN_NAME: &str = "tapfiliate-plugin";

/// Lifecycle hooks invoked by the host pipeline, in this order per page:
/// `initialize`, then `ready`, then `identify` whenever a user becomes known.
/// `loaded` may be probed at any time.
pub trait LifecycleHooks: Send + Sync {
    fn name(&self) -> &str;

    /// Fails only on misconfiguration; the host reports it and carries on.
    fn initialize(&self, config: &AdapterConfig) -> TrackingResult<()>;

    fn ready(&self, config: &AdapterConfig);

    fn identify(&self, config: &AdapterConfig, payload: &IdentifyPayload);

    fn loaded(&self, config: &AdapterConfig) -> bool;
}

/// Execution context the plugin is built for.
pub enum Environment {
    /// Running in a page; DOM and globals available.
    Browser(Arc<Page>),
    /// Server-side rendering or any other context without a document.
    Server,
}

impl Environment {
    pub fn is_browser(&self) -> bool {
        matches!(self, Environment::Browser(_))
    }
}

/// Static part of a plugin, present in every environment.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PluginInfo {
    pub name: &'static str,
    pub config: AdapterConfig,
}

/// A constructed plugin. The variant is fixed at construction.
pub enum Plugin {
    Browser(TapfiliatePlugin),
    Server(PluginInfo),
}

impl Plugin {
    pub fn info(&self) -> &PluginInfo {
        match self {
            Plugin::Browser(plugin) => plugin.info(),
            Plugin::Server(info) => info,
        }
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.info().config
    }

    /// Hook surface, absent outside a browser.
    pub fn hooks(&self) -> Option<&TapfiliatePlugin> {
        match self {
            Plugin::Browser(plugin) => Some(plugin),
            Plugin::Server(_) => None,
        }
    }

    /// Attach the host's live user state. No effect on a server surface.
    pub fn with_user_state(self, source: Arc<dyn UserStateSource>) -> Self {
        match self {
            Plugin::Browser(plugin) => Plugin::Browser(plugin.with_user_state(source)),
            server => server,
        }
    }
}

/// Build the Tapfiliate plugin for `environment`.
pub fn tapfiliate_plugin(config: AdapterConfig, environment: Environment) -> Plugin {
    let info = PluginInfo {
        name: PLUGIN_NAME,
        config,
    };
    match environment {
        Environment::Browser(page) => Plugin::Browser(TapfiliatePlugin::new(info, page)),
        Environment::Server => Plugin::Server(info),
    }
}
