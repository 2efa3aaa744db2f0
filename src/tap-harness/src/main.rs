//! Tapfiliate harness: runs the adapter against an in-memory page and prints
//! what ended up in the document and behind `window.tap`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use tapfiliate_core::config::AdapterConfig;
use tapfiliate_core::types::{ConversionArgs, CustomerType, Hook, Traits};
use tapfiliate_web_sdk::dom::ScriptElement;
use tapfiliate_web_sdk::plugin::PLUGIN_NAME;
use tapfiliate_web_sdk::{
    tapfiliate_plugin, AnalyticsHost, Environment, MemoryDocument, Page, VendorCall,
    VendorDispatch,
};

#[derive(Parser, Debug)]
#[command(name = "tap-harness")]
#[command(about = "Simulate a page session through the Tapfiliate tracking adapter")]
#[command(version)]
struct Cli {
    /// Optional TOML config file (environment variables still apply on top)
    #[arg(long, env = "TAPFILIATE_CONFIG")]
    config: Option<PathBuf>,

    /// Tapfiliate account id (overrides config)
    #[arg(long)]
    account_id: Option<String>,

    /// Customer type used for identify calls (overrides config)
    #[arg(long)]
    customer_type: Option<CustomerType>,

    /// Cookie domain passed to detect (overrides config)
    #[arg(long)]
    cookie_domain: Option<String>,

    /// Referral code query parameter passed to detect (overrides config)
    #[arg(long)]
    referral_code_param: Option<String>,

    /// Hooks to disable, comma separated (initialize,ready,identify,loaded)
    #[arg(long, value_delimiter = ',', value_parser = parse_hook)]
    disable: Vec<Hook>,

    /// Build the plugin for a server context instead of a page
    #[arg(long, default_value_t = false)]
    server: bool,

    /// Base URL of the simulated page
    #[arg(long, default_value = "https://localhost/")]
    base_url: String,

    /// Script sources already on the page before the adapter runs
    #[arg(long = "existing-script")]
    existing_scripts: Vec<String>,

    /// Identify this user after page load
    #[arg(long)]
    user_id: Option<String>,

    /// User trait as key=value; repeatable
    #[arg(long = "trait", value_parser = parse_trait)]
    traits: Vec<(String, serde_json::Value)>,

    /// Report a conversion with this external id
    #[arg(long)]
    conversion_id: Option<String>,

    /// Conversion amount
    #[arg(long)]
    amount: Option<f64>,

    /// Simulate the vendor script finishing its load
    #[arg(long, default_value_t = false)]
    script_loaded: bool,
}

fn parse_hook(s: &str) -> Result<Hook, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "initialize" => Ok(Hook::Initialize),
        "ready" => Ok(Hook::Ready),
        "identify" => Ok(Hook::Identify),
        "loaded" => Ok(Hook::Loaded),
        other => Err(format!("unknown hook '{other}'")),
    }
}

/// `key=value`; the value is read as JSON when it parses, else as a string.
fn parse_trait(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!(raw));
    Ok((key.to_string(), value))
}

/// Stand-in for the vendor script: records what it would have processed.
#[derive(Default)]
struct RecordedScript {
    calls: Mutex<Vec<VendorCall>>,
}

impl VendorDispatch for RecordedScript {
    fn dispatch(&self, call: VendorCall) {
        self.calls.lock().push(call);
    }
}

#[derive(Serialize)]
struct CallReport {
    #[serde(flatten)]
    call: VendorCall,
    arguments: Vec<serde_json::Value>,
}

impl From<VendorCall> for CallReport {
    fn from(call: VendorCall) -> Self {
        let arguments = call.arguments();
        Self { call, arguments }
    }
}

#[derive(Serialize)]
struct SessionReport {
    plugin: serde_json::Value,
    hooks_available: bool,
    failures: Vec<String>,
    scripts: Vec<ScriptElement>,
    object_marker: Option<String>,
    vendor_defined: bool,
    loaded: bool,
    queued: Vec<CallReport>,
    dispatched: Vec<CallReport>,
}

fn build_config(cli: &Cli) -> anyhow::Result<AdapterConfig> {
    let mut config = match &cli.config {
        Some(path) => AdapterConfig::load_with_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AdapterConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config from environment, using defaults");
            AdapterConfig::default()
        }),
    };

    if let Some(id) = &cli.account_id {
        config.account_id = Some(id.clone());
    }
    if let Some(customer_type) = cli.customer_type {
        config.customer_type = customer_type;
    }
    if let Some(domain) = &cli.cookie_domain {
        config.cookie_domain = Some(domain.clone());
    }
    if let Some(param) = &cli.referral_code_param {
        config.referral_code_param = Some(param.clone());
    }
    for hook in &cli.disable {
        config.disable.set(*hook, true);
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tap_harness=info,tapfiliate_web_sdk=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    info!(
        account_id = ?config.account_id,
        customer_type = %config.customer_type,
        server = cli.server,
        "Configuration loaded"
    );

    let document = Arc::new(
        MemoryDocument::with_base_url(&cli.base_url)
            .with_context(|| format!("invalid base url '{}'", cli.base_url))?,
    );
    for src in &cli.existing_scripts {
        document.append_to_body(ScriptElement::async_classic(src.clone()));
    }
    let page = Arc::new(Page::new(document.clone()));

    let environment = if cli.server {
        Environment::Server
    } else {
        Environment::Browser(page.clone())
    };

    let mut host = AnalyticsHost::new();
    host.register(tapfiliate_plugin(config, environment));

    let failures: Vec<String> = host
        .page_load()
        .into_iter()
        .map(|failure| format!("{:?}: {}", failure.hook, failure.error))
        .collect();

    if let Some(user_id) = &cli.user_id {
        let traits: Traits = cli.traits.iter().cloned().collect();
        host.identify(user_id, traits);
    } else {
        for (key, value) in &cli.traits {
            host.set_trait(key, value.clone());
        }
    }

    let script = Arc::new(RecordedScript::default());
    if cli.script_loaded && page.globals().is_vendor_defined() {
        page.globals().attach_vendor_script(script.clone());
    }

    if cli.conversion_id.is_some() || cli.amount.is_some() {
        host.conversion(
            PLUGIN_NAME,
            &ConversionArgs::new(cli.conversion_id.clone(), cli.amount),
        );
    }

    let plugin = host
        .plugin(PLUGIN_NAME)
        .context("tapfiliate plugin not registered")?;

    let report = SessionReport {
        plugin: serde_json::to_value(plugin.info())?,
        hooks_available: plugin.hooks().is_some(),
        failures,
        scripts: document.scripts(),
        object_marker: page.globals().object_marker(),
        vendor_defined: page.globals().is_vendor_defined(),
        loaded: host.loaded(),
        queued: page
            .globals()
            .pending_calls()
            .into_iter()
            .map(CallReport::from)
            .collect(),
        dispatched: script
            .calls
            .lock()
            .drain(..)
            .map(CallReport::from)
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
