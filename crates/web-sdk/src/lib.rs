//! Browser-side Tapfiliate tracking adapter: script injection, the `tap`
//! call-queue shim, and lifecycle hooks for an analytics host pipeline.
//!
//! # Modules
//!
//! - [`dom`]: Document abstraction and an in-memory implementation
//! - [`loader`]: Idempotent script injection
//! - [`vendor`]: Vendor call variants and the global vendor object
//! - [`page`]: Page environment: document plus global scope
//! - [`plugin`]: Plugin surface and the Tapfiliate hook translator
//! - [`host`]: Reference host pipeline driving plugins

pub mod dom;
pub mod host;
pub mod loader;
pub mod page;
pub mod plugin;
pub mod vendor;

pub use dom::{Document, MemoryDocument, ScriptElement};
pub use host::AnalyticsHost;
pub use page::{GlobalScope, Page};
pub use plugin::{tapfiliate_plugin, Environment, LifecycleHooks, Plugin, TapfiliatePlugin};
pub use vendor::{VendorCall, VendorDispatch};
