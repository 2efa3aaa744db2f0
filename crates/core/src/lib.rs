//! Shared types for the Tapfiliate tracking adapter: configuration, errors,
//! lifecycle payloads, and the host's live user state.

pub mod config;
pub mod error;
pub mod types;
pub mod user_state;

pub use self::config::{AdapterConfig, HookToggles};
pub use error::{TrackingError, TrackingResult};
pub use types::{ConversionArgs, CustomerType, Hook, IdentifyPayload, Traits};
pub use user_state::{UserState, UserStateSource};
