//! Live user state: the host pipeline's view of the current user.
//!
//! The host owns and mutates it; adapters read it when they need the traits
//! as they are *now* rather than as they were at identify time.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::Traits;

/// Read access to the host's current user.
pub trait UserStateSource: Send + Sync {
    fn user_id(&self) -> Option<String>;
    fn traits(&self) -> Traits;
}

/// Source for hosts without user tracking. Always anonymous, never any traits.
pub struct AnonymousUser;

impl UserStateSource for AnonymousUser {
    fn user_id(&self) -> Option<String> {
        None
    }

    fn traits(&self) -> Traits {
        Traits::new()
    }
}

#[derive(Debug, Clone, Default)]
struct UserSnapshot {
    user_id: Option<String>,
    traits: Traits,
}

/// Mutable user state shared between the host and its plugins.
#[derive(Default)]
pub struct UserState {
    inner: RwLock<UserSnapshot>,
}

impl UserState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identity. Incoming traits are merged over the existing ones.
    pub fn identify(&self, user_id: impl Into<String>, traits: &Traits) {
        let mut snapshot = self.inner.write();
        snapshot.user_id = Some(user_id.into());
        for (key, value) in traits {
            snapshot.traits.insert(key.clone(), value.clone());
        }
    }

    pub fn set_trait(&self, key: impl Into<String>, value: serde_json::Value) {
        self.inner.write().traits.insert(key.into(), value);
    }

    pub fn reset(&self) {
        *self.inner.write() = UserSnapshot::default();
    }
}

impl UserStateSource for UserState {
    fn user_id(&self) -> Option<String> {
        self.inner.read().user_id.clone()
    }

    fn traits(&self) -> Traits {
        self.inner.read().traits.clone()
    }
}

/// Convenience: a source with no user.
pub fn anonymous_user() -> Arc<dyn UserStateSource> {
    Arc::new(AnonymousUser)
}

/// Convenience: fresh shared state for a host.
pub fn shared_user_state() -> Arc<UserState> {
    Arc::new(UserState::new())
}
