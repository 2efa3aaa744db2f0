//! Page environment: the document plus the page-global scope the vendor
//! object lives in.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::dom::{Document, MemoryDocument};
use crate::vendor::{EntryPoint, VendorCall, VendorDispatch, VendorGlobal, ENTRY_POINT};

/// Page-global slots shared by the adapter and the vendor script.
#[derive(Default)]
pub struct GlobalScope {
    vendor: RwLock<Option<VendorGlobal>>,
    object_marker: RwLock<Option<String>>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the queueing placeholder unless something already occupies the
    /// slot, and point the object marker at the entry point. Returns whether a
    /// placeholder was installed.
    pub fn bootstrap_vendor(&self) -> bool {
        *self.object_marker.write() = Some(ENTRY_POINT.to_string());

        let mut slot = self.vendor.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(VendorGlobal::placeholder());
        debug!(entry_point = ENTRY_POINT, "vendor placeholder installed");
        true
    }

    pub fn object_marker(&self) -> Option<String> {
        self.object_marker.read().clone()
    }

    pub fn is_vendor_defined(&self) -> bool {
        self.vendor.read().is_some()
    }

    /// Snapshot of the vendor object, if defined.
    pub fn vendor(&self) -> Option<VendorGlobal> {
        self.vendor.read().clone()
    }

    /// Invoke the entry point. Without a vendor object this is a silent no-op.
    /// Returns whether the call was queued or dispatched.
    pub fn call(&self, call: VendorCall) -> bool {
        let dispatcher = {
            let mut slot = self.vendor.write();
            let Some(global) = slot.as_mut() else {
                debug!(action = call.action(), "vendor entry point undefined, call dropped");
                return false;
            };
            match &mut global.entry {
                EntryPoint::Placeholder { queue } => {
                    debug!(action = call.action(), "vendor call queued");
                    queue.get_or_insert_with(Vec::new).push(call);
                    return true;
                }
                EntryPoint::Script(dispatcher) => Arc::clone(dispatcher),
            }
        };
        debug!(action = call.action(), "vendor call dispatched");
        dispatcher.dispatch(call);
        true
    }

    /// The vendor's `loaded` flag; `false` when the object or flag is absent.
    pub fn vendor_loaded(&self) -> bool {
        self.vendor
            .read()
            .as_ref()
            .and_then(|global| global.loaded)
            .unwrap_or(false)
    }

    /// Calls still waiting in the placeholder queue.
    pub fn pending_calls(&self) -> Vec<VendorCall> {
        self.vendor
            .read()
            .as_ref()
            .and_then(|global| global.queue().map(<[VendorCall]>::to_vec))
            .unwrap_or_default()
    }

    /// What the vendor script does when it finishes loading: take over the
    /// entry point, replay the queued calls in order and raise `loaded`.
    pub fn attach_vendor_script(&self, dispatcher: Arc<dyn VendorDispatch>) {
        let pending = {
            let mut slot = self.vendor.write();
            let previous = slot.replace(VendorGlobal {
                entry: EntryPoint::Script(Arc::clone(&dispatcher)),
                loaded: Some(true),
            });
            match previous.map(|global| global.entry) {
                Some(EntryPoint::Placeholder { queue }) => queue.unwrap_or_default(),
                _ => Vec::new(),
            }
        };
        debug!(replayed = pending.len(), "vendor script attached");
        for call in pending {
            dispatcher.dispatch(call);
        }
    }

    /// Overwrite the vendor's `loaded` flag.
    pub fn set_vendor_loaded(&self, loaded: Option<bool>) {
        if let Some(global) = self.vendor.write().as_mut() {
            global.loaded = loaded;
        }
    }
}

/// A browser-like page: one document, one global scope.
pub struct Page {
    document: Arc<dyn Document>,
    globals: GlobalScope,
}

impl Page {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            document,
            globals: GlobalScope::new(),
        }
    }

    /// A page backed by an empty [`MemoryDocument`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDocument::new()))
    }

    pub fn document(&self) -> &dyn Document {
        self.document.as_ref()
    }

    pub fn globals(&self) -> &GlobalScope {
        &self.globals
    }
}
