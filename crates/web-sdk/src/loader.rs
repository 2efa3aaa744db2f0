//! Script loader: puts a third-party script on the page exactly once.

use tracing::debug;

use crate::dom::{Document, ScriptElement};

/// True iff a script element's resolved `src` equals `url` exactly.
/// No normalization is applied to `url`.
pub fn is_script_present(document: &dyn Document, url: &str) -> bool {
    document.script_sources().iter().any(|src| src == url)
}

/// Append an async classic script for `url` to the document head.
pub fn insert_script(document: &dyn Document, url: &str) {
    document.append_to_head(ScriptElement::async_classic(url));
    debug!(url, "script element inserted");
}

/// Insert the script unless one with the same source already exists.
/// Returns whether an element was inserted.
pub fn insert_script_if_absent(document: &dyn Document, url: &str) -> bool {
    if is_script_present(document, url) {
        debug!(url, "script already present, skipping insertion");
        return false;
    }
    insert_script(document, url);
    true
}
