//! Minimal document model: just enough DOM for script management.
//!
//! The adapter only ever creates one kind of element (an async, classic
//! `<script>`) and only ever reads the `src` of existing script elements, so
//! [`Document`] exposes exactly those two capabilities.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use url::Url;

/// MIME type of a classic (non-module) script.
pub const CLASSIC_SCRIPT_TYPE: &str = "text/javascript";

/// A `<script>` element as seen by the adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptElement {
    /// `src` attribute; `None` for inline scripts.
    pub src: Option<String>,
    #[serde(rename = "async")]
    pub is_async: bool,
    #[serde(rename = "type")]
    pub script_type: String,
}

impl ScriptElement {
    /// An external classic script that loads without blocking the parser.
    pub fn async_classic(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            is_async: true,
            script_type: CLASSIC_SCRIPT_TYPE.to_string(),
        }
    }

    pub fn inline() -> Self {
        Self {
            src: None,
            is_async: false,
            script_type: CLASSIC_SCRIPT_TYPE.to_string(),
        }
    }
}

/// Document capabilities the adapter depends on.
pub trait Document: Send + Sync {
    /// Resolved `src` of every script element carrying one, in document order.
    fn script_sources(&self) -> Vec<String>;

    /// Append an element to the document head. Loading starts out of band.
    fn append_to_head(&self, element: ScriptElement);
}

/// In-process document used outside a real browser (tests, harness).
#[derive(Debug, Default)]
pub struct MemoryDocument {
    base_url: Option<Url>,
    head: Mutex<Vec<ScriptElement>>,
    body: Mutex<Vec<ScriptElement>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative `src` attributes resolve against `base`, as a browser would.
    pub fn with_base_url(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Some(Url::parse(base)?),
            ..Default::default()
        })
    }

    /// Add a script that was part of the page before the adapter ran.
    pub fn append_to_body(&self, element: ScriptElement) {
        self.body.lock().push(element);
    }

    pub fn head_scripts(&self) -> Vec<ScriptElement> {
        self.head.lock().clone()
    }

    /// All scripts in document order (head, then body).
    pub fn scripts(&self) -> Vec<ScriptElement> {
        let mut all = self.head.lock().clone();
        all.extend(self.body.lock().iter().cloned());
        all
    }

    fn resolve(&self, src: &str) -> String {
        match &self.base_url {
            Some(base) => base
                .join(src)
                .map(String::from)
                .unwrap_or_else(|_| src.to_string()),
            None => src.to_string(),
        }
    }
}

impl Document for MemoryDocument {
    fn script_sources(&self) -> Vec<String> {
        self.scripts()
            .iter()
            .filter_map(|script| script.src.as_deref())
            .map(|src| self.resolve(src))
            .collect()
    }

    fn append_to_head(&self, element: ScriptElement) {
        self.head.lock().push(element);
    }
}
