//! Site content keys and payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// JSON object stored for one content slot.
pub type ContentPayload = Map<String, Value>;

/// Opaque name of a content slot, e.g. `home.hero`.
///
/// Used verbatim as an equality-filter value; no structure is assumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContentKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
