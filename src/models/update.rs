// src/models/update.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// URL of a page that changed since the registry was last cleared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Update(String);

impl Update {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&url::Url> for Update {
    fn from(url: &url::Url) -> Self {
        Self(url.to_string())
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
