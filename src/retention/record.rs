use serde::{Deserialize, Serialize};

/// A deletable remote object and the timestamp it is ordered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub identifier: String,
    /// Lexically sortable ISO-8601-like timestamp.
    pub sort_key: String,
}

impl ArtifactRecord {
    pub fn new<I: Into<String>, K: Into<String>>(identifier: I, sort_key: K) -> Self {
        Self {
            identifier: identifier.into(),
            sort_key: sort_key.into(),
        }
    }

    /// Build the `package@version` identifier used for container images.
    pub fn image<K: Into<String>>(package: &str, version: &str, create_time: K) -> Self {
        Self::new(format!("{}@{}", package, version), create_time)
    }

    pub fn has_sort_key(&self) -> bool {
        !self.sort_key.trim().is_empty()
    }
}
