//! Local JSON fixtures served in mock mode.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("Local mock not found: {0}")]
    NotFound(String),

    #[error("Local mock {path} is not valid JSON: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Directory of `<key>.json` fixtures.
#[derive(Debug, Clone)]
pub struct MockStore {
    dir: PathBuf,
}

impl MockStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load and parse the fixture for `key`.
    ///
    /// Keys are restricted to `[A-Za-z0-9_-]` so they cannot escape the
    /// fixture directory.
    pub async fn load(&self, key: &str) -> Result<Value, MockError> {
        if !is_valid_key(key) {
            return Err(MockError::NotFound(key.to_string()));
        }

        let path = self.dir.join(format!("{}.json", key));
        let display = path.display().to_string();
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| MockError::NotFound(display.clone()))?;

        serde_json::from_str(&contents).map_err(|source| MockError::Invalid {
            path: display,
            source,
        })
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
