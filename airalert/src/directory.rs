//! JSON-file-backed observer directory.

use std::path::PathBuf;

use aircheck::observer::{Observer, ObserverDirectory};
use anyhow::Context;

/// Observer directory backed by a JSON array of records on disk.
///
/// The file is re-read on every query, so registrations maintained by an
/// external process are picked up mid-run. The alert engine itself never
/// writes it.
#[derive(Debug, Clone)]
pub struct JsonDirectory {
    path: PathBuf,
}

impl JsonDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> anyhow::Result<Vec<Observer>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading observer directory {}", self.path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("decoding observer directory {}", self.path.display()))
    }
}

impl ObserverDirectory for JsonDirectory {
    async fn find_by_identity(&self, identity: &str) -> anyhow::Result<Option<Observer>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|o| o.identity == identity))
    }

    async fn subscribed(&self) -> anyhow::Result<Vec<Observer>> {
        let mut observers = self.load().await?;
        observers.retain(|o| o.subscribed);
        Ok(observers)
    }
}
