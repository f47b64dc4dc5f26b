//! Shared HTTP client with connection pooling and settings integration.
//!
//! Wraps `reqwest::Client` and rebuilds it when settings change. Clones are
//! cheap and share the same underlying client.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::settings::Settings;
use crate::errors::{CanvasDropError, Result};

const USER_AGENT: &str = concat!("canvas-drop/", env!("CARGO_PKG_VERSION"));

/// A shared HTTP client that rebuilds itself when `Settings` change.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<RwLock<reqwest::Client>>,
}

impl HttpClient {
    /// Build a new `HttpClient` configured from the given `Settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Self::build_client(settings)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(client)),
        })
    }

    /// Build an `HttpClient` using `Settings::default()`.
    pub fn from_defaults() -> Result<Self> {
        Self::new(&Settings::default())
    }

    /// Get a clone of the current `reqwest::Client`.
    pub async fn get_client(&self) -> reqwest::Client {
        self.inner.read().await.clone()
    }

    /// Rebuild the inner client from updated settings.
    pub async fn update_from_settings(&self, settings: &Settings) -> Result<()> {
        let new_client = Self::build_client(settings)?;
        *self.inner.write().await = new_client;
        Ok(())
    }

    /// No overall request timeout is set: a stalled upload blocks until the
    /// server or the network gives up.
    fn build_client(settings: &Settings) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(settings.connect_timeout as u64))
            .pool_max_idle_per_host(settings.max_idle_conns_per_host as usize)
            .pool_idle_timeout(Duration::from_secs(settings.pool_idle_timeout as u64))
            .build()
            .map_err(|e| CanvasDropError::Config(format!("Failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_defaults() {
        let client = HttpClient::from_defaults().expect("should build from defaults");
        let _inner = client.get_client().await;
    }

    #[tokio::test]
    async fn test_update_from_settings() {
        let client = HttpClient::from_defaults().expect("should build");

        let mut settings = Settings::default();
        settings.connect_timeout = 1;
        settings.max_idle_conns_per_host = 2;

        client
            .update_from_settings(&settings)
            .await
            .expect("should update");
        let _inner = client.get_client().await;
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let client = HttpClient::from_defaults().expect("should build");
        let cloned = client.clone();

        client
            .update_from_settings(&Settings::default())
            .await
            .expect("should update");

        assert!(Arc::ptr_eq(&client.inner, &cloned.inner));
    }
}
