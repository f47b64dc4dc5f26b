//! OAuth2 tokens persisted between runs, one JSON file per provider.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use oauth2::basic::BasicTokenResponse;
use oauth2::TokenResponse;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::errors::Result;

/// Tokens are treated as expired this long before the provider says so.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Build from a token endpoint response.
    ///
    /// Providers may omit the refresh token on refresh; `previous_refresh`
    /// is kept in that case.
    pub fn from_response(resp: &BasicTokenResponse, previous_refresh: Option<String>) -> Self {
        let expires_at = resp
            .expires_in()
            .and_then(|d| Duration::from_std(d).ok())
            .map(|d| Utc::now() + d);
        Self {
            access_token: resp.access_token().secret().clone(),
            refresh_token: resp
                .refresh_token()
                .map(|t| t.secret().clone())
                .or(previous_refresh),
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }

    /// Tokens without an expiry never expire locally.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= at,
            None => false,
        }
    }
}

/// File-backed token with an in-memory copy.
pub struct TokenStore {
    path: PathBuf,
    cached: RwLock<Option<StoredToken>>,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the token file, if present, and cache it.
    pub async fn load(&self) -> Result<Option<StoredToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(&self.path).await?;
        let token: StoredToken = serde_json::from_str(&data)?;
        *self.cached.write().await = Some(token.clone());
        Ok(Some(token))
    }

    /// Cached token, falling back to the file.
    pub async fn current(&self) -> Result<Option<StoredToken>> {
        if let Some(token) = self.cached.read().await.clone() {
            return Ok(Some(token));
        }
        self.load().await
    }

    /// Persist and cache `token`.
    pub async fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(token)?;
        tokio::fs::write(&self.path, data).await?;
        *self.cached.write().await = Some(token.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_at: Option<DateTime<Utc>>) -> StoredToken {
        StoredToken {
            access_token: "ya29.xxx".into(),
            refresh_token: Some("1//xxx".into()),
            token_type: "Bearer".into(),
            expires_at,
        }
    }

    #[test]
    fn test_expiry_with_skew() {
        let now = Utc::now();
        assert!(!token(None).is_expired(now));
        assert!(!token(Some(now + Duration::seconds(3600))).is_expired(now));
        assert!(token(Some(now + Duration::seconds(30))).is_expired(now));
        assert!(token(Some(now - Duration::seconds(1))).is_expired(now));
    }

    #[test]
    fn test_from_response_keeps_previous_refresh() {
        let resp: BasicTokenResponse = serde_json::from_str(
            r#"{"access_token":"new","token_type":"bearer","expires_in":3600}"#,
        )
        .unwrap();
        let t = StoredToken::from_response(&resp, Some("old-refresh".into()));
        assert_eq!(t.access_token, "new");
        assert_eq!(t.refresh_token.as_deref(), Some("old-refresh"));
        assert!(t.expires_at.is_some());
        assert!(!t.is_expired(Utc::now()));
    }

    #[test]
    fn test_from_response_prefers_new_refresh() {
        let resp: BasicTokenResponse = serde_json::from_str(
            r#"{"access_token":"a","token_type":"bearer","refresh_token":"fresh"}"#,
        )
        .unwrap();
        let t = StoredToken::from_response(&resp, Some("old".into()));
        assert_eq!(t.refresh_token.as_deref(), Some("fresh"));
        assert_eq!(t.expires_at, None);
    }

    #[tokio::test]
    async fn test_store_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = TokenStore::new(tmp.path().join("none.json"));
        assert_eq!(store.current().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_save_and_reload() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested/token.json");
        let store = TokenStore::new(path.clone());
        let t = token(None);
        store.save(&t).await.unwrap();

        let fresh = TokenStore::new(path);
        assert_eq!(fresh.load().await.unwrap(), Some(t.clone()));
        assert_eq!(fresh.current().await.unwrap(), Some(t));
    }
}
