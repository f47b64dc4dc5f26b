use serde::{Deserialize, Serialize};

use crate::errors::{CanvasDropError, Result};

/// Persisted key-value settings.
///
/// Keys are camelCase on disk (`apiToken`, `canvasDomain`, ...). Missing keys
/// fall back to their defaults so older files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_token: String,
    pub canvas_domain: String,

    /// Seconds allowed for TCP/TLS connection setup. Requests themselves are
    /// never timed out.
    pub connect_timeout: u32,
    pub pool_idle_timeout: u32,
    pub max_idle_conns_per_host: u32,

    pub gdrive_client_id: String,
    pub gdrive_client_secret: String,
    pub gdrive_redirect_uri: String,
    pub gdrive_folder: String,

    pub ms_client_id: String,
    pub ms_tenant_id: String,
    pub sharepoint_host: String,
    pub sharepoint_site_path: String,
    pub sharepoint_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            canvas_domain: String::new(),
            connect_timeout: 10,
            pool_idle_timeout: 90,
            max_idle_conns_per_host: 10,
            gdrive_client_id: String::new(),
            gdrive_client_secret: String::new(),
            gdrive_redirect_uri: "http://localhost".into(),
            gdrive_folder: "MyFolder".into(),
            ms_client_id: String::new(),
            ms_tenant_id: "common".into(),
            sharepoint_host: String::new(),
            sharepoint_site_path: String::new(),
            sharepoint_folder: "Canvas_class".into(),
        }
    }
}

/// Placeholder shown instead of secret values.
const REDACTED: &str = "********";

impl Settings {
    /// The Canvas credential pair, if both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let domain = self.canvas_domain.trim();
        let token = self.api_token.trim();
        if domain.is_empty() || token.is_empty() {
            None
        } else {
            Some((domain, token))
        }
    }

    /// Reject values the HTTP client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout == 0 {
            return Err(CanvasDropError::Config(
                "connectTimeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in [&mut copy.api_token, &mut copy.gdrive_client_secret] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let s = Settings::default();
        assert_eq!(s.api_token, "");
        assert_eq!(s.canvas_domain, "");
        assert_eq!(s.connect_timeout, 10);
        assert_eq!(s.gdrive_folder, "MyFolder");
        assert_eq!(s.ms_tenant_id, "common");
        assert_eq!(s.sharepoint_folder, "Canvas_class");
    }

    #[test]
    fn test_camel_case_keys() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("apiToken"));
        assert!(obj.contains_key("canvasDomain"));
        assert!(obj.contains_key("connectTimeout"));
        assert!(obj.contains_key("gdriveClientId"));
        assert!(obj.contains_key("msTenantId"));
        assert!(obj.contains_key("sharepointSitePath"));
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{"apiToken":"t","canvasDomain":"canvas.example.edu"}"#)
                .unwrap();
        assert_eq!(s.api_token, "t");
        assert_eq!(s.canvas_domain, "canvas.example.edu");
        assert_eq!(s.connect_timeout, 10);
        assert_eq!(s.gdrive_folder, "MyFolder");
    }

    #[test]
    fn test_credentials_require_both() {
        let mut s = Settings::default();
        assert!(s.credentials().is_none());
        s.api_token = "tok".into();
        assert!(s.credentials().is_none());
        s.canvas_domain = " canvas.example.edu ".into();
        assert_eq!(s.credentials(), Some(("canvas.example.edu", "tok")));
    }

    #[test]
    fn test_validate_rejects_zero_connect_timeout() {
        assert!(Settings::default().validate().is_ok());
        let s = Settings {
            connect_timeout: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_redacted_masks_secrets_only() {
        let mut s = Settings::default();
        s.api_token = "secret".into();
        s.canvas_domain = "canvas.example.edu".into();
        let r = s.redacted();
        assert_eq!(r.api_token, REDACTED);
        assert_eq!(r.canvas_domain, "canvas.example.edu");
        // Empty secrets stay empty so "not set" is still visible.
        assert_eq!(r.gdrive_client_secret, "");
    }
}
