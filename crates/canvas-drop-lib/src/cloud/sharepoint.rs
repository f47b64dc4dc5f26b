//! SharePoint / OneDrive mirror client over Microsoft Graph.
//!
//! Signs in with the OAuth2 device-code flow, resolves the document library
//! of the configured site, and mirrors uploads into a folder at its root.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, ClientId, DeviceAuthorizationUrl, EndpointNotSet, EndpointSet, RefreshToken, Scope,
    StandardDeviceAuthorizationResponse, TokenUrl,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OnceCell;

use super::token::{StoredToken, TokenStore};
use super::{decode_json, error_from_response, oauth_http_client, CloudClient, CloudMirror, MirroredFile};
use crate::config::settings::Settings;
use crate::errors::{CanvasDropError, Result};
use crate::http_client::HttpClient;
use crate::media::UploadFile;

const LOGIN_BASE: &str = "https://login.microsoftonline.com";
const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
const GRAPH_SCOPES: [&str; 3] = [
    "https://graph.microsoft.com/Files.ReadWrite.All",
    "https://graph.microsoft.com/Sites.ReadWrite.All",
    "offline_access",
];
const SERVICE: &str = "SharePoint";

type DeviceFlowClient = BasicClient<EndpointNotSet, EndpointSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// A Graph `driveItem` (the fields we use).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "webUrl", default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

/// Base URLs the client talks to.
#[derive(Debug, Clone)]
pub struct GraphEndpoints {
    /// Identity platform root; the tenant and `/oauth2/v2.0/...` are appended.
    pub login_base: String,
    pub graph_base: String,
}

impl Default for GraphEndpoints {
    fn default() -> Self {
        Self {
            login_base: LOGIN_BASE.to_string(),
            graph_base: GRAPH_BASE.to_string(),
        }
    }
}

/// A started device-code sign-in awaiting user confirmation.
pub struct DeviceLogin {
    details: StandardDeviceAuthorizationResponse,
}

impl DeviceLogin {
    pub fn verification_uri(&self) -> String {
        self.details.verification_uri().url().to_string()
    }

    pub fn user_code(&self) -> String {
        self.details.user_code().secret().to_string()
    }
}

pub struct SharePointClient {
    http: HttpClient,
    tokens: TokenStore,
    endpoints: GraphEndpoints,
    client_id: String,
    tenant_id: String,
    site_host: String,
    site_path: String,
    drive_id: OnceCell<String>,
}

impl SharePointClient {
    pub fn new(http: HttpClient, token_file: PathBuf, settings: &Settings) -> Self {
        let tenant = settings.ms_tenant_id.trim();
        Self {
            http,
            tokens: TokenStore::new(token_file),
            endpoints: GraphEndpoints::default(),
            client_id: settings.ms_client_id.trim().to_string(),
            tenant_id: if tenant.is_empty() { "common" } else { tenant }.to_string(),
            site_host: settings.sharepoint_host.trim().to_string(),
            site_path: settings.sharepoint_site_path.trim().to_string(),
            drive_id: OnceCell::new(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: GraphEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    // ── sign-in ─────────────────────────────────────────────────────

    fn oauth2_client(&self) -> Result<DeviceFlowClient> {
        if self.client_id.is_empty() {
            return Err(CanvasDropError::Config(
                "msClientId is not set. Use `canvas-drop settings set msClientId <id>`.".into(),
            ));
        }
        let authority = format!("{}/{}/oauth2/v2.0", self.endpoints.login_base, self.tenant_id);
        let device_url = DeviceAuthorizationUrl::new(format!("{authority}/devicecode"))
            .map_err(|e| CanvasDropError::OAuth2(format!("Invalid device code URL: {e}")))?;
        let token_url = TokenUrl::new(format!("{authority}/token"))
            .map_err(|e| CanvasDropError::OAuth2(format!("Invalid token URL: {e}")))?;

        Ok(BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_device_authorization_url(device_url)
            .set_token_uri(token_url)
            .set_auth_type(AuthType::RequestBody))
    }

    /// Request a device code; show its URI and user code to the user.
    pub async fn start_device_login(&self) -> Result<DeviceLogin> {
        let client = self.oauth2_client()?;
        let http = oauth_http_client()?;
        let details: StandardDeviceAuthorizationResponse = client
            .exchange_device_code()
            .add_scopes(GRAPH_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .request_async(&http)
            .await
            .map_err(|e| CanvasDropError::OAuth2(format!("Device code request failed: {e}")))?;
        Ok(DeviceLogin { details })
    }

    /// Poll until the user confirms the sign-in, then persist the token.
    pub async fn finish_device_login(&self, login: DeviceLogin) -> Result<StoredToken> {
        let client = self.oauth2_client()?;
        let http = oauth_http_client()?;
        let response = client
            .exchange_device_access_token(&login.details)
            .request_async(&http, tokio::time::sleep, None)
            .await
            .map_err(|e| CanvasDropError::OAuth2(format!("Device sign-in failed: {e}")))?;

        let token = StoredToken::from_response(&response, None);
        self.tokens.save(&token).await?;
        tracing::info!("Saved SharePoint token");
        Ok(token)
    }

    pub async fn refresh_token(&self) -> Result<StoredToken> {
        let refresh = self
            .tokens
            .current()
            .await?
            .and_then(|t| t.refresh_token)
            .ok_or_else(|| {
                CanvasDropError::Auth("SharePoint session expired and cannot be refreshed".into())
            })?;

        let client = self.oauth2_client()?;
        let http = oauth_http_client()?;
        let response = client
            .exchange_refresh_token(&RefreshToken::new(refresh.clone()))
            .add_scopes(GRAPH_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .request_async(&http)
            .await
            .map_err(|e| CanvasDropError::OAuth2(format!("Token refresh failed: {e}")))?;

        let token = StoredToken::from_response(&response, Some(refresh));
        self.tokens.save(&token).await?;
        tracing::debug!("Refreshed SharePoint token");
        Ok(token)
    }

    pub async fn load_token(&self) -> Result<Option<StoredToken>> {
        self.tokens.load().await
    }

    async fn access_token(&self) -> Result<String> {
        let token = self
            .tokens
            .current()
            .await?
            .ok_or_else(|| CanvasDropError::Auth("SharePoint is not linked".into()))?;
        if !token.is_expired(Utc::now()) {
            return Ok(token.access_token);
        }
        Ok(self.refresh_token().await?.access_token)
    }

    // ── Graph ───────────────────────────────────────────────────────

    async fn graph_get(&self, url: &str, operation: &str) -> Result<reqwest::Response> {
        let token = self.access_token().await?;
        let client = self.http.get_client().await;
        let resp = client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(CanvasDropError::network)?;
        if !resp.status().is_success() {
            return Err(error_from_response(SERVICE, operation, resp).await);
        }
        Ok(resp)
    }

    fn require_site(&self) -> Result<()> {
        if self.site_host.is_empty() || self.site_path.is_empty() {
            return Err(CanvasDropError::Config(
                "sharepointHost and sharepointSitePath must both be set".into(),
            ));
        }
        Ok(())
    }

    /// Graph id of the configured site.
    pub async fn site_id(&self) -> Result<String> {
        self.require_site()?;
        let path = format!("/{}", self.site_path.trim_start_matches('/'));
        let url = format!("{}/sites/{}:{path}", self.endpoints.graph_base, self.site_host);
        let resp = self.graph_get(&url, "site lookup").await?;
        let site: IdOnly = decode_json(resp).await?;
        Ok(site.id)
    }

    /// Id of the site's default document library, looked up once per client.
    pub async fn drive_id(&self) -> Result<String> {
        self.drive_id
            .get_or_try_init(|| async {
                let site_id = self.site_id().await?;
                let url = format!("{}/sites/{site_id}/drive", self.endpoints.graph_base);
                let resp = self.graph_get(&url, "drive lookup").await?;
                let drive: IdOnly = decode_json(resp).await?;
                tracing::debug!(drive_id = %drive.id, "Resolved SharePoint drive");
                Ok::<_, CanvasDropError>(drive.id)
            })
            .await
            .cloned()
    }

    /// Create `folder` at the drive root; an existing folder is left as is.
    pub async fn ensure_folder(&self, drive_id: &str, folder: &str) -> Result<()> {
        let token = self.access_token().await?;
        let client = self.http.get_client().await;
        let body = json!({
            "name": folder,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "fail",
        });
        let resp = client
            .post(format!("{}/drives/{drive_id}/root/children", self.endpoints.graph_base))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(CanvasDropError::network)?;

        match resp.status() {
            StatusCode::CONFLICT => Ok(()),
            s if s.is_success() => {
                tracing::info!(folder, "Created SharePoint folder");
                Ok(())
            }
            _ => Err(error_from_response(SERVICE, "create folder", resp).await),
        }
    }

    /// PUT the file's bytes to `root:/{folder}/{name}:/content`.
    pub async fn upload_file(
        &self,
        drive_id: &str,
        folder: &str,
        file: &UploadFile,
    ) -> Result<DriveItem> {
        let url = self.content_url(drive_id, folder, file.name())?;
        let token = self.access_token().await?;
        let client = self.http.get_client().await;
        let resp = client
            .put(url)
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, file.content_type())
            .body(file.data())
            .send()
            .await
            .map_err(CanvasDropError::network)?;

        if !resp.status().is_success() {
            return Err(error_from_response(SERVICE, "upload", resp).await);
        }
        decode_json(resp).await
    }

    fn content_url(&self, drive_id: &str, folder: &str, name: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.endpoints.graph_base)
            .map_err(|e| CanvasDropError::Config(format!("Invalid Graph URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CanvasDropError::Config("Invalid Graph URL".into()))?
            .pop_if_empty()
            .extend(["drives", drive_id, "root:"])
            .extend(folder.split('/').filter(|s| !s.is_empty()))
            .push(&format!("{name}:"))
            .push("content");
        Ok(url)
    }
}

#[async_trait]
impl CloudClient for SharePointClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn authenticate(&self) -> Result<()> {
        self.oauth2_client()?;
        self.require_site()?;
        if self.load_token().await?.is_some() {
            tracing::debug!("Loaded existing SharePoint token");
            return Ok(());
        }
        Err(CanvasDropError::Auth("SharePoint is not linked".into()))
    }
}

#[async_trait]
impl CloudMirror for SharePointClient {
    async fn mirror_file(&self, file: &UploadFile, folder: &str) -> Result<MirroredFile> {
        let drive_id = self.drive_id().await?;
        self.ensure_folder(&drive_id, folder).await?;
        let item = self.upload_file(&drive_id, folder, file).await?;
        tracing::info!(file = %item.name, folder, "Mirrored to SharePoint");
        Ok(MirroredFile {
            service: SERVICE.to_string(),
            location: item
                .web_url
                .clone()
                .unwrap_or_else(|| format!("{folder}/{}", item.name)),
            id: item.id,
            name: item.name,
        })
    }
}
