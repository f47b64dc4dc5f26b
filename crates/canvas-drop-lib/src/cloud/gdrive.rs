//! Google Drive mirror client.
//!
//! Authenticates with the OAuth2 authorization-code flow, keeps the token in
//! a JSON file, and mirrors uploads into a named folder under My Drive.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RefreshToken, Scope, TokenUrl,
};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::token::{StoredToken, TokenStore};
use super::{decode_json, error_from_response, oauth_http_client, CloudClient, CloudMirror, MirroredFile};
use crate::config::settings::Settings;
use crate::errors::{CanvasDropError, Result};
use crate::http_client::HttpClient;
use crate::media::UploadFile;

// ---------------------------------------------------------------------------
// Data models
// ---------------------------------------------------------------------------

/// Metadata for a Google Drive file or folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GDriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(rename = "webViewLink", default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GDriveFileList {
    #[serde(default)]
    files: Vec<GDriveFile>,
}

/// Request body for creating a folder, and the metadata part of an upload.
#[derive(Debug, Clone, Serialize)]
struct GDriveCreateRequest<'a> {
    name: &'a str,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<Vec<&'a str>>,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const FILE_FIELDS: &str = "id,name,mimeType,webViewLink";
const SERVICE: &str = "Google Drive";

/// Base URLs the client talks to.
#[derive(Debug, Clone)]
pub struct GDriveEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub api_base: String,
    pub upload_base: String,
}

impl Default for GDriveEndpoints {
    fn default() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
        }
    }
}

type GoogleOAuthClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

// ---------------------------------------------------------------------------
// GDriveClient
// ---------------------------------------------------------------------------

pub struct GDriveClient {
    http: HttpClient,
    tokens: TokenStore,
    endpoints: GDriveEndpoints,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GDriveClient {
    /// Create a client using the Google credentials from `settings`.
    ///
    /// * `token_file` – where the OAuth2 token is persisted (`AppPaths::gdrive_token_file`)
    pub fn new(http: HttpClient, token_file: PathBuf, settings: &Settings) -> Self {
        Self {
            http,
            tokens: TokenStore::new(token_file),
            endpoints: GDriveEndpoints::default(),
            client_id: settings.gdrive_client_id.trim().to_string(),
            client_secret: settings.gdrive_client_secret.trim().to_string(),
            redirect_uri: settings.gdrive_redirect_uri.trim().to_string(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: GDriveEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    // -----------------------------------------------------------------------
    // OAuth2 helpers
    // -----------------------------------------------------------------------

    fn oauth2_client(&self) -> Result<GoogleOAuthClient> {
        if self.client_id.is_empty() {
            return Err(CanvasDropError::Config(
                "gdriveClientId is not set. Use `canvas-drop settings set gdriveClientId <id>`."
                    .into(),
            ));
        }
        let auth_url = AuthUrl::new(self.endpoints.auth_url.clone())
            .map_err(|e| CanvasDropError::OAuth2(format!("Invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(self.endpoints.token_url.clone())
            .map_err(|e| CanvasDropError::OAuth2(format!("Invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(self.redirect_uri.clone())
            .map_err(|e| CanvasDropError::OAuth2(format!("Invalid redirect URI: {e}")))?;

        let mut client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);
        if !self.client_secret.is_empty() {
            client = client.set_client_secret(ClientSecret::new(self.client_secret.clone()));
        }
        Ok(client)
    }

    /// Generate the authorization URL the user should visit.
    pub fn authorization_url(&self) -> Result<(String, CsrfToken)> {
        let client = self.oauth2_client()?;
        let (url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();
        Ok((url.to_string(), csrf))
    }

    /// Exchange an authorization code for tokens and persist them.
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken> {
        let client = self.oauth2_client()?;
        let http = oauth_http_client()?;

        let response = client
            .exchange_code(AuthorizationCode::new(code.trim().to_string()))
            .request_async(&http)
            .await
            .map_err(|e| CanvasDropError::OAuth2(format!("Token exchange failed: {e}")))?;

        let token = StoredToken::from_response(&response, None);
        self.tokens.save(&token).await?;
        tracing::info!("Saved Google Drive token");
        Ok(token)
    }

    /// Refresh the access token using the stored refresh token.
    pub async fn refresh_token(&self) -> Result<StoredToken> {
        let refresh = self
            .tokens
            .current()
            .await?
            .and_then(|t| t.refresh_token)
            .ok_or_else(|| {
                CanvasDropError::Auth("Google Drive session expired and cannot be refreshed".into())
            })?;

        let client = self.oauth2_client()?;
        let http = oauth_http_client()?;
        let response = client
            .exchange_refresh_token(&RefreshToken::new(refresh.clone()))
            .request_async(&http)
            .await
            .map_err(|e| CanvasDropError::OAuth2(format!("Token refresh failed: {e}")))?;

        let token = StoredToken::from_response(&response, Some(refresh));
        self.tokens.save(&token).await?;
        tracing::debug!("Refreshed Google Drive token");
        Ok(token)
    }

    /// Load a persisted token from disk.
    pub async fn load_token(&self) -> Result<Option<StoredToken>> {
        self.tokens.load().await
    }

    /// A valid access token, refreshing it when expired.
    async fn access_token(&self) -> Result<String> {
        let token = self.tokens.current().await?.ok_or_else(|| {
            CanvasDropError::Auth("Google Drive is not linked".into())
        })?;
        if !token.is_expired(Utc::now()) {
            return Ok(token.access_token);
        }
        Ok(self.refresh_token().await?.access_token)
    }

    // -----------------------------------------------------------------------
    // Drive operations
    // -----------------------------------------------------------------------

    /// Find a non-trashed folder called `name`.
    pub async fn find_folder(&self, name: &str) -> Result<Option<GDriveFile>> {
        let token = self.access_token().await?;
        let client = self.http.get_client().await;

        let q = format!(
            "name='{}' and mimeType='{FOLDER_MIME_TYPE}' and trashed=false",
            escape_query_value(name)
        );
        let fields = format!("files({FILE_FIELDS})");
        let resp = client
            .get(format!("{}/files", self.endpoints.api_base))
            .bearer_auth(&token)
            .query(&[("q", q.as_str()), ("fields", fields.as_str()), ("spaces", "drive")])
            .send()
            .await
            .map_err(CanvasDropError::network)?;

        if !resp.status().is_success() {
            return Err(error_from_response(SERVICE, "find_folder", resp).await);
        }

        let list: GDriveFileList = decode_json(resp).await?;
        Ok(list.files.into_iter().next())
    }

    /// Create a folder called `name` in the root of My Drive.
    pub async fn create_folder(&self, name: &str) -> Result<GDriveFile> {
        let token = self.access_token().await?;
        let client = self.http.get_client().await;

        let body = GDriveCreateRequest {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: None,
        };
        let resp = client
            .post(format!("{}/files", self.endpoints.api_base))
            .bearer_auth(&token)
            .query(&[("fields", FILE_FIELDS)])
            .json(&body)
            .send()
            .await
            .map_err(CanvasDropError::network)?;

        if !resp.status().is_success() {
            return Err(error_from_response(SERVICE, "create_folder", resp).await);
        }

        let folder: GDriveFile = decode_json(resp).await?;
        tracing::info!(folder = %folder.name, id = %folder.id, "Created Google Drive folder");
        Ok(folder)
    }

    /// Existing folder called `name`, or a newly created one.
    pub async fn ensure_folder(&self, name: &str) -> Result<GDriveFile> {
        match self.find_folder(name).await? {
            Some(folder) => Ok(folder),
            None => self.create_folder(name).await,
        }
    }

    /// Upload `file` into the folder `parent_id` as a multipart request.
    pub async fn upload_file(&self, file: &UploadFile, parent_id: &str) -> Result<GDriveFile> {
        let token = self.access_token().await?;
        let client = self.http.get_client().await;

        let metadata = serde_json::to_string(&GDriveCreateRequest {
            name: file.name(),
            mime_type: None,
            parents: Some(vec![parent_id]),
        })?;
        let metadata = Part::text(metadata)
            .mime_str("application/json")
            .map_err(|e| CanvasDropError::Application(format!("Invalid metadata part: {e}")))?;
        let content = Part::stream_with_length(file.data(), file.size())
            .file_name(file.name().to_string())
            .mime_str(file.content_type())
            .map_err(|e| {
                CanvasDropError::Application(format!(
                    "Invalid content type {:?}: {e}",
                    file.content_type()
                ))
            })?;
        let form = Form::new().part("metadata", metadata).part("file", content);

        let resp = client
            .post(format!("{}/files", self.endpoints.upload_base))
            .bearer_auth(&token)
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .multipart(form)
            .send()
            .await
            .map_err(CanvasDropError::network)?;

        if !resp.status().is_success() {
            return Err(error_from_response(SERVICE, "upload_file", resp).await);
        }

        decode_json(resp).await
    }
}

/// Escape a value for use inside a single-quoted Drive query string.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl CloudClient for GDriveClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn authenticate(&self) -> Result<()> {
        self.oauth2_client()?;
        if self.load_token().await?.is_some() {
            tracing::debug!("Loaded existing Google Drive token");
            return Ok(());
        }
        Err(CanvasDropError::Auth("Google Drive is not linked".into()))
    }
}

#[async_trait]
impl CloudMirror for GDriveClient {
    async fn mirror_file(&self, file: &UploadFile, folder: &str) -> Result<MirroredFile> {
        let parent = self.ensure_folder(folder).await?;
        let uploaded = self.upload_file(file, &parent.id).await?;
        tracing::info!(file = %uploaded.name, folder, "Mirrored to Google Drive");
        Ok(MirroredFile {
            service: SERVICE.to_string(),
            location: uploaded
                .web_view_link
                .clone()
                .unwrap_or_else(|| format!("{folder}/{}", uploaded.name)),
            id: uploaded.id,
            name: uploaded.name,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
