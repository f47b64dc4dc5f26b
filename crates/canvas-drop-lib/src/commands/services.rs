//! `ServiceRegistry`, the holder for clients shared across command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::canvas::CanvasClient;
use crate::cloud::gdrive::GDriveClient;
use crate::cloud::sharepoint::SharePointClient;
use crate::cloud::{CloudMirror, MirrorKind};
use crate::config::manager::SettingsManager;
use crate::config::paths::AppPaths;
use crate::errors::{CanvasDropError, Result};
use crate::http_client::HttpClient;

/// Created once at startup and passed to the command dispatch layer.
///
/// Mirror clients are built on first use so commands that never touch them
/// do not read their token files.
pub struct ServiceRegistry {
    pub settings_manager: Arc<SettingsManager>,
    pub http_client: HttpClient,
    gdrive_token_file: PathBuf,
    sharepoint_token_file: PathBuf,
    gdrive: OnceCell<Arc<GDriveClient>>,
    sharepoint: OnceCell<Arc<SharePointClient>>,
}

impl ServiceRegistry {
    pub fn new(
        settings_manager: Arc<SettingsManager>,
        http_client: HttpClient,
        paths: &AppPaths,
    ) -> Self {
        Self {
            settings_manager,
            http_client,
            gdrive_token_file: paths.gdrive_token_file.clone(),
            sharepoint_token_file: paths.sharepoint_token_file.clone(),
            gdrive: OnceCell::new(),
            sharepoint: OnceCell::new(),
        }
    }

    /// Rebuild the shared `HttpClient` whenever settings change.
    ///
    /// Call once after construction.
    pub async fn register_config_listeners(&self) {
        let http = self.http_client.clone();
        self.settings_manager
            .register_on_change(move |settings| {
                let http = http.clone();
                let settings = settings.clone();
                tokio::spawn(async move {
                    if let Err(e) = http.update_from_settings(&settings).await {
                        tracing::warn!("Failed to update HttpClient from settings: {e}");
                    }
                });
            })
            .await;
    }

    /// A Canvas client for the stored domain and token.
    pub async fn canvas(&self) -> Result<CanvasClient> {
        let settings = self.settings_manager.get_settings().await;
        let (domain, token) = settings.credentials().ok_or_else(|| {
            CanvasDropError::Config("Please set up API credentials first".into())
        })?;
        Ok(CanvasClient::new(self.http_client.clone(), domain, token))
    }

    /// Lazily initialize and return the Google Drive client.
    pub async fn gdrive(&self) -> Result<&Arc<GDriveClient>> {
        self.gdrive
            .get_or_try_init(|| async {
                let settings = self.settings_manager.get_settings().await;
                Ok(Arc::new(GDriveClient::new(
                    self.http_client.clone(),
                    self.gdrive_token_file.clone(),
                    &settings,
                )))
            })
            .await
    }

    /// Lazily initialize and return the SharePoint client.
    pub async fn sharepoint(&self) -> Result<&Arc<SharePointClient>> {
        self.sharepoint
            .get_or_try_init(|| async {
                let settings = self.settings_manager.get_settings().await;
                Ok(Arc::new(SharePointClient::new(
                    self.http_client.clone(),
                    self.sharepoint_token_file.clone(),
                    &settings,
                )))
            })
            .await
    }

    /// The mirror backend for `kind`.
    pub async fn mirror(&self, kind: MirrorKind) -> Result<Arc<dyn CloudMirror>> {
        let mirror: Arc<dyn CloudMirror> = match kind {
            MirrorKind::GDrive => self.gdrive().await?.clone(),
            MirrorKind::SharePoint => self.sharepoint().await?.clone(),
        };
        Ok(mirror)
    }

    /// Folder used for `kind` when `--folder` is not given.
    pub async fn default_folder(&self, kind: MirrorKind) -> String {
        let settings = self.settings_manager.get_settings().await;
        match kind {
            MirrorKind::GDrive => settings.gdrive_folder,
            MirrorKind::SharePoint => settings.sharepoint_folder,
        }
    }
}
