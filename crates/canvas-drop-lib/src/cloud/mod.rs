pub mod gdrive;
pub mod sharepoint;
pub mod token;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{CanvasDropError, Result};
use crate::media::UploadFile;

/// Common trait for cloud storage integrations.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Display name of the provider (e.g. "Google Drive").
    fn name(&self) -> &str;

    /// Succeeds when a usable stored token exists; never prompts.
    async fn authenticate(&self) -> Result<()>;
}

/// A backend that keeps a second copy of files uploaded to Canvas.
#[async_trait]
pub trait CloudMirror: CloudClient {
    /// Copy `file` into `folder`, creating the folder when missing.
    async fn mirror_file(&self, file: &UploadFile, folder: &str) -> Result<MirroredFile>;
}

/// Where a mirrored copy ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirroredFile {
    pub service: String,
    pub id: String,
    pub name: String,
    /// Web link when the provider returns one, else `folder/name`.
    pub location: String,
}

/// Mirror backends selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorKind {
    GDrive,
    SharePoint,
}

impl FromStr for MirrorKind {
    type Err = CanvasDropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gdrive" | "google" | "google-drive" => Ok(MirrorKind::GDrive),
            "sharepoint" | "onedrive" | "graph" => Ok(MirrorKind::SharePoint),
            other => Err(CanvasDropError::Command(format!(
                "Unknown mirror '{other}' (expected gdrive or sharepoint)"
            ))),
        }
    }
}

impl fmt::Display for MirrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorKind::GDrive => write!(f, "gdrive"),
            MirrorKind::SharePoint => write!(f, "sharepoint"),
        }
    }
}

/// Turn a non-2xx provider response into a `Cloud` error carrying its body.
pub(crate) async fn error_from_response(
    service: &str,
    operation: &str,
    resp: reqwest::Response,
) -> CanvasDropError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    CanvasDropError::Cloud {
        service: service.to_string(),
        message: format!("{operation} failed ({status}): {body}"),
    }
}

/// Read a 2xx provider body and decode it.
pub(crate) async fn decode_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let body = resp.text().await.map_err(CanvasDropError::network)?;
    Ok(serde_json::from_str(&body)?)
}

/// HTTP client for OAuth2 token endpoints; redirects are not followed.
pub(crate) fn oauth_http_client() -> Result<oauth2::reqwest::Client> {
    oauth2::reqwest::ClientBuilder::new()
        .redirect(oauth2::reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| CanvasDropError::OAuth2(format!("Failed to build OAuth2 HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_kind_parse() {
        assert_eq!("gdrive".parse::<MirrorKind>().unwrap(), MirrorKind::GDrive);
        assert_eq!("Google".parse::<MirrorKind>().unwrap(), MirrorKind::GDrive);
        assert_eq!("sharepoint".parse::<MirrorKind>().unwrap(), MirrorKind::SharePoint);
        assert_eq!("OneDrive".parse::<MirrorKind>().unwrap(), MirrorKind::SharePoint);
    }

    #[test]
    fn test_mirror_kind_unknown() {
        let err = "dropbox".parse::<MirrorKind>().unwrap_err();
        assert!(err.to_string().contains("Unknown mirror 'dropbox'"));
    }

    #[test]
    fn test_mirror_kind_display_round_trips() {
        for kind in [MirrorKind::GDrive, MirrorKind::SharePoint] {
            assert_eq!(kind.to_string().parse::<MirrorKind>().unwrap(), kind);
        }
    }
}
