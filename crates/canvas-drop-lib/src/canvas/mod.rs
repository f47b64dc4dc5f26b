//! Canvas LMS client: course listing and the two-phase file upload.
//!
//! Uploading is a negotiate-then-POST exchange. Phase 1 asks Canvas for a
//! one-time upload target (`upload_url` plus signed `upload_params`); phase 2
//! POSTs a multipart form to that target with the params echoed back ahead of
//! the file. The upload target authorizes itself through those params, so the
//! bearer token is only ever sent to the Canvas API host.

pub mod progress;
pub mod types;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::errors::{CanvasDropError, Result};
use crate::http_client::HttpClient;
use crate::media::UploadFile;
use progress::{progress_stream, ProgressCallback, UPLOAD_CHUNK_SIZE};
use types::{Course, UploadSession, UploadedFile};

/// Canvas REST client bound to one domain and one bearer token.
///
/// Credentials are fixed for the life of the client and are not checked
/// until the first request. Concurrent uploads through one client are not
/// serialized; callers that need one-at-a-time must enforce it themselves.
pub struct CanvasClient {
    http: HttpClient,
    base_url: String,
    token: String,
}

impl CanvasClient {
    /// Client for `https://{domain}/api/v1`.
    pub fn new(http: HttpClient, domain: &str, token: impl Into<String>) -> Self {
        Self::with_base_url(http, format!("https://{domain}/api/v1"), token)
    }

    /// Client for an explicit API root such as `http://canvas.local/api/v1`.
    pub fn with_base_url(
        http: HttpClient,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The user's favourite active courses, in server order.
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        self.fetch_courses()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error fetching courses"))
    }

    /// Upload `file` into the root folder of course `course_id`.
    ///
    /// `on_progress` receives the percentage of file bytes handed to the
    /// transport during phase 2. It is never called for an empty file.
    /// Any failure aborts the whole upload; nothing is retried.
    pub async fn upload_file(
        &self,
        course_id: &str,
        file: &UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadedFile> {
        self.run_upload(course_id, file, on_progress)
            .await
            .inspect_err(|e| tracing::error!(error = %e, course_id, "Error uploading file"))
    }

    async fn fetch_courses(&self) -> Result<Vec<Course>> {
        let url = format!("{}/users/self/favorites/courses", self.base_url);
        let query = [("enrollment_state", "active"), ("per_page", "100")];
        let resp = self.get_with_auth(&url, &query).await?;
        let courses: Vec<Course> = read_json(resp, CanvasDropError::network).await?;
        tracing::debug!(count = courses.len(), "Fetched courses");
        Ok(courses)
    }

    async fn run_upload(
        &self,
        course_id: &str,
        file: &UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadedFile> {
        tracing::debug!(
            course_id,
            file = file.name(),
            size = file.size(),
            state = "negotiating",
            "Starting upload"
        );
        let session = self.negotiate(course_id, file).await?;

        tracing::debug!(
            fields = session.upload_params.len(),
            state = "uploading",
            "Upload session negotiated"
        );
        let uploaded = self.send_file(session, file, on_progress).await?;

        tracing::info!(
            course_id,
            file = uploaded.name().unwrap_or(file.name()),
            state = "done",
            "Upload complete"
        );
        Ok(uploaded)
    }

    /// Phase 1: obtain the one-time upload target.
    async fn negotiate(&self, course_id: &str, file: &UploadFile) -> Result<UploadSession> {
        let url = format!("{}/courses/{course_id}/files", self.base_url);
        let size = file.size().to_string();
        let query = [
            ("name", file.name()),
            ("size", size.as_str()),
            ("content_type", file.content_type()),
            ("parent_folder_path", "/"),
        ];
        let resp = self.get_with_auth(&url, &query).await?;
        read_json(resp, CanvasDropError::network).await
    }

    /// Phase 2: POST the form to the negotiated target. Consumes the session.
    async fn send_file(
        &self,
        session: UploadSession,
        file: &UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadedFile> {
        let mut form = Form::new();
        for (key, value) in session.form_fields() {
            form = form.text(key, value);
        }

        let body = reqwest::Body::wrap_stream(progress_stream(
            file.data(),
            UPLOAD_CHUNK_SIZE,
            on_progress,
        ));
        let part = Part::stream_with_length(body, file.size())
            .file_name(file.name().to_string())
            .mime_str(file.content_type())
            .map_err(|e| {
                CanvasDropError::Application(format!(
                    "Invalid content type {:?}: {e}",
                    file.content_type()
                ))
            })?;
        form = form.part("file", part);

        let client = self.http.get_client().await;
        let resp = client
            .post(&session.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(CanvasDropError::upload_network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CanvasDropError::Upload {
                status: status.as_u16(),
            });
        }

        read_json(resp, CanvasDropError::upload_network).await
    }

    async fn get_with_auth(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        let client = self.http.get_client().await;
        let resp = client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(CanvasDropError::network)?;

        if !resp.status().is_success() {
            return Err(CanvasDropError::api(resp.status()));
        }
        Ok(resp)
    }
}

/// Read the whole body and decode it. Body read failures are transport errors.
async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    on_transport_error: fn(reqwest::Error) -> CanvasDropError,
) -> Result<T> {
    let body = resp.text().await.map_err(on_transport_error)?;
    Ok(serde_json::from_str(&body)?)
}
