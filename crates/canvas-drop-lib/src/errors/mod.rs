use thiserror::Error;

/// Message carried by transport failures outside the binary upload phase.
pub const NETWORK_ERROR: &str = "network error";

/// Message carried by transport failures while the file body is in flight.
pub const UPLOAD_NETWORK_ERROR: &str = "network error during upload";

#[derive(Error, Debug)]
pub enum CanvasDropError {
    /// No response was received (DNS, connection refused, dropped socket).
    #[error("{context}: {source}")]
    Network {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx on an authenticated Canvas call (course listing, phase-1 negotiation).
    #[error("API request failed: {status} {status_text}")]
    Api { status: u16, status_text: String },

    /// Non-2xx on the phase-2 binary POST.
    #[error("Upload failed with status: {status}")]
    Upload { status: u16 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cloud error ({service}): {message}")]
    Cloud { service: String, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("OAuth2 error: {0}")]
    OAuth2(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("{0}")]
    Application(String),
}

pub type Result<T> = std::result::Result<T, CanvasDropError>;

impl CanvasDropError {
    /// Wrap a transport failure from a non-upload call.
    pub fn network(source: reqwest::Error) -> Self {
        Self::Network {
            context: NETWORK_ERROR,
            source,
        }
    }

    /// Wrap a transport failure from the phase-2 upload.
    pub fn upload_network(source: reqwest::Error) -> Self {
        Self::Network {
            context: UPLOAD_NETWORK_ERROR,
            source,
        }
    }

    /// Build an `Api` error from a response status.
    pub fn api(status: reqwest::StatusCode) -> Self {
        Self::Api {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}

/// Logs a fatal error and exits the process with code 1.
///
/// Intended for unrecoverable errors during startup.
pub fn handle_fatal(err: CanvasDropError) -> ! {
    tracing::error!("Fatal error: {}", err);
    std::process::exit(1)
}

/// Maps a `CanvasDropError` to user-facing CLI output with a hint where one helps.
pub fn handle_command_error(err: &CanvasDropError) {
    use crate::output;

    match err {
        CanvasDropError::Api { status, .. } => {
            output::error(&format!("{}", err));
            match status {
                401 => output::info(
                    "Check your API token: `canvas-drop settings login --domain <host> --token <token>`.",
                ),
                403 => output::info("Your token does not have access to this course."),
                404 => output::info("Check the Canvas domain and course id."),
                _ => {}
            }
        }
        CanvasDropError::Upload { .. } => {
            output::error(&format!("{}", err));
            output::info("The upload session is spent. Run the upload again to start a new one.");
        }
        CanvasDropError::Network { .. } => {
            output::error(&format!("Network error: {}", err));
            output::info("Check your internet connection and the Canvas domain.");
        }
        CanvasDropError::Auth(msg) => {
            output::error(&format!("Authentication error: {}", msg));
            if msg.contains("Google Drive") {
                output::info("Run `canvas-drop gdrive login` to authenticate.");
            } else if msg.contains("SharePoint") {
                output::info("Run `canvas-drop sharepoint login` to authenticate.");
            }
        }
        CanvasDropError::OAuth2(msg) => {
            output::error(&format!("OAuth2 error: {}", msg));
        }
        CanvasDropError::Cloud { service, message } => {
            output::error(&format!("{} error: {}", service, message));
            output::info("The Canvas upload is unaffected; only the mirror copy failed.");
        }
        CanvasDropError::Config(msg) => {
            output::error(&format!("Configuration error: {}", msg));
        }
        CanvasDropError::Io(e) => {
            output::error(&format!("File error: {}", e));
        }
        CanvasDropError::Command(msg) => {
            output::error(&format!("Error: {}", msg));
        }
        _ => {
            output::error(&format!("{}", err));
        }
    }
}
