//! `gdrive`: link a Google Drive account for mirroring.

use clap::{ArgMatches, Command};

use crate::cli::{CommandBuilder, CommandCategory, CommandMeta};
use crate::cloud::gdrive::GDriveClient;
use crate::cloud::token::StoredToken;
use crate::errors::{CanvasDropError, Result};
use crate::output;

pub fn gdrive_command() -> Command {
    Command::new("gdrive")
        .about("Google Drive mirror account")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("login").about("Authorize access with an OAuth2 code"))
        .subcommand(Command::new("status").about("Show whether an account is linked"))
}

pub fn gdrive_meta() -> CommandMeta {
    CommandBuilder::from_clap(gdrive_command())
        .category(CommandCategory::Cloud)
        .build()
}

pub async fn handle_gdrive(matches: &ArgMatches, gdrive: &GDriveClient) -> Result<()> {
    match matches.subcommand() {
        Some(("login", _)) => {
            let (url, _csrf) = gdrive.authorization_url()?;
            output::info("Open this URL in your browser to authorize:");
            println!("{}", url);
            if let Err(e) = webbrowser::open(&url) {
                tracing::debug!("Could not open browser: {e}");
            }
            println!();
            output::info("Enter the authorization code (the `code` parameter of the redirect):");

            let mut code = String::new();
            std::io::stdin()
                .read_line(&mut code)
                .map_err(|e| CanvasDropError::Command(format!("Failed to read auth code: {}", e)))?;
            let code = code.trim();
            if code.is_empty() {
                return Err(CanvasDropError::Command(
                    "Authorization code cannot be empty".into(),
                ));
            }

            gdrive.exchange_code(code).await?;
            output::success("Google Drive linked");
            Ok(())
        }
        Some(("status", _)) => {
            print_status(gdrive.load_token().await?.as_ref(), "gdrive");
            Ok(())
        }
        _ => unreachable!("subcommand_required is set"),
    }
}

/// Shared by `gdrive status` and `sharepoint status`.
pub(crate) fn print_status(token: Option<&StoredToken>, command: &str) {
    match token {
        Some(token) => {
            output::success("Authenticated");
            println!(
                "  Expires: {}",
                token
                    .expires_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".into())
            );
            println!(
                "  Refresh token: {}",
                if token.refresh_token.is_some() { "present" } else { "none" }
            );
        }
        None => {
            output::warning("Not authenticated");
            output::info(&format!("Run `canvas-drop {command} login` to authenticate."));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;
    use crate::http_client::HttpClient;

    #[test]
    fn test_gdrive_requires_subcommand() {
        assert!(gdrive_command().try_get_matches_from(["gdrive"]).is_err());
    }

    #[test]
    fn test_gdrive_subcommands() {
        for sub in ["login", "status"] {
            let m = gdrive_command().try_get_matches_from(["gdrive", sub]).unwrap();
            assert_eq!(m.subcommand_name(), Some(sub));
        }
    }

    #[test]
    fn test_gdrive_meta() {
        let meta = gdrive_meta();
        assert_eq!(meta.name, "gdrive");
        assert_eq!(meta.category, CommandCategory::Cloud);
    }

    #[tokio::test]
    async fn test_status_without_token() {
        let tmp = tempfile::TempDir::new().unwrap();
        let client = GDriveClient::new(
            HttpClient::from_defaults().unwrap(),
            tmp.path().join("gdrive-token.json"),
            &Settings::default(),
        );
        let m = gdrive_command().try_get_matches_from(["gdrive", "status"]).unwrap();
        handle_gdrive(&m, &client).await.unwrap();
    }
}
