pub mod courses;
pub mod gdrive;
pub mod preview;
pub mod services;
pub mod settings_cmd;
pub mod sharepoint;
pub mod upload;

use clap::ArgMatches;

use crate::cli::CommandRegistry;
use crate::errors::{CanvasDropError, Result};
use services::ServiceRegistry;

/// Register every subcommand on `registry`.
pub fn register_commands(registry: &mut CommandRegistry) -> Result<()> {
    registry.register(courses::courses_meta())?;
    registry.register(upload::upload_meta())?;
    registry.register(gdrive::gdrive_meta())?;
    registry.register(sharepoint::sharepoint_meta())?;
    registry.register(preview::preview_meta())?;
    registry.register(settings_cmd::settings_meta())?;
    Ok(())
}

/// Route a parsed subcommand to its handler.
pub async fn dispatch_command(
    name: &str,
    matches: &ArgMatches,
    services: &ServiceRegistry,
    json: bool,
) -> Result<()> {
    match name {
        "courses" => courses::handle_courses(matches, &services.canvas().await?, json).await,
        "upload" => upload::handle_upload(matches, services, json).await,
        "preview" => preview::handle_preview(matches, json),
        "settings" => settings_cmd::handle_settings(matches, &services.settings_manager).await,
        "gdrive" => gdrive::handle_gdrive(matches, services.gdrive().await?.as_ref()).await,
        "sharepoint" => {
            sharepoint::handle_sharepoint(matches, services.sharepoint().await?.as_ref()).await
        }
        other => Err(CanvasDropError::Command(format!("Unknown command: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{create_root_command, CommandCategory};
    use crate::config::manager::SettingsManager;
    use crate::config::paths::AppPaths;
    use crate::http_client::HttpClient;
    use std::sync::Arc;

    fn registry() -> CommandRegistry {
        let mut reg = CommandRegistry::new(create_root_command());
        register_commands(&mut reg).unwrap();
        reg
    }

    #[test]
    fn test_all_commands_registered() {
        let root = registry().build_root();
        let names: Vec<&str> = root.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(
            names,
            vec!["courses", "upload", "gdrive", "sharepoint", "preview", "settings"]
        );
    }

    #[test]
    fn test_categories() {
        let reg = registry();
        assert_eq!(reg.get_by_category(CommandCategory::Canvas).len(), 2);
        assert_eq!(reg.get_by_category(CommandCategory::Cloud).len(), 2);
        assert_eq!(reg.get_by_category(CommandCategory::Utility).len(), 2);
    }

    #[test]
    fn test_root_parses_full_upload_line() {
        let root = registry().build_root();
        let m = root
            .try_get_matches_from([
                "canvas-drop", "--json", "upload", "report.pdf", "--course", "4021", "--mirror",
                "gdrive",
            ])
            .unwrap();
        let (name, sub) = m.subcommand().unwrap();
        assert_eq!(name, "upload");
        assert_eq!(sub.get_one::<String>("course").map(String::as_str), Some("4021"));
        assert!(crate::cli::is_json(&m));
    }

    #[test]
    fn test_root_resolves_alias() {
        let root = registry().build_root();
        let m = root
            .try_get_matches_from(["canvas-drop", "up", "a.txt", "-c", "1"])
            .unwrap();
        assert_eq!(m.subcommand_name(), Some("upload"));
    }

    #[tokio::test]
    async fn test_dispatch_without_credentials() {
        let tmp = tempfile::TempDir::new().unwrap();
        let manager = SettingsManager::initialize(tmp.path()).await.unwrap();
        let paths = AppPaths::rooted_at(tmp.path().to_path_buf(), tmp.path().to_path_buf());
        let services = ServiceRegistry::new(
            Arc::new(manager),
            HttpClient::from_defaults().unwrap(),
            &paths,
        );

        let m = courses::courses_command()
            .try_get_matches_from(["courses"])
            .unwrap();
        let err = dispatch_command("courses", &m, &services, true).await.unwrap_err();
        assert!(matches!(err, CanvasDropError::Config(_)));

        let err = dispatch_command("bogus", &m, &services, true).await.unwrap_err();
        assert!(err.to_string().contains("Unknown command: bogus"));
    }
}
