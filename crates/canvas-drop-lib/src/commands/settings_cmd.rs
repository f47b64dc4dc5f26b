//! Settings CLI command: show, set, login, reset, path.

use clap::{Arg, ArgMatches, Command};
use serde_json::{Map, Value};

use crate::cli::{CommandBuilder, CommandCategory, CommandMeta};
use crate::config::manager::SettingsManager;
use crate::errors::{CanvasDropError, Result};
use crate::output;

pub fn settings_command() -> Command {
    Command::new("settings")
        .about("View and change stored settings")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("show").about("Print settings (secrets masked)"))
        .subcommand(
            Command::new("set")
                .about("Set a single setting by its camelCase key")
                .arg(Arg::new("key").required(true).help("Setting key, e.g. gdriveFolder"))
                .arg(Arg::new("value").required(true).help("New value")),
        )
        .subcommand(
            Command::new("login")
                .about("Save the Canvas domain and API token")
                .arg(
                    Arg::new("domain")
                        .long("domain")
                        .short('d')
                        .required(true)
                        .help("Canvas host, e.g. school.instructure.com"),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .short('t')
                        .required(true)
                        .help("Canvas API access token"),
                ),
        )
        .subcommand(Command::new("reset").about("Restore default settings"))
        .subcommand(Command::new("path").about("Print the settings file location"))
}

pub fn settings_meta() -> CommandMeta {
    CommandBuilder::from_clap(settings_command())
        .category(CommandCategory::Utility)
        .aliases(&["config"])
        .build()
}

pub async fn handle_settings(matches: &ArgMatches, manager: &SettingsManager) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => {
            let settings = manager.get_settings().await.redacted();
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let raw = required(sub, "value")?;
            let current = serde_json::to_value(manager.get_settings().await)?;
            let existing = current
                .get(key)
                .ok_or_else(|| CanvasDropError::Config(format!("Unknown setting: {key}")))?;
            let value = parse_setting_value(key, existing, raw)?;

            let mut updates = Map::new();
            updates.insert(key.to_string(), value);
            manager.update_settings(updates).await?;
            output::success(&format!("{key} updated"));
            Ok(())
        }
        Some(("login", sub)) => {
            manager
                .set_credentials(required(sub, "domain")?, required(sub, "token")?)
                .await?;
            output::success("Settings saved!");
            Ok(())
        }
        Some(("reset", _)) => {
            manager.reset_to_defaults().await?;
            output::success("Settings reset to defaults");
            Ok(())
        }
        Some(("path", _)) => {
            println!("{}", manager.settings_path().display());
            Ok(())
        }
        _ => unreachable!("subcommand_required is set"),
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| CanvasDropError::Command(format!("missing <{id}>")))
}

/// Numeric settings take a number; everything else is stored as text.
fn parse_setting_value(key: &str, existing: &Value, raw: &str) -> Result<Value> {
    if existing.is_number() {
        let n: u32 = raw.trim().parse().map_err(|_| {
            CanvasDropError::Config(format!("{key} must be a non-negative whole number"))
        })?;
        return Ok(Value::from(n));
    }
    Ok(Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["settings"];
        argv.extend_from_slice(args);
        settings_command().try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn test_settings_requires_subcommand() {
        assert!(settings_command().try_get_matches_from(["settings"]).is_err());
    }

    #[test]
    fn test_login_requires_both_flags() {
        assert!(settings_command()
            .try_get_matches_from(["settings", "login", "--domain", "x"])
            .is_err());
    }

    #[test]
    fn test_settings_meta() {
        let meta = settings_meta();
        assert_eq!(meta.name, "settings");
        assert_eq!(meta.category, CommandCategory::Utility);
        assert!(meta.command.get_all_aliases().any(|a| a == "config"));
    }

    #[test]
    fn test_parse_setting_value() {
        assert_eq!(
            parse_setting_value("connectTimeout", &Value::from(10), "30").unwrap(),
            Value::from(30)
        );
        assert!(parse_setting_value("connectTimeout", &Value::from(10), "soon").is_err());
        assert_eq!(
            parse_setting_value("apiToken", &Value::from(""), "12345").unwrap(),
            Value::String("12345".into())
        );
    }

    #[tokio::test]
    async fn test_login_then_set() {
        let tmp = TempDir::new().unwrap();
        let manager = SettingsManager::initialize(tmp.path()).await.unwrap();

        handle_settings(
            &parse(&["login", "--domain", " school.instructure.com ", "--token", "abc"]),
            &manager,
        )
        .await
        .unwrap();
        handle_settings(&parse(&["set", "connectTimeout", "25"]), &manager)
            .await
            .unwrap();
        handle_settings(&parse(&["set", "gdriveFolder", "Lab Reports"]), &manager)
            .await
            .unwrap();

        let s = manager.get_settings().await;
        assert_eq!(s.canvas_domain, "school.instructure.com");
        assert_eq!(s.api_token, "abc");
        assert_eq!(s.connect_timeout, 25);
        assert_eq!(s.gdrive_folder, "Lab Reports");
    }

    #[tokio::test]
    async fn test_set_unknown_key() {
        let tmp = TempDir::new().unwrap();
        let manager = SettingsManager::initialize(tmp.path()).await.unwrap();
        let err = handle_settings(&parse(&["set", "colour", "blue"]), &manager)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Unknown setting: colour");
    }

    #[tokio::test]
    async fn test_set_guards_credentials_and_timeout() {
        let tmp = TempDir::new().unwrap();
        let manager = SettingsManager::initialize(tmp.path()).await.unwrap();

        handle_settings(&parse(&["set", "canvasDomain", " school.instructure.com "]), &manager)
            .await
            .unwrap();
        assert!(handle_settings(&parse(&["set", "apiToken", "  "]), &manager)
            .await
            .is_err());
        assert!(handle_settings(&parse(&["set", "connectTimeout", "0"]), &manager)
            .await
            .is_err());

        let s = manager.get_settings().await;
        assert_eq!(s.canvas_domain, "school.instructure.com");
        assert_eq!(s.api_token, "");
        assert_eq!(s.connect_timeout, 10);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let tmp = TempDir::new().unwrap();
        let manager = SettingsManager::initialize(tmp.path()).await.unwrap();
        manager.set_credentials("d", "t").await.unwrap();
        handle_settings(&parse(&["reset"]), &manager).await.unwrap();
        assert!(manager.get_settings().await.credentials().is_none());
    }
}
