use std::sync::Arc;

use canvas_drop_lib::cli::{create_root_command, is_json, is_verbose, CommandRegistry};
use canvas_drop_lib::commands::services::ServiceRegistry;
use canvas_drop_lib::commands::{dispatch_command, register_commands};
use canvas_drop_lib::config::manager::SettingsManager;
use canvas_drop_lib::config::paths::AppPaths;
use canvas_drop_lib::errors::{handle_command_error, handle_fatal};
use canvas_drop_lib::http_client::HttpClient;

#[tokio::main]
async fn main() {
    // Paths are resolved once from the environment.
    let paths = AppPaths::get();

    let mut registry = CommandRegistry::new(create_root_command());
    if let Err(e) = register_commands(&mut registry) {
        handle_fatal(e);
    }
    let matches = registry.build_root().get_matches();

    let verbose = is_verbose(&matches);
    let json = is_json(&matches);
    canvas_drop_lib::logger::init(verbose);
    canvas_drop_lib::logger::set_verbose(verbose);

    let settings_manager = match SettingsManager::initialize(paths.app_dir()).await {
        Ok(m) => Arc::new(m),
        Err(e) => handle_fatal(e),
    };
    let settings = settings_manager.get_settings().await;
    let http_client = match HttpClient::new(&settings) {
        Ok(c) => c,
        Err(e) => handle_fatal(e),
    };
    let services = ServiceRegistry::new(settings_manager, http_client, paths);
    services.register_config_listeners().await;

    if let Some((name, sub_matches)) = matches.subcommand() {
        tracing::debug!(command = name, "Executing command");
        if let Err(e) = dispatch_command(name, sub_matches, &services, json).await {
            handle_command_error(&e);
            std::process::exit(1);
        }
    }
}
