//! `sharepoint`: link a Microsoft account for mirroring.

use clap::{ArgMatches, Command};

use super::gdrive::print_status;
use crate::cli::{CommandBuilder, CommandCategory, CommandMeta};
use crate::cloud::sharepoint::SharePointClient;
use crate::errors::Result;
use crate::output;

pub fn sharepoint_command() -> Command {
    Command::new("sharepoint")
        .about("SharePoint / OneDrive mirror account")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("login").about("Sign in with a device code"))
        .subcommand(Command::new("status").about("Show whether an account is linked"))
}

pub fn sharepoint_meta() -> CommandMeta {
    CommandBuilder::from_clap(sharepoint_command())
        .category(CommandCategory::Cloud)
        .aliases(&["sp"])
        .build()
}

pub async fn handle_sharepoint(matches: &ArgMatches, client: &SharePointClient) -> Result<()> {
    match matches.subcommand() {
        Some(("login", _)) => {
            let login = client.start_device_login().await?;
            output::info(&format!(
                "To sign in, open {} and enter the code {}",
                login.verification_uri(),
                login.user_code()
            ));
            client.finish_device_login(login).await?;
            output::success("SharePoint linked");
            Ok(())
        }
        Some(("status", _)) => {
            print_status(client.load_token().await?.as_ref(), "sharepoint");
            Ok(())
        }
        _ => unreachable!("subcommand_required is set"),
    }
}
