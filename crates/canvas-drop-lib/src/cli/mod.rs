pub mod registry;

pub use registry::{CommandBuilder, CommandCategory, CommandMeta, CommandRegistry};

/// Creates the root clap Command with global `--verbose` and `--json` flags.
///
/// When combined with `--json`, verbose output is suppressed to keep JSON clean.
pub fn create_root_command() -> clap::Command {
    clap::Command::new("canvas-drop")
        .about("Upload files to Canvas LMS courses, with optional cloud mirrors")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .arg(
            clap::Arg::new("json")
                .long("json")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .help("Output in JSON format"),
        )
}

/// Returns whether verbose mode is active based on parsed matches.
pub fn is_verbose(matches: &clap::ArgMatches) -> bool {
    matches.get_flag("verbose") && !matches.get_flag("json")
}

/// Returns whether `--json` was passed.
pub fn is_json(matches: &clap::ArgMatches) -> bool {
    matches.get_flag("json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_with_probe() -> clap::Command {
        create_root_command().subcommand(clap::Command::new("probe"))
    }

    #[test]
    fn test_root_command_has_json_flag() {
        let matches = root_with_probe()
            .try_get_matches_from(["canvas-drop", "--json", "probe"])
            .unwrap();
        assert!(is_json(&matches));
    }

    #[test]
    fn test_verbose_suppressed_with_json() {
        let matches = root_with_probe()
            .try_get_matches_from(["canvas-drop", "--verbose", "--json", "probe"])
            .unwrap();
        assert!(!is_verbose(&matches));
    }

    #[test]
    fn test_short_verbose_flag_after_subcommand() {
        let matches = root_with_probe()
            .try_get_matches_from(["canvas-drop", "probe", "-v"])
            .unwrap();
        assert!(is_verbose(&matches));
    }

    #[test]
    fn test_no_flags_not_verbose() {
        let matches = root_with_probe()
            .try_get_matches_from(["canvas-drop", "probe"])
            .unwrap();
        assert!(!is_verbose(&matches));
        assert!(!is_json(&matches));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(root_with_probe()
            .try_get_matches_from(["canvas-drop"])
            .is_err());
    }
}
