//! `preview`: classify a local file and open it in the browser.

use std::path::Path;

use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::json;

use crate::cli::{CommandBuilder, CommandCategory, CommandMeta};
use crate::errors::{CanvasDropError, Result};
use crate::media::{guess_content_type, open_preview, PreviewKind};
use crate::output;

pub fn preview_command() -> Command {
    Command::new("preview")
        .about("Open an image, PDF or video in the default browser")
        .arg(Arg::new("path").required(true).help("Local file to preview"))
        .arg(
            Arg::new("no-open")
                .long("no-open")
                .action(ArgAction::SetTrue)
                .help("Only report the preview kind"),
        )
}

pub fn preview_meta() -> CommandMeta {
    CommandBuilder::from_clap(preview_command())
        .category(CommandCategory::Utility)
        .build()
}

pub fn handle_preview(matches: &ArgMatches, json: bool) -> Result<()> {
    let path = matches
        .get_one::<String>("path")
        .map(Path::new)
        .ok_or_else(|| CanvasDropError::Command("missing <path>".into()))?;
    if !path.is_file() {
        return Err(CanvasDropError::Command(format!("Not a file: {}", path.display())));
    }

    let kind = if matches.get_flag("no-open") {
        classify_path(path)
    } else {
        open_preview(path)?
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "path": path.display().to_string(),
                "kind": kind.to_string(),
                "previewable": kind.is_previewable(),
            }))?
        );
    } else if kind.is_previewable() {
        output::success(&format!("Previewing {} ({kind})", path.display()));
    } else {
        output::warning("Preview not available for this file type.");
    }
    Ok(())
}

fn classify_path(path: &Path) -> PreviewKind {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    PreviewKind::classify(name, &guess_content_type(name))
}
