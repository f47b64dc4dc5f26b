//! `upload`: send a file to a course, optionally mirroring it afterwards.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Arg, ArgMatches, Command};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::services::ServiceRegistry;
use crate::canvas::progress::ProgressCallback;
use crate::canvas::CanvasClient;
use crate::cli::{CommandBuilder, CommandCategory, CommandMeta};
use crate::cloud::{CloudMirror, MirrorKind, MirroredFile};
use crate::errors::{CanvasDropError, Result};
use crate::media::UploadFile;
use crate::output;
use crate::output::progress::{create_upload_progress, set_percent};

pub fn upload_command() -> Command {
    Command::new("upload")
        .about("Upload a file to the root folder of a course")
        .arg(Arg::new("path").required(true).help("Local file to upload"))
        .arg(
            Arg::new("course")
                .long("course")
                .short('c')
                .required(true)
                .help("Course id (see `canvas-drop courses`)"),
        )
        .arg(
            Arg::new("mirror")
                .long("mirror")
                .short('m')
                .value_parser(["gdrive", "sharepoint"])
                .help("Also copy the file to a cloud drive"),
        )
        .arg(
            Arg::new("folder")
                .long("folder")
                .short('f')
                .requires("mirror")
                .help("Mirror folder (defaults to gdriveFolder / sharepointFolder)"),
        )
}

pub fn upload_meta() -> CommandMeta {
    CommandBuilder::from_clap(upload_command())
        .category(CommandCategory::Canvas)
        .aliases(&["up"])
        .build()
}

/// Parsed `upload` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub course_id: String,
    pub mirror: Option<MirrorKind>,
    pub folder: Option<String>,
}

impl UploadRequest {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let path = matches
            .get_one::<String>("path")
            .map(PathBuf::from)
            .ok_or_else(|| CanvasDropError::Command("missing <path>".into()))?;
        let course_id = matches
            .get_one::<String>("course")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CanvasDropError::Command("Please select a course and a file".into()))?;
        let mirror = matches
            .get_one::<String>("mirror")
            .map(|m| m.parse::<MirrorKind>())
            .transpose()?;
        Ok(Self {
            path,
            course_id,
            mirror,
            folder: matches.get_one::<String>("folder").cloned(),
        })
    }
}

/// What the command reports once everything finished.
#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub file: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<MirroredFile>,
    /// Set when the file reached Canvas but the mirror copy failed.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub mirror_error: Option<CanvasDropError>,
}

fn serialize_error<S: Serializer>(
    err: &Option<CanvasDropError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match err {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

pub async fn handle_upload(matches: &ArgMatches, services: &ServiceRegistry, json: bool) -> Result<()> {
    let request = UploadRequest::from_matches(matches)?;
    let canvas = services.canvas().await?;
    let mirror = match request.mirror {
        Some(kind) => {
            let folder = match &request.folder {
                Some(f) => f.clone(),
                None => services.default_folder(kind).await,
            };
            Some((services.mirror(kind).await?, folder))
        }
        None => None,
    };

    let outcome = run_upload(&canvas, &request, mirror, json).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    match outcome.mirror_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Upload to Canvas, then mirror.
///
/// The mirror must be configured and linked before anything is sent to
/// Canvas. A mirror failure after that lands in `mirror_error` alongside the
/// Canvas descriptor.
pub async fn run_upload(
    canvas: &CanvasClient,
    request: &UploadRequest,
    mirror: Option<(Arc<dyn CloudMirror>, String)>,
    quiet: bool,
) -> Result<UploadOutcome> {
    if let Some((backend, _)) = &mirror {
        backend.authenticate().await?;
    }
    let file = UploadFile::from_path(&request.path).await?;

    let bar = (!quiet).then(|| create_upload_progress(file.name()));
    let on_progress: Option<ProgressCallback> = bar.clone().map(|pb| {
        let cb: ProgressCallback = Arc::new(move |pct| set_percent(&pb, pct));
        cb
    });

    let uploaded = match canvas.upload_file(&request.course_id, &file, on_progress).await {
        Ok(uploaded) => {
            if let Some(pb) = &bar {
                pb.finish_and_clear();
            }
            uploaded
        }
        Err(e) => {
            if let Some(pb) = &bar {
                pb.abandon();
            }
            return Err(e);
        }
    };
    if !quiet {
        output::success("File uploaded successfully!");
    }

    let mut outcome = UploadOutcome {
        file: uploaded.into_json(),
        mirror: None,
        mirror_error: None,
    };
    if let Some((backend, folder)) = mirror {
        if !quiet {
            output::info(&format!("Mirroring to {} ({folder})...", backend.name()));
        }
        match backend.mirror_file(&file, &folder).await {
            Ok(mirrored) => {
                if !quiet {
                    output::success(&format!(
                        "Mirrored to {}: {}",
                        mirrored.service, mirrored.location
                    ));
                }
                outcome.mirror = Some(mirrored);
            }
            Err(e) => {
                tracing::warn!(error = %e, service = backend.name(), "Mirror copy failed");
                outcome.mirror_error = Some(e);
            }
        }
    }
    Ok(outcome)
}
