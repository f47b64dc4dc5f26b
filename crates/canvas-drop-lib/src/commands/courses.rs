//! `courses`: list the user's favourite active courses.

use clap::{ArgMatches, Command};

use crate::canvas::types::Course;
use crate::canvas::CanvasClient;
use crate::cli::{CommandBuilder, CommandCategory, CommandMeta};
use crate::errors::Result;
use crate::output;
use crate::output::progress::create_spinner;

pub fn courses_command() -> Command {
    Command::new("courses").about("List favourite active courses")
}

pub fn courses_meta() -> CommandMeta {
    CommandBuilder::from_clap(courses_command())
        .category(CommandCategory::Canvas)
        .aliases(&["ls"])
        .build()
}

pub async fn handle_courses(_matches: &ArgMatches, canvas: &CanvasClient, json: bool) -> Result<()> {
    let spinner = (!json).then(|| create_spinner("Loading courses..."));
    let result = canvas.list_courses().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let courses = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&courses)?);
        return Ok(());
    }

    if courses.is_empty() {
        output::warning("No favourite active courses found");
        return Ok(());
    }
    print!("{}", render_table(&courses));
    output::success("Courses loaded successfully");
    Ok(())
}

/// Fixed-width table of id, code and name, in server order.
fn render_table(courses: &[Course]) -> String {
    let id_width = courses
        .iter()
        .map(|c| c.id.len())
        .chain(std::iter::once(2))
        .max()
        .unwrap_or(2);
    let code_width = courses
        .iter()
        .map(|c| c.course_code.as_deref().unwrap_or("-").len())
        .chain(std::iter::once(4))
        .max()
        .unwrap_or(4);

    let mut out = format!("{:<id_width$}  {:<code_width$}  NAME\n", "ID", "CODE");
    for c in courses {
        out.push_str(&format!(
            "{:<id_width$}  {:<code_width$}  {}\n",
            c.id,
            c.course_code.as_deref().unwrap_or("-"),
            c.name
        ));
    }
    out
}
