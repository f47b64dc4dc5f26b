use indicatif::{ProgressBar, ProgressStyle};

/// Create a percentage bar for the Canvas upload phase.
///
/// Length is fixed at 100; feed it the percentages reported by
/// `CanvasClient::upload_file`.
pub fn create_upload_progress(file_name: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}%")
        .map(|s| s.progress_chars("█▉▊▋▌▍▎▏  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(file_name.to_string());
    pb
}

/// Map a reported percentage onto the bar, keeping the position monotonic.
pub fn set_percent(pb: &ProgressBar, percent: f64) {
    let pos = percent.clamp(0.0, 100.0).round() as u64;
    if pos > pb.position() {
        pb.set_position(pos);
    }
}

/// Create a spinner for indeterminate operations.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(msg.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_upload_progress() {
        let pb = create_upload_progress("report.pdf");
        assert_eq!(pb.length(), Some(100));
        assert_eq!(pb.message(), "report.pdf");
        pb.finish_and_clear();
    }

    #[test]
    fn test_set_percent_rounds_and_clamps() {
        let pb = create_upload_progress("a.bin");
        set_percent(&pb, 33.4);
        assert_eq!(pb.position(), 33);
        set_percent(&pb, 250.0);
        assert_eq!(pb.position(), 100);
        pb.finish_and_clear();
    }

    #[test]
    fn test_set_percent_never_moves_backwards() {
        let pb = create_upload_progress("a.bin");
        set_percent(&pb, 60.0);
        set_percent(&pb, 40.0);
        assert_eq!(pb.position(), 60);
        pb.finish_and_clear();
    }

    #[test]
    fn test_create_spinner() {
        let pb = create_spinner("Loading courses...");
        assert_eq!(pb.message(), "Loading courses...");
        pb.finish_and_clear();
    }
}
