pub mod progress;

use crossterm::style::{Color, Stylize};

/// Print a success message in green to stdout.
pub fn success(msg: &str) {
    println!("{}", msg.with(Color::Green));
}

/// Print an error message in red to stderr.
pub fn error(msg: &str) {
    eprintln!("{}", msg.with(Color::Red));
}

/// Print a warning message in yellow to stderr.
pub fn warning(msg: &str) {
    eprintln!("{}", msg.with(Color::Yellow));
}

/// Print an info message in cyan to stdout.
pub fn info(msg: &str) {
    println!("{}", msg.with(Color::Cyan));
}

/// Human-readable byte count (B, KB, MB, GB).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_does_not_panic() {
        success("File uploaded successfully!");
    }

    #[test]
    fn test_error_does_not_panic() {
        error("Upload failed");
    }

    #[test]
    fn test_warning_does_not_panic() {
        warning("Careful now");
    }

    #[test]
    fn test_info_does_not_panic() {
        info("Loading courses...");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
