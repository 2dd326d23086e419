//! CLI output formatting utilities.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Severity of a CI workflow annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    Error,
    Warning,
    Notice,
}

impl Annotation {
    fn command(self) -> &'static str {
        match self {
            Annotation::Error => "error",
            Annotation::Warning => "warning",
            Annotation::Notice => "notice",
        }
    }
}

/// Single-line `::level::message` workflow command.
pub fn format_annotation(level: Annotation, msg: &str) -> String {
    let escaped = msg
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::{}::{}", level.command(), escaped)
}

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        eprintln!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        eprintln!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a workflow annotation on stdout.
    pub fn annotation(level: Annotation, msg: &str) {
        println!("{}", format_annotation(level, msg));
    }

    /// Create a spinner, hidden when stderr is not a terminal.
    pub fn spinner(msg: &str) -> ProgressBar {
        if !console::Term::stderr().is_term() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_is_single_line() {
        assert_eq!(
            format_annotation(Annotation::Error, "Run failed: bad\nthing 100%"),
            "::error::Run failed: bad%0Athing 100%25"
        );
        assert_eq!(format_annotation(Annotation::Notice, "ok"), "::notice::ok");
    }
}
