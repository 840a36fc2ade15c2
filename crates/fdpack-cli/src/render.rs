use anstyle::{AnsiColor, Effects, Style};
use fdpack_core::PackageRecord;
use indicatif::{ProgressBar, ProgressStyle};

pub fn print_status(status: &str, message: &str) {
    println!("{} {message}", colorize(status_style(), status));
}

pub fn print_error(message: &str) {
    eprintln!("{} {message}", colorize(error_style(), "error:"));
}

pub fn start_progress(label: &str, total: u64) -> ProgressBar {
    let progress_bar = ProgressBar::new(total.max(1));
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.cyan.bold} {msg:<10} [{bar:20.cyan/blue}] {pos:>4}/{len:4}",
    ) {
        progress_bar.set_style(style.progress_chars("=>-"));
    }
    progress_bar.set_message(label.to_string());
    progress_bar
}

/// Registry rows for `fdpack list`, name and version columns padded so the
/// table stays readable.
pub fn format_record_lines(records: &[PackageRecord]) -> Vec<String> {
    let name_width = records
        .iter()
        .map(|record| record.name.len())
        .max()
        .unwrap_or(0);
    let version_width = records
        .iter()
        .map(|record| record.version.len())
        .max()
        .unwrap_or(0);

    records
        .iter()
        .map(|record| {
            format!(
                "{:name_width$}  {:version_width$}  {}  {}  {}",
                record.name, record.version, record.guid, record.install_path, record.install_date
            )
        })
        .collect()
}

/// What is already installed when an install attempt hits a reconciliation
/// conflict.
pub fn format_conflict_lines(records: &[PackageRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            format!(
                "  installed: {} {} ({}) at {}, since {}",
                record.name, record.version, record.guid, record.install_path, record.install_date
            )
        })
        .collect()
}

fn status_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightGreen.into()))
        .effects(Effects::BOLD)
}

fn error_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightRed.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
