// Output formatting — terminal display, JSON reports, stage progress.

pub mod report;
pub mod terminal;

use indicatif::{ProgressBar, ProgressStyle};

pub use report::{CellReport, MatrixReport};

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte slicing (`&text[..120]`), this respects UTF-8 character boundaries
/// and will never panic on multi-byte characters like emoji or accented letters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Progress bar for one pipeline stage, hidden unless `visible`.
pub fn stage_progress(len: usize, label: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template(&format!("  {label} [{{bar:30}}] {{pos}}/{{len}} ({{eta}})"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
