pub mod course_detail;
pub mod courses;
pub mod goal_detail;
pub mod goals;
pub mod overview;

use chrono::DateTime;

// Counts chars, not bytes: course titles are often Turkish
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn percent_bar(percent: i32, width: usize) -> String {
    let filled = (percent.clamp(0, 100) as usize * width) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn format_date(date_str: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        dt.format("%b %d").to_string()
    } else {
        date_str.chars().take(10).collect()
    }
}
