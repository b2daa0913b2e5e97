use crate::document::UpsertOutcome;
use crate::message::Message;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

/// Longest message body printed in full by `message_line`
const PREVIEW_CHARS: usize = 200;

pub fn header(text: &str) {
    println!("{} {}", Icons::DATABASE, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// One history entry: time, role, and the body cut to a preview
pub fn message_line(message: &Message) {
    let time = message.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    println!(
        "{} {}: {}",
        dim(&time),
        message.role.style(theme().role(&message.role)),
        preview(&message.text, PREVIEW_CHARS)
    );
}

/// Report what an upsert did to a document
pub fn outcome_line(external_id: &str, title: &str, outcome: UpsertOutcome) {
    let (icon, style) = match outcome {
        UpsertOutcome::Inserted => (Icons::NEW, theme().success.clone()),
        UpsertOutcome::Updated => (Icons::MOD, theme().warn.clone()),
        UpsertOutcome::Unchanged => (Icons::SAME, theme().dim.clone()),
    };
    println!("{} {} {} ({})", icon, title, dim(external_id), outcome.as_str().style(style));
}

/// First `max` characters of `text`, on one line
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("two\nlines", 10), "two lines");
        assert_eq!(preview("abcdefghij", 4), "abcd…");
    }
}
