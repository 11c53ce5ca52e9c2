use minijinja::{context, Environment};
use serde::Serialize;

use crate::conversation_log::LogEntry;

const ADMIN_TEMPLATE: &str = include_str!("templates/admin.html");

pub const RECENT_ROWS: usize = 10;
const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Serialize)]
struct DashboardRow {
    time: String,
    user: String,
    bot: String,
}

impl DashboardRow {
    fn from_entry(entry: &LogEntry) -> Self {
        Self {
            time: entry.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            user: preview(&entry.user_text),
            bot: preview(&entry.bot_text),
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// `recent` is expected newest first. Entry text is HTML-escaped.
pub fn render_dashboard(
    total_conversations: usize,
    recent: &[LogEntry],
) -> Result<String, minijinja::Error> {
    let rows = recent
        .iter()
        .take(RECENT_ROWS)
        .map(DashboardRow::from_entry)
        .collect::<Vec<_>>();

    let mut env = Environment::new();
    env.add_template("admin.html", ADMIN_TEMPLATE)?;
    let template = env.get_template("admin.html")?;
    template.render(context! {
        total_conversations => total_conversations,
        rows => rows,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn entry(user: &str, bot: &str) -> LogEntry {
        LogEntry {
            customer_id: "demo".to_string(),
            timestamp: Utc
                .with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
                .single()
                .expect("valid timestamp"),
            user_text: user.to_string(),
            bot_text: bot.to_string(),
        }
    }

    #[test]
    fn dashboard_shows_total_and_rows() {
        let html = render_dashboard(42, &[entry("Hi", "Hello!")]).expect("renders");

        assert!(html.contains("<h3>42</h3>"));
        assert!(html.contains("<td>2026-03-14T09:26:53</td>"));
        assert!(html.contains("<td>Hi...</td>"));
        assert!(html.contains("<td>Hello!...</td>"));
    }

    #[test]
    fn long_texts_are_cut_at_sixty_characters() {
        let long = "ø".repeat(80);
        let html = render_dashboard(1, &[entry(&long, "short")]).expect("renders");

        let expected = format!("<td>{}...</td>", "ø".repeat(60));
        assert!(html.contains(&expected));
        assert!(!html.contains(&"ø".repeat(61)));
    }

    #[test]
    fn entry_text_is_escaped() {
        let html = render_dashboard(1, &[entry("<script>alert(1)</script>", "ok")])
            .expect("renders");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn at_most_ten_rows_are_rendered() {
        let entries = (0..15)
            .map(|n| entry(&format!("message {n}"), "reply"))
            .collect::<Vec<_>>();
        let html = render_dashboard(15, &entries).expect("renders");

        assert_eq!(html.matches("<td>message ").count(), RECENT_ROWS);
        assert!(html.contains("message 9..."));
        assert!(!html.contains("message 10..."));
    }
}
