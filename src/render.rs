//! HTML and plain-text rendering of a [`Report`].

use std::fmt::Write;

use anyhow::Result;

use stargazer_core::cache::Report;
use stargazer_core::models::RankEntry;

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:60rem;color:#222}\
table{border-collapse:collapse;width:100%}\
th,td{padding:.35rem .6rem;border-bottom:1px solid #ddd;text-align:right}\
th:nth-child(2),td:nth-child(2){text-align:left}\
.up{color:#1a7f37}.down{color:#cf222e}.meta{color:#666;font-size:.9rem}";

/// Render the trending page.
pub fn render_html(report: &Report, window_hours: i64) -> Result<String> {
    let mut out = String::with_capacity(256 + report.entries.len() * 160);

    write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Trending repositories</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>Most starred in the last {} hours</h1>\n",
        STYLE, window_hours
    )?;

    write!(
        out,
        "<p class=\"meta\">Computed {}{}</p>\n",
        report.computed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if report.stale {
            " (refresh failed, showing previous result)"
        } else {
            ""
        }
    )?;

    if report.entries.is_empty() {
        out.push_str("<p>No stars recorded in this window yet.</p>\n</body>\n</html>\n");
        return Ok(out);
    }

    out.push_str(
        "<table>\n<thead><tr><th>Rank</th><th>Repository</th><th>Previous rank</th>\
         <th>Change</th><th>Stars</th></tr></thead>\n<tbody>\n",
    );

    for entry in report.entries.iter() {
        let subject = escape_html(&entry.subject);
        let class = match entry.rank_change {
            c if c > 0 => "up",
            c if c < 0 => "down",
            _ => "",
        };
        write!(
            out,
            "<tr><td>{}</td><td><a href=\"https://github.com/{}\">{}</a></td><td>{}</td>\
             <td class=\"{}\">{}</td><td>{}</td></tr>\n",
            entry.current_rank,
            subject,
            subject,
            previous_rank_label(entry),
            class,
            format_change(entry.rank_change),
            entry.watch_count
        )?;
    }

    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    Ok(out)
}

/// Render entries as a fixed-width table for the terminal.
pub fn render_text(entries: &[RankEntry]) -> String {
    let width = entries
        .iter()
        .map(|e| e.subject.chars().count())
        .max()
        .unwrap_or(0)
        .max("REPOSITORY".len());

    let mut out = format!(
        "{:>4}  {:<width$}  {:>8}  {:>6}  {:>6}\n",
        "RANK", "REPOSITORY", "PREVIOUS", "CHANGE", "STARS"
    );
    for e in entries {
        out.push_str(&format!(
            "{:>4}  {:<width$}  {:>8}  {:>6}  {:>6}\n",
            e.current_rank,
            e.subject,
            previous_rank_label(e),
            format_change(e.rank_change),
            e.watch_count
        ));
    }
    out
}

fn previous_rank_label(entry: &RankEntry) -> String {
    entry
        .previous_rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "new".to_string())
}

fn format_change(change: i64) -> String {
    if change > 0 {
        format!("+{}", change)
    } else {
        change.to_string()
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn report(entries: Vec<RankEntry>, stale: bool) -> Report {
        Report {
            entries: Arc::new(entries),
            computed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            stale,
        }
    }

    fn entry(subject: &str, rank: i64, previous: Option<i64>, change: i64, watches: i64) -> RankEntry {
        RankEntry {
            subject: subject.to_string(),
            current_rank: rank,
            previous_rank: previous,
            rank_change: change,
            watch_count: watches,
        }
    }

    #[test]
    fn test_html_has_one_row_per_entry() {
        let html = render_html(
            &report(
                vec![
                    entry("rust-lang/rust", 1, Some(2), 1, 50),
                    entry("tokio-rs/tokio", 2, None, 99, 30),
                ],
                false,
            ),
            24,
        )
        .unwrap();

        assert_eq!(html.matches("<tr><td>").count(), 2);
        assert!(html.contains("https://github.com/rust-lang/rust"));
        assert!(html.contains("<td class=\"up\">+99</td>"));
        assert!(html.contains("<td>new</td>"));
        assert!(html.contains("Computed 2024-03-01 12:00:00 UTC</p>"));
    }

    #[test]
    fn test_html_escapes_subject() {
        let html = render_html(&report(vec![entry("<b>&x", 1, Some(1), 0, 1)], false), 24).unwrap();
        assert!(html.contains("&lt;b&gt;&amp;x"));
        assert!(!html.contains("<b>&x"));
    }

    #[test]
    fn test_html_marks_stale_and_empty() {
        let html = render_html(&report(Vec::new(), true), 24).unwrap();
        assert!(html.contains("showing previous result"));
        assert!(html.contains("No stars recorded"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_text_table() {
        let text = render_text(&[
            entry("a/a", 1, Some(3), 2, 10),
            entry("b/b", 2, Some(1), -1, 7),
        ]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("RANK"));
        assert!(lines[1].contains("+2"));
        assert!(lines[2].contains("-1"));
    }
}
