//! Text rendering of dashboard results for the terminal.

pub mod html;

use std::fmt::Write;

use crate::usage::stats::{Kpis, ToolFeedback, UserCount, WeekFeedback};
use crate::usage::UsageRecord;

pub use html::{sheet_to_html, HtmlReport};

/// `1234567` → `"1,234,567"`.
pub fn fmt_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn render_kpis(k: &Kpis) -> String {
    format!(
        "{:<18} {:>12}\n{:<18} {:>12}\n{:<18} {:>12}\n{:<18} {:>11.2}%\n",
        "Unique Users",
        fmt_thousands(k.unique_users),
        "Total Queries",
        fmt_thousands(k.total_queries),
        "Feedback Count",
        fmt_thousands(k.feedback_given),
        "Feedback %",
        k.feedback_pct
    )
}

pub fn render_feedback_by_tool(rows: &[ToolFeedback]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<20} {:<10} {:>8}", "Tool", "Rating", "Count");
    let _ = writeln!(out, "{:-<40}", "");
    for r in rows {
        let _ = writeln!(out, "{:<20} {:<10} {:>8}", r.tool, r.rating, r.count);
    }
    out
}

pub fn render_users_without_feedback(rows: &[UserCount]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<30} {:>18}", "Username", "No Feedback Count");
    let _ = writeln!(out, "{:-<49}", "");
    for r in rows {
        let _ = writeln!(out, "{:<30} {:>18}", r.username, r.count);
    }
    out
}

pub fn render_weekly(rows: &[WeekFeedback]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>8} {:>9} {:>7} {:>10}",
        "Week", "Queries", "Feedback", "Rated", "Feedback %"
    );
    let _ = writeln!(out, "{:-<50}", "");
    for w in rows {
        let _ = writeln!(
            out,
            "{:<12} {:>8} {:>9} {:>7} {:>9.2}%",
            w.week, w.queries, w.feedback_given, w.feedback_total, w.feedback_pct
        );
    }
    out
}

/// First `limit` rows with every original column, tab separated.
pub fn render_preview(headers: &[String], records: &[&UsageRecord], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", headers.join("\t"));
    for r in records.iter().take(limit) {
        let _ = writeln!(out, "{}", r.raw.join("\t"));
    }
    if records.len() > limit {
        let _ = writeln!(out, "... {} more rows", records.len() - limit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::stats::{feedback_by_tool, Kpis};
    use crate::usage::tests::sample_table;

    #[test]
    fn thousands_separator() {
        assert_eq!(fmt_thousands(0), "0");
        assert_eq!(fmt_thousands(999), "999");
        assert_eq!(fmt_thousands(1000), "1,000");
        assert_eq!(fmt_thousands(1234567), "1,234,567");
    }

    #[test]
    fn kpi_block() {
        let table = sample_table();
        let all: Vec<&UsageRecord> = table.records.iter().collect();
        let text = render_kpis(&Kpis::compute(&all));
        assert!(text.contains("Unique Users"));
        assert!(text.contains("60.00%"));
    }

    #[test]
    fn tool_table_lists_each_pair() {
        let table = sample_table();
        let all: Vec<&UsageRecord> = table.records.iter().collect();
        let text = render_feedback_by_tool(&feedback_by_tool(&all));
        assert_eq!(text.lines().count(), 2 + 4);
        assert!(text.contains("dislike"));
    }

    #[test]
    fn preview_is_truncated() {
        let table = sample_table();
        let all: Vec<&UsageRecord> = table.records.iter().collect();
        let text = render_preview(&table.headers, &all, 2);
        assert!(text.starts_with("Username\tFull Name"));
        assert!(text.ends_with("... 4 more rows\n"));
    }
}
