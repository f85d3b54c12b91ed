//! HTML dashboard report with embedded CSS.

use std::fmt::Write;

use crate::report::fmt_thousands;
use crate::sheet::RawSheet;
use crate::usage::stats::{Kpis, ToolFeedback, UserCount, WeekFeedback};
use crate::usage::UsageRecord;

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLES: &str = r#"
        body {
            font-family: 'Segoe UI', Arial, sans-serif;
            margin: 20px;
            background-color: #f8f9fa;
        }
        h1, h2 {
            color: #333;
        }
        .kpis {
            display: flex;
            flex-wrap: wrap;
            gap: 16px;
            margin-bottom: 24px;
        }
        .kpi {
            background-color: white;
            border-radius: 6px;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            padding: 16px 24px;
            min-width: 160px;
        }
        .kpi .value {
            font-size: 24px;
            font-weight: bold;
            color: #6E2BC2;
        }
        .kpi .label {
            font-size: 12px;
            color: #666;
        }
        table {
            border-collapse: collapse;
            width: 100%;
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            margin-bottom: 20px;
        }
        th, td {
            border: 1px solid #dee2e6;
            padding: 8px;
            text-align: left;
        }
        th {
            background-color: #6E2BC2;
            color: white;
        }
        tr:nth-child(even) {
            background-color: #f9f9f9;
        }
        .footer {
            margin-top: 20px;
            font-size: 0.8em;
            color: #888;
            text-align: center;
        }
"#;

fn table(out: &mut String, headers: &[&str], rows: impl Iterator<Item = Vec<String>>) {
    out.push_str("<table>\n<tr>");
    for h in headers {
        let _ = write!(out, "<th>{}</th>", escape_html(h));
    }
    out.push_str("</tr>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(&cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

/// Builder for the dashboard page. Sections render in the order they are added.
#[derive(Debug)]
pub struct HtmlReport {
    title: String,
    sections: Vec<String>,
}

impl HtmlReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    pub fn add_kpis(&mut self, k: &Kpis) -> &mut Self {
        let cards = [
            ("Unique Users", fmt_thousands(k.unique_users)),
            ("Total Queries", fmt_thousands(k.total_queries)),
            ("Feedback Count", fmt_thousands(k.feedback_given)),
            ("Feedback %", format!("{:.2}%", k.feedback_pct)),
        ];
        let mut s = String::from("<div class=\"kpis\">\n");
        for (label, value) in cards {
            let _ = writeln!(
                s,
                "<div class=\"kpi\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>",
                escape_html(&value),
                label
            );
        }
        s.push_str("</div>\n");
        self.sections.push(s);
        self
    }

    pub fn add_feedback_by_tool(&mut self, rows: &[ToolFeedback]) -> &mut Self {
        let mut s = String::from("<h2>Feedback Distribution by Tool</h2>\n");
        table(
            &mut s,
            &["Tool", "Rating", "Count"],
            rows.iter()
                .map(|r| vec![r.tool.clone(), r.rating.to_string(), r.count.to_string()]),
        );
        self.sections.push(s);
        self
    }

    pub fn add_users_without_feedback(&mut self, rows: &[UserCount], label: &str) -> &mut Self {
        let mut s = format!(
            "<h2>Users Using Tools Without Feedback ({})</h2>\n",
            escape_html(label)
        );
        table(
            &mut s,
            &["Username", "No Feedback Count"],
            rows.iter()
                .map(|r| vec![r.username.clone(), r.count.to_string()]),
        );
        self.sections.push(s);
        self
    }

    pub fn add_weekly(&mut self, rows: &[WeekFeedback]) -> &mut Self {
        let mut s = String::from("<h2>Weekly Feedback</h2>\n");
        table(
            &mut s,
            &["Week", "Queries", "Feedback", "Rated", "Feedback %"],
            rows.iter().map(|w| {
                vec![
                    w.week.clone(),
                    w.queries.to_string(),
                    w.feedback_given.to_string(),
                    w.feedback_total.to_string(),
                    format!("{:.2}%", w.feedback_pct),
                ]
            }),
        );
        self.sections.push(s);
        self
    }

    pub fn add_raw_table(
        &mut self,
        headers: &[String],
        records: &[&UsageRecord],
        limit: usize,
    ) -> &mut Self {
        let mut s = format!(
            "<h2>Raw Data ({} of {} rows)</h2>\n",
            records.len().min(limit),
            records.len()
        );
        let hdrs: Vec<&str> = headers.iter().map(String::as_str).collect();
        table(&mut s, &hdrs, records.iter().take(limit).map(|r| r.raw.clone()));
        self.sections.push(s);
        self
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<h1>{}</h1>\n",
            escape_html(&self.title),
            STYLES,
            escape_html(&self.title)
        );
        for s in &self.sections {
            out.push_str(s);
        }
        out.push_str("<div class=\"footer\">Generated by kausage</div>\n</body>\n</html>\n");
        out
    }
}

/// Render a whole sheet (e.g. the summary pivot) as a standalone HTML grid.
pub fn sheet_to_html(title: &str, sheet: &RawSheet) -> String {
    let mut body = String::new();
    let hdrs: Vec<&str> = sheet.headers.iter().map(String::as_str).collect();
    table(&mut body, &hdrs, sheet.rows.iter().cloned());

    let mut report = HtmlReport::new(title);
    report.sections.push(body);
    report.to_html()
}
