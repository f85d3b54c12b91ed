// src/email/mod.rs
pub mod outbox;
pub mod template;
pub mod validate;

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};
use tracing::{info, instrument, warn};

use crate::config::EmailSettings;
use crate::error::Result;
use crate::sheet::{self, utils::is_missing, RawSheet};

pub use outbox::{MailClient, OutboxClient, OutgoingMail};
pub use template::{like_style, render_html, render_subject};
pub use validate::validate_email;

/// Columns the feedback workbook must carry.
pub const FEEDBACK_COLUMNS: [&str; 8] = [
    "User",
    "userEmail",
    "Like",
    "dislike",
    "comment",
    "week",
    "year",
    "tools",
];

/// What the mail client does with a composed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Leave as a draft for manual review.
    #[default]
    Display,
    Send,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Display => "display",
            Self::Send => "send",
        })
    }
}

/// One feedback row, normalised for the template.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRow {
    pub user: String,
    pub email: String,
    pub likes: f64,
    pub dislikes: f64,
    pub comment: String,
    pub week: String,
    pub year: String,
    pub tool: String,
}

/// Why a row did not produce a mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum IssueKind {
    MissingUserOrEmail,
    InvalidEmail(String),
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// 1-based position among the non-blank data rows. Fully blank rows
    /// are dropped at load time, so they are neither counted nor reported.
    pub row: usize,
    pub user: Option<String>,
    pub kind: IssueKind,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let user = self.user.as_deref().unwrap_or("<unknown>");
        match &self.kind {
            IssueKind::MissingUserOrEmail => {
                write!(f, "row {}: missing user name or email", self.row)
            }
            IssueKind::InvalidEmail(addr) => {
                write!(f, "row {}: invalid email address for {}: {}", self.row, user, addr)
            }
            IssueKind::Delivery(e) => {
                write!(f, "row {}: could not deliver mail for {}: {}", self.row, user, e)
            }
        }
    }
}

fn text(sheet: &RawSheet, row: usize, col: &str) -> Option<String> {
    sheet
        .get(row, col)
        .map(str::trim)
        .filter(|v| !is_missing(v))
        .map(str::to_string)
}

fn count(raw: Option<&str>) -> std::result::Result<f64, ()> {
    match raw.map(str::trim) {
        None => Ok(0.0),
        Some(v) if is_missing(v) => Ok(0.0),
        Some(v) => v.parse::<f64>().map_err(|_| ()),
    }
}

impl FeedbackRow {
    /// Read data row `row` (0-based) of a sheet that passed the column check.
    pub fn from_sheet_row(sheet: &RawSheet, row: usize) -> std::result::Result<Self, RowIssue> {
        let user = text(sheet, row, "User");
        let email = text(sheet, row, "userEmail");

        let (user, email) = match (user, email) {
            (Some(u), Some(e)) => (u, e),
            (user, _) => {
                return Err(RowIssue {
                    row: row + 1,
                    user,
                    kind: IssueKind::MissingUserOrEmail,
                })
            }
        };
        if !validate_email(&email) {
            return Err(RowIssue {
                row: row + 1,
                user: Some(user),
                kind: IssueKind::InvalidEmail(email),
            });
        }

        let likes = count(sheet.get(row, "Like"));
        let dislikes = count(sheet.get(row, "dislike"));
        let (likes, dislikes) = match (likes, dislikes) {
            (Ok(l), Ok(d)) => (l, d),
            _ => {
                warn!(row = row + 1, user = %user, "invalid numeric values, using 0");
                (0.0, 0.0)
            }
        };

        Ok(Self {
            user,
            email,
            likes,
            dislikes,
            comment: text(sheet, row, "comment").unwrap_or_default(),
            week: text(sheet, row, "week").unwrap_or_default(),
            year: text(sheet, row, "year").unwrap_or_else(|| "N/A".into()),
            tool: text(sheet, row, "tools").unwrap_or_default(),
        })
    }
}

/// Tally of one compose run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposeReport {
    pub success: usize,
    pub errors: usize,
    pub skipped: Vec<RowIssue>,
}

impl ComposeReport {
    pub fn summary(&self) -> String {
        format!(
            "Summary: {} emails processed successfully, {} errors",
            self.success, self.errors
        )
    }

    fn fail(&mut self, issue: RowIssue) {
        warn!("{}", issue);
        self.errors += 1;
        self.skipped.push(issue);
    }
}

/// Compose one mail per row and hand it to `client`. Missing columns stop
/// the run before anything is delivered; per-row problems are counted.
#[instrument(level = "info", skip_all, fields(rows = sheet.len(), mode = %settings.mode))]
pub fn compose_all<C>(sheet: &RawSheet, client: &mut C, settings: &EmailSettings) -> Result<ComposeReport>
where
    C: MailClient + ?Sized,
{
    sheet.require_columns(&FEEDBACK_COLUMNS)?;
    info!("loaded {} feedback rows", sheet.len());

    let mut report = ComposeReport::default();
    for i in 0..sheet.len() {
        let row = match FeedbackRow::from_sheet_row(sheet, i) {
            Ok(r) => r,
            Err(issue) => {
                report.fail(issue);
                continue;
            }
        };

        let mail = OutgoingMail {
            from: settings.sender.clone(),
            to: row.email.clone(),
            subject: render_subject(&settings.subject_prefix, &row),
            html_body: render_html(&row),
        };
        match client.deliver(&mail, settings.mode) {
            Ok(()) => {
                report.success += 1;
                info!(user = %row.user, email = %row.email, "email created");
            }
            Err(e) => report.fail(RowIssue {
                row: i + 1,
                user: Some(row.user),
                kind: IssueKind::Delivery(e.to_string()),
            }),
        }
    }

    info!(success = report.success, errors = report.errors, "compose finished");
    Ok(report)
}

/// Load the feedback workbook, connect to the outbox and compose every row.
pub fn run(path: &Path, settings: &EmailSettings) -> Result<ComposeReport> {
    let sheet = sheet::load_sheet(path, settings.sheet.as_deref())?;
    let mut client = OutboxClient::connect(&settings.outbox)?;
    compose_all(&sheet, &mut client, settings)
}
