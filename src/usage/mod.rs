// src/usage/mod.rs
pub mod filter;
pub mod options;
pub mod stats;

use chrono::NaiveDate;
use serde::Serialize;
use std::{fmt, path::Path};
use tracing::{debug, warn};

use crate::config::UsageColumns;
use crate::error::Result;
use crate::sheet::{self, date_parser::parse_date, utils::is_missing, RawSheet};

pub use filter::{apply, DateGranularity, FilterSelection, FilteredView};
pub use options::FilterOptions;

/// Feedback attached to one usage record, lower-cased on load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackRating {
    Like,
    Dislike,
    Comment,
    None,
    /// Anything else, including blank cells.
    Other(String),
}

impl FeedbackRating {
    pub fn parse(raw: &str) -> Self {
        let v = raw.trim().to_lowercase();
        match v.as_str() {
            "like" => Self::Like,
            "dislike" => Self::Dislike,
            "comment" => Self::Comment,
            "none" => Self::None,
            _ => Self::Other(v),
        }
    }

    /// like, dislike or comment.
    pub fn is_given(&self) -> bool {
        matches!(self, Self::Like | Self::Dislike | Self::Comment)
    }

    /// One of the four ratings the dashboard knows about.
    pub fn is_known(&self) -> bool {
        self.is_given() || matches!(self, Self::None)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
            Self::Comment => "comment",
            Self::None => "none",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for FeedbackRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One row of the usage sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub tool: Option<String>,
    pub date: Option<NaiveDate>,
    pub iso_year: Option<i32>,
    pub week_label: Option<String>,
    pub rating: FeedbackRating,
    pub comment: Option<String>,
    /// Reporting hierarchy, top-down; absent levels are skipped.
    pub mgmt_chain: Vec<String>,
    /// Original cells in sheet column order, kept for export.
    #[serde(skip)]
    pub raw: Vec<String>,
}

/// The usage sheet parsed into records.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageTable {
    pub headers: Vec<String>,
    pub records: Vec<UsageRecord>,
}

fn optional(row: &[String], idx: Option<usize>) -> Option<String> {
    idx.map(|i| row[i].trim())
        .filter(|v| !is_missing(v))
        .map(str::to_string)
}

fn parse_year(raw: &str) -> Option<i32> {
    let v = raw.trim();
    if is_missing(v) {
        return None;
    }
    v.parse::<i32>()
        .ok()
        .or_else(|| v.parse::<f64>().ok().map(|f| f as i32))
}

impl UsageTable {
    /// Map a raw sheet onto usage records. Required columns must be present;
    /// optional ones (full name, email, comment, management chain) are used
    /// when they are.
    pub fn from_sheet(sheet: &RawSheet, columns: &UsageColumns) -> Result<Self> {
        sheet.require_columns(&columns.required())?;

        let idx = |name: &str| sheet.column_index(name);
        let username = idx(&columns.username);
        let full_name = idx(&columns.full_name);
        let email = idx(&columns.email);
        let tool = idx(&columns.tool);
        let date = idx(&columns.date);
        let iso_year = idx(&columns.iso_year);
        let week_label = idx(&columns.week_label);
        let comment = idx(&columns.comment);
        // required() was checked above
        let rating = idx(&columns.rating).unwrap_or_default();

        let mgmt: Vec<usize> = columns
            .mgmt_columns()
            .iter()
            .filter_map(|c| idx(c))
            .collect();
        debug!(levels = mgmt.len(), "management chain columns present");

        let mut bad_dates = 0usize;
        let records: Vec<UsageRecord> = sheet
            .rows
            .iter()
            .map(|row| {
                let raw_date = date.map(|i| row[i].as_str()).unwrap_or_default();
                let parsed_date = parse_date(raw_date);
                if parsed_date.is_none() && !is_missing(raw_date) {
                    bad_dates += 1;
                }
                UsageRecord {
                    username: optional(row, username),
                    full_name: optional(row, full_name),
                    email: optional(row, email),
                    tool: optional(row, tool),
                    date: parsed_date,
                    iso_year: iso_year.and_then(|i| parse_year(&row[i])),
                    week_label: optional(row, week_label),
                    rating: FeedbackRating::parse(&row[rating]),
                    comment: optional(row, comment),
                    mgmt_chain: mgmt.iter().filter_map(|&i| optional(row, Some(i))).collect(),
                    raw: row.clone(),
                }
            })
            .collect();

        if bad_dates > 0 {
            warn!(count = bad_dates, "unparseable dates treated as missing");
        }

        Ok(Self {
            headers: sheet.headers.clone(),
            records,
        })
    }

    /// Read the spreadsheet at `path` and parse it.
    pub fn load(path: &Path, sheet_name: Option<&str>, columns: &UsageColumns) -> Result<Self> {
        let raw = sheet::load_sheet(path, sheet_name)?;
        Self::from_sheet(&raw, columns)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
