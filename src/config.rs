// src/config.rs
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::info;

use crate::email::DeliveryMode;
use crate::error::Result;

/// Top-level configuration, read from YAML. Every field has a default, so an
/// empty file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub usage: UsageSource,
    pub summary: SummarySource,
    pub email: EmailSettings,
    pub dashboard: DashboardDefaults,
    pub chatbot: ChatbotSettings,
}

impl Config {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = fs::read_to_string(p)?;
                let cfg = Self::from_yaml_str(&text)?;
                info!(path = %p.display(), "loaded config");
                Ok(cfg)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Where the usage table lives and how its columns are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSource {
    pub path: PathBuf,
    pub sheet: Option<String>,
    pub cache_ttl_secs: u64,
    pub columns: UsageColumns,
}

impl Default for UsageSource {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/usage.xlsx"),
            sheet: Some("KA_Data".into()),
            cache_ttl_secs: 3600,
            columns: UsageColumns::default(),
        }
    }
}

impl UsageSource {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Column names of the usage sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageColumns {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub tool: String,
    pub date: String,
    pub iso_year: String,
    pub week_label: String,
    pub rating: String,
    pub comment: String,
    /// Management chain columns are `"{mgmt_prefix}{n}"` for `n` in `1..=mgmt_levels`.
    pub mgmt_prefix: String,
    pub mgmt_levels: usize,
}

impl Default for UsageColumns {
    fn default() -> Self {
        Self {
            username: "Username".into(),
            full_name: "Full Name".into(),
            email: "Email".into(),
            tool: "tool".into(),
            date: "Date".into(),
            iso_year: "iso_year".into(),
            week_label: "year_week_label".into(),
            rating: "metadata.feedback_rating".into(),
            comment: "metadata.feedback_comment".into(),
            mgmt_prefix: "Mgmnt Chain ".into(),
            mgmt_levels: 11,
        }
    }
}

impl UsageColumns {
    pub fn mgmt_columns(&self) -> Vec<String> {
        (1..=self.mgmt_levels)
            .map(|n| format!("{}{}", self.mgmt_prefix, n))
            .collect()
    }

    pub fn required(&self) -> [&str; 6] {
        [
            self.username.as_str(),
            self.tool.as_str(),
            self.date.as_str(),
            self.iso_year.as_str(),
            self.week_label.as_str(),
            self.rating.as_str(),
        ]
    }
}

/// The pivot/summary workbook shown as a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySource {
    pub path: PathBuf,
    pub sheet: Option<String>,
}

impl Default for SummarySource {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/summary.xlsx"),
            sheet: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub path: PathBuf,
    pub sheet: Option<String>,
    pub outbox: PathBuf,
    pub mode: DeliveryMode,
    pub subject_prefix: String,
    pub sender: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/feedback.xlsx"),
            sheet: None,
            outbox: PathBuf::from("outbox"),
            mode: DeliveryMode::Display,
            subject_prefix: "Feedback Report".into(),
            sender: "performance-analytics@localhost".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardDefaults {
    pub title: String,
    /// Tools preselected when no `--tool` is given; empty means every tool.
    pub default_tools: Vec<String>,
    pub default_management: Vec<String>,
    pub top_n: usize,
    pub preview_rows: usize,
}

impl Default for DashboardDefaults {
    fn default() -> Self {
        Self {
            title: "Executive Dashboard".into(),
            default_tools: Vec::new(),
            default_management: Vec::new(),
            top_n: 10,
            preview_rows: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatbotSettings {
    pub assistant_name: String,
}

impl Default for ChatbotSettings {
    fn default() -> Self {
        Self {
            assistant_name: "Executive Dashboard assistant".into(),
        }
    }
}
