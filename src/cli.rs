//! Command-line definition for `kausage`.

use chrono::{Month, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::{collections::BTreeSet, path::PathBuf};

use crate::usage::filter::parse_month;
use crate::usage::stats::TopN;
use crate::usage::{DateGranularity, FilterOptions, FilterSelection};

#[derive(Parser, Debug)]
#[command(name = "kausage")]
#[command(version)]
#[command(about = "Usage analytics dashboard and feedback mail composer", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "KAUSAGE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose one feedback mail per spreadsheet row
    Emails {
        #[command(flatten)]
        source: SourceArgs,

        /// Outbox directory (drafts/ and sent/ are created inside)
        #[arg(long, value_name = "DIR")]
        outbox: Option<PathBuf>,

        /// Send instead of leaving drafts for review
        #[arg(long)]
        send: bool,
    },

    /// Filter the usage table and print KPIs and breakdowns
    Dashboard(DashboardArgs),

    /// List the values each filter accepts
    Options {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the summary workbook
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the grid as an HTML page
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,

        /// Copy the raw workbook into this directory
        #[arg(long = "copy-to", value_name = "DIR")]
        copy_to: Option<PathBuf>,
    },

    /// Ask the dashboard assistant about the filtered data
    Chat {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Question to ask (repeatable); without it questions are read from stdin
        #[arg(long, value_name = "TEXT")]
        ask: Vec<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Spreadsheet to read (xlsx, xls, xlsm, xlsb, ods or csv)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Worksheet name
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Rows in the users-without-feedback ranking (a number or `all`)
    #[arg(long = "top-n", value_name = "N", value_parser = parse_top_n)]
    pub top_n: Option<TopN>,

    /// Raw rows to preview
    #[arg(long, value_name = "N")]
    pub preview: Option<usize>,

    /// Write the filtered rows as CSV
    #[arg(long = "export-csv", value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    /// Write the filtered rows as Parquet
    #[arg(long = "export-parquet", value_name = "FILE")]
    pub export_parquet: Option<PathBuf>,

    /// Write an HTML report
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,
}

/// Filter flags shared by `dashboard` and `chat`. Anything not given falls
/// back to the default selection.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long, value_name = "TOOL")]
    pub tool: Vec<String>,

    /// Management-chain value, matched at any level
    #[arg(long, value_name = "NAME")]
    pub mgmt: Vec<String>,

    /// year, month, week or custom
    #[arg(long, value_name = "G", value_parser = parse_granularity)]
    pub granularity: Vec<DateGranularity>,

    #[arg(long, value_name = "YEAR")]
    pub year: Vec<i32>,

    /// Month name, abbreviation or number
    #[arg(long, value_name = "MONTH", value_parser = parse_month_arg)]
    pub month: Vec<Month>,

    /// Week label, e.g. 2025-W32
    #[arg(long, value_name = "LABEL")]
    pub week: Vec<String>,

    /// Start of the custom range (YYYY-MM-DD, inclusive)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// End of the custom range (YYYY-MM-DD, inclusive)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Restrict the KA view to these usernames
    #[arg(long = "ka-user", value_name = "USER")]
    pub ka_user: Vec<String>,
}

fn parse_top_n(s: &str) -> Result<TopN, String> {
    s.parse().map_err(|e: crate::Error| e.to_string())
}

fn parse_granularity(s: &str) -> Result<DateGranularity, String> {
    s.parse().map_err(|e: crate::Error| e.to_string())
}

fn parse_month_arg(s: &str) -> Result<Month, String> {
    parse_month(s).map_err(|e| e.to_string())
}

impl FilterArgs {
    /// Granularity implied by the date flags when `--granularity` is absent.
    fn implied_granularity(&self) -> BTreeSet<DateGranularity> {
        let mut g = BTreeSet::new();
        if !self.year.is_empty() {
            g.insert(DateGranularity::Year);
        }
        if !self.month.is_empty() {
            g.insert(DateGranularity::Month);
        }
        if !self.week.is_empty() {
            g.insert(DateGranularity::Week);
        }
        if self.from.is_some() || self.to.is_some() {
            g.insert(DateGranularity::Custom);
        }
        g
    }

    /// Overlay the given flags on `options.default_selection()`.
    pub fn to_selection(&self, options: &FilterOptions) -> FilterSelection {
        let mut sel = options.default_selection();

        if !self.tool.is_empty() {
            sel.tools = self.tool.clone();
        }
        if !self.mgmt.is_empty() {
            sel.management = self.mgmt.clone();
        }
        if !self.granularity.is_empty() {
            sel.granularity = self.granularity.iter().copied().collect();
        } else {
            let implied = self.implied_granularity();
            if !implied.is_empty() {
                sel.granularity = implied;
            }
        }
        if !self.year.is_empty() {
            sel.years = self.year.clone();
        }
        if !self.month.is_empty() {
            sel.months = self.month.clone();
        }
        if !self.week.is_empty() {
            sel.weeks = self.week.clone();
        }
        if self.from.is_some() || self.to.is_some() {
            let (lo, hi) = options
                .date_bounds
                .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
            // The open end never crosses the given one.
            let from = self.from.unwrap_or_else(|| self.to.map_or(lo, |to| lo.min(to)));
            let to = self.to.unwrap_or_else(|| hi.max(from));
            sel.date_range = Some((from, to));
        }
        if !self.ka_user.is_empty() {
            sel.ka_users = Some(self.ka_user.clone());
        }
        sel
    }
}
