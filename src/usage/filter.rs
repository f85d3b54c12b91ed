use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};
use tracing::debug;

use crate::error::{Error, Result};
use crate::usage::{UsageRecord, UsageTable};

/// Which date filters are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateGranularity {
    Year,
    Month,
    Week,
    Custom,
}

impl FromStr for DateGranularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "week" => Ok(Self::Week),
            "custom" => Ok(Self::Custom),
            other => Err(Error::InvalidFilter(format!(
                "unknown granularity `{}` (expected year, month, week or custom)",
                other
            ))),
        }
    }
}

impl fmt::Display for DateGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Year => "Year",
            Self::Month => "Month",
            Self::Week => "Week",
            Self::Custom => "Custom",
        };
        f.pad(s)
    }
}

/// Parse a month given by English name, abbreviation or number (1-12).
pub fn parse_month(s: &str) -> Result<Month> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        return Month::try_from(n)
            .map_err(|_| Error::InvalidFilter(format!("month out of range: {}", n)));
    }
    s.parse::<Month>()
        .map_err(|_| Error::InvalidFilter(format!("unknown month `{}`", s)))
}

/// The user's filter choices. Every mask is independent of the others.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub tools: Vec<String>,
    pub management: Vec<String>,
    pub granularity: BTreeSet<DateGranularity>,
    pub years: Vec<i32>,
    pub months: Vec<Month>,
    pub weeks: Vec<String>,
    /// Inclusive on both ends.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// `None` selects every user that has a full name.
    pub ka_users: Option<Vec<String>>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            tools: Vec::new(),
            management: Vec::new(),
            granularity: BTreeSet::from([DateGranularity::Week]),
            years: Vec::new(),
            months: Vec::new(),
            weeks: Vec::new(),
            date_range: None,
            ka_users: None,
        }
    }
}

impl FilterSelection {
    pub fn with_tools<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: tools.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn active(&self, g: DateGranularity) -> bool {
        self.granularity.contains(&g)
    }

    /// True when `record` survives every active mask (the KA-user subset is
    /// handled separately).
    pub fn matches(&self, record: &UsageRecord) -> bool {
        self.matches_tool(record)
            && self.matches_management(record)
            && self.matches_range(record)
            && self.matches_year(record)
            && self.matches_month(record)
            && self.matches_week(record)
    }

    fn matches_tool(&self, r: &UsageRecord) -> bool {
        r.tool
            .as_deref()
            .map_or(false, |t| self.tools.iter().any(|s| s == t))
    }

    fn matches_management(&self, r: &UsageRecord) -> bool {
        self.management.is_empty()
            || r.mgmt_chain
                .iter()
                .any(|m| self.management.iter().any(|s| s.trim() == m))
    }

    fn matches_range(&self, r: &UsageRecord) -> bool {
        match (self.active(DateGranularity::Custom), self.date_range) {
            (true, Some((from, to))) => r.date.map_or(false, |d| d >= from && d <= to),
            _ => true,
        }
    }

    fn matches_year(&self, r: &UsageRecord) -> bool {
        !self.active(DateGranularity::Year)
            || self.years.is_empty()
            || r.iso_year.map_or(false, |y| self.years.contains(&y))
    }

    fn matches_month(&self, r: &UsageRecord) -> bool {
        !self.active(DateGranularity::Month)
            || self.months.is_empty()
            || r.date.map_or(false, |d| {
                self.months
                    .iter()
                    .any(|m| m.number_from_month() == d.month())
            })
    }

    fn matches_week(&self, r: &UsageRecord) -> bool {
        !self.active(DateGranularity::Week)
            || self.weeks.is_empty()
            || r.week_label
                .as_deref()
                .map_or(false, |w| self.weeks.iter().any(|s| s == w))
    }
}

/// Result of applying a selection: the filtered rows plus the subset
/// restricted to the selected KA users.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    pub headers: &'a [String],
    pub records: Vec<&'a UsageRecord>,
    pub ka_records: Vec<&'a UsageRecord>,
}

impl FilteredView<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Apply `selection` to `table`. An empty tool selection is rejected.
pub fn apply<'a>(table: &'a UsageTable, selection: &FilterSelection) -> Result<FilteredView<'a>> {
    if selection.tools.is_empty() {
        return Err(Error::NoToolsSelected);
    }
    if selection.active(DateGranularity::Custom) {
        if let Some((from, to)) = selection.date_range {
            if from > to {
                return Err(Error::InvalidFilter(format!(
                    "date range start {} is after end {}",
                    from, to
                )));
            }
        }
    }

    let records: Vec<&UsageRecord> = table
        .records
        .iter()
        .filter(|r| selection.matches(r))
        .collect();

    let ka_records: Vec<&UsageRecord> = match &selection.ka_users {
        Some(users) => records
            .iter()
            .copied()
            .filter(|r| {
                r.username
                    .as_deref()
                    .map_or(false, |u| users.iter().any(|s| s == u))
            })
            .collect(),
        None => {
            let users: BTreeSet<&str> = table
                .records
                .iter()
                .filter(|r| r.full_name.is_some())
                .filter_map(|r| r.username.as_deref())
                .collect();
            records
                .iter()
                .copied()
                .filter(|r| r.username.as_deref().map_or(false, |u| users.contains(u)))
                .collect()
        }
    };

    debug!(
        total = table.len(),
        filtered = records.len(),
        ka = ka_records.len(),
        "applied filters"
    );

    Ok(FilteredView {
        headers: &table.headers,
        records,
        ka_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::tests::sample_table;

    fn names(view: &[&UsageRecord]) -> Vec<String> {
        view.iter()
            .map(|r| {
                format!(
                    "{}/{}",
                    r.username.clone().unwrap_or_default(),
                    r.tool.clone().unwrap_or_default()
                )
            })
            .collect()
    }

    #[test]
    fn no_tools_is_rejected() {
        let table = sample_table();
        let err = apply(&table, &FilterSelection::default()).unwrap_err();
        assert!(matches!(err, Error::NoToolsSelected));
    }

    #[test]
    fn tool_filter_keeps_only_selected_tools() -> Result<()> {
        let table = sample_table();
        let view = apply(&table, &FilterSelection::with_tools(["vcs"]))?;
        assert_eq!(names(&view.records), vec!["alice/vcs", "bob/vcs", "bob/vcs"]);
        Ok(())
    }

    #[test]
    fn management_matches_any_level() -> Result<()> {
        let table = sample_table();
        let mut sel = FilterSelection::with_tools(["vcs", "pt", "fc"]);
        sel.management = vec!["Lead C".into(), "Lead B".into()];
        let view = apply(&table, &sel)?;
        assert_eq!(names(&view.records), vec!["bob/vcs", "bob/vcs", "dave/pt"]);

        sel.management = vec!["Boss Two".into()];
        let view = apply(&table, &sel)?;
        assert_eq!(names(&view.records), vec!["carol/fc", "dave/pt"]);
        Ok(())
    }

    #[test]
    fn week_filter_only_when_active() -> Result<()> {
        let table = sample_table();
        let mut sel = FilterSelection::with_tools(["vcs", "pt", "fc"]);
        sel.weeks = vec!["2025-W31".into()];
        assert_eq!(apply(&table, &sel)?.len(), 2);

        sel.granularity = BTreeSet::from([DateGranularity::Year]);
        assert_eq!(apply(&table, &sel)?.len(), 6);
        Ok(())
    }

    #[test]
    fn year_month_and_custom_filters() -> Result<()> {
        let table = sample_table();
        let mut sel = FilterSelection::with_tools(["vcs", "pt", "fc"]);
        sel.granularity = BTreeSet::from([DateGranularity::Month]);
        sel.months = vec![Month::August];
        // dave has no parseable date and drops out
        assert_eq!(names(&apply(&table, &sel)?.records), vec!["alice/vcs", "alice/pt"]);

        sel.granularity = BTreeSet::from([DateGranularity::Custom]);
        sel.date_range = Some((
            NaiveDate::from_ymd_opt(2025, 7, 29).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
        ));
        assert_eq!(names(&apply(&table, &sel)?.records), vec!["alice/vcs", "bob/vcs"]);

        sel.granularity = BTreeSet::from([DateGranularity::Year]);
        sel.years = vec![2024];
        assert!(apply(&table, &sel)?.is_empty());
        Ok(())
    }

    #[test]
    fn inverted_range_is_invalid() {
        let table = sample_table();
        let mut sel = FilterSelection::with_tools(["vcs"]);
        sel.granularity = BTreeSet::from([DateGranularity::Custom]);
        sel.date_range = Some((
            NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
        ));
        assert!(matches!(apply(&table, &sel), Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn ka_subset_defaults_to_users_with_full_name() -> Result<()> {
        let table = sample_table();
        let sel = FilterSelection::with_tools(["vcs", "pt", "fc"]);
        let view = apply(&table, &sel)?;
        assert_eq!(view.records.len(), 6);
        // carol has no full name
        assert_eq!(view.ka_records.len(), 5);

        let mut sel = sel;
        sel.ka_users = Some(vec!["bob".into()]);
        let view = apply(&table, &sel)?;
        assert_eq!(names(&view.ka_records), vec!["bob/vcs", "bob/vcs"]);
        Ok(())
    }

    #[test]
    fn parses_granularity_and_months() -> Result<()> {
        assert_eq!("Week".parse::<DateGranularity>()?, DateGranularity::Week);
        assert!("fortnight".parse::<DateGranularity>().is_err());
        assert_eq!(parse_month("March")?, Month::March);
        assert_eq!(parse_month("sep")?, Month::September);
        assert_eq!(parse_month("12")?, Month::December);
        assert!(parse_month("13").is_err());
        Ok(())
    }
}
