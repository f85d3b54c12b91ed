use chrono::{Month, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::DashboardDefaults;
use crate::usage::{FilterSelection, UsageTable};

pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Values a user can pick from, derived from the loaded table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Distinct tools in first-seen order.
    pub tools: Vec<String>,
    pub management: Vec<String>,
    pub years: Vec<i32>,
    pub months: Vec<String>,
    pub weeks: Vec<String>,
    pub ka_users: Vec<String>,
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    #[serde(skip)]
    defaults: DashboardDefaults,
}

impl FilterOptions {
    pub fn from_table(table: &UsageTable, defaults: &DashboardDefaults) -> Self {
        let mut tools: Vec<String> = Vec::new();
        let mut management = BTreeSet::new();
        let mut years = BTreeSet::new();
        let mut weeks = BTreeSet::new();
        let mut ka_users = BTreeSet::new();
        let mut bounds: Option<(NaiveDate, NaiveDate)> = None;

        for r in &table.records {
            if let Some(t) = &r.tool {
                if !tools.contains(t) {
                    tools.push(t.clone());
                }
            }
            management.extend(r.mgmt_chain.iter().cloned());
            if let Some(y) = r.iso_year {
                years.insert(y);
            }
            if let Some(w) = &r.week_label {
                weeks.insert(w.clone());
            }
            if let (Some(u), Some(_)) = (&r.username, &r.full_name) {
                ka_users.insert(u.clone());
            }
            if let Some(d) = r.date {
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
        }

        Self {
            tools,
            management: management.into_iter().collect(),
            years: years.into_iter().collect(),
            months: MONTHS.iter().map(|m| m.name().to_string()).collect(),
            weeks: weeks.into_iter().collect(),
            ka_users: ka_users.into_iter().collect(),
            date_bounds: bounds,
            defaults: defaults.clone(),
        }
    }

    /// Most recent week label (labels sort chronologically, e.g. `2025-W32`).
    pub fn latest_week(&self) -> Option<&str> {
        self.weeks.last().map(String::as_str)
    }

    /// The selection shown before the user touches anything: configured
    /// default tools that exist (every tool when none are configured),
    /// configured management defaults that exist, week granularity on the
    /// latest week, all KA users.
    pub fn default_selection(&self) -> FilterSelection {
        let tools = if self.defaults.default_tools.is_empty() {
            self.tools.clone()
        } else {
            self.defaults
                .default_tools
                .iter()
                .filter(|t| self.tools.contains(t))
                .cloned()
                .collect()
        };
        let management = self
            .defaults
            .default_management
            .iter()
            .filter(|m| self.management.contains(m))
            .cloned()
            .collect();

        FilterSelection {
            tools,
            management,
            weeks: self.latest_week().map(str::to_string).into_iter().collect(),
            ..FilterSelection::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::tests::sample_table;
    use crate::usage::DateGranularity;

    #[test]
    fn collects_distinct_values() {
        let opts = FilterOptions::from_table(&sample_table(), &DashboardDefaults::default());
        assert_eq!(opts.tools, vec!["vcs", "pt", "fc"]);
        assert_eq!(
            opts.management,
            vec!["Boss One", "Boss Two", "Lead A", "Lead B", "Lead C"]
        );
        assert_eq!(opts.years, vec![2025]);
        assert_eq!(opts.weeks, vec!["2025-W01", "2025-W31", "2025-W32"]);
        assert_eq!(opts.ka_users, vec!["alice", "bob", "dave"]);
        assert_eq!(opts.months.len(), 12);
        assert_eq!(opts.months[0], "January");
        assert_eq!(
            opts.date_bounds,
            Some((
                NaiveDate::from_ymd_opt(2024, 12, 30).unwrap(),
                NaiveDate::from_ymd_opt(2025, 8, 5).unwrap()
            ))
        );
    }

    #[test]
    fn default_selection_uses_latest_week() {
        let opts = FilterOptions::from_table(&sample_table(), &DashboardDefaults::default());
        let sel = opts.default_selection();
        assert_eq!(sel.tools, vec!["vcs", "pt", "fc"]);
        assert_eq!(sel.weeks, vec!["2025-W32"]);
        assert!(sel.granularity.contains(&DateGranularity::Week));
        assert_eq!(sel.ka_users, None);
    }

    #[test]
    fn configured_defaults_are_intersected() {
        let defaults = DashboardDefaults {
            default_tools: vec!["Verdi".into(), "pt".into()],
            default_management: vec!["Boss Two".into(), "Nobody".into()],
            ..DashboardDefaults::default()
        };
        let opts = FilterOptions::from_table(&sample_table(), &defaults);
        let sel = opts.default_selection();
        assert_eq!(sel.tools, vec!["pt"]);
        assert_eq!(sel.management, vec!["Boss Two"]);
    }
}
