//! Aggregates over a (filtered) set of usage records.

use serde::Serialize;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
    str::FromStr,
};

use crate::error::Error;
use crate::usage::{FeedbackRating, UsageRecord};

/// `given / total * 100`, zero when nothing was rated.
pub fn feedback_percentage(given: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        given as f64 / total as f64 * 100.0
    }
}

/// Headline figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kpis {
    pub unique_users: usize,
    pub total_queries: usize,
    pub distinct_tools: usize,
    pub feedback_given: usize,
    pub feedback_total: usize,
    pub feedback_pct: f64,
}

impl Kpis {
    pub fn compute(records: &[&UsageRecord]) -> Self {
        let users: HashSet<&str> = records.iter().filter_map(|r| r.username.as_deref()).collect();
        let tools: HashSet<&str> = records.iter().filter_map(|r| r.tool.as_deref()).collect();
        let feedback_given = records.iter().filter(|r| r.rating.is_given()).count();
        let feedback_total = records.iter().filter(|r| r.rating.is_known()).count();

        Self {
            unique_users: users.len(),
            total_queries: records.len(),
            distinct_tools: tools.len(),
            feedback_given,
            feedback_total,
            feedback_pct: feedback_percentage(feedback_given, feedback_total),
        }
    }

    pub fn avg_queries_per_user(&self) -> f64 {
        if self.unique_users == 0 {
            0.0
        } else {
            self.total_queries as f64 / self.unique_users as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFeedback {
    pub tool: String,
    pub rating: FeedbackRating,
    pub count: usize,
}

/// Count of `(tool, rating)` over the four known ratings, sorted by tool then
/// rating.
pub fn feedback_by_tool(records: &[&UsageRecord]) -> Vec<ToolFeedback> {
    let mut counts: BTreeMap<(String, FeedbackRating), usize> = BTreeMap::new();
    for r in records {
        if let (Some(tool), true) = (&r.tool, r.rating.is_known()) {
            *counts.entry((tool.clone(), r.rating.clone())).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|((tool, rating), count)| ToolFeedback {
            tool,
            rating,
            count,
        })
        .collect()
}

/// How many rows of a ranking to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopN {
    All,
    Limit(usize),
}

impl FromStr for TopN {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<usize>()
            .map(Self::Limit)
            .map_err(|_| Error::InvalidFilter(format!("top-n must be a number or `all`, got `{}`", s)))
    }
}

impl fmt::Display for TopN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Limit(n) => write!(f, "Top {}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCount {
    pub username: String,
    pub count: usize,
}

/// Users ranked by rows with no like/dislike/comment.
pub fn users_without_feedback(records: &[&UsageRecord], top: TopN) -> Vec<UserCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records.iter().filter(|r| !r.rating.is_given()) {
        if let Some(u) = r.username.as_deref() {
            *counts.entry(u).or_default() += 1;
        }
    }
    let mut ranked: Vec<UserCount> = counts
        .into_iter()
        .map(|(u, count)| UserCount {
            username: u.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.username.cmp(&b.username)));
    if let TopN::Limit(n) = top {
        ranked.truncate(n);
    }
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCount {
    pub tool: String,
    pub queries: usize,
}

/// Most used tools by query count; ties broken by name.
pub fn top_tools(records: &[&UsageRecord], n: usize) -> Vec<ToolCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        if let Some(t) = r.tool.as_deref() {
            *counts.entry(t).or_default() += 1;
        }
    }
    let mut ranked: Vec<ToolCount> = counts
        .into_iter()
        .map(|(t, queries)| ToolCount {
            tool: t.to_string(),
            queries,
        })
        .collect();
    ranked.sort_by(|a, b| b.queries.cmp(&a.queries).then_with(|| a.tool.cmp(&b.tool)));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekFeedback {
    pub week: String,
    pub queries: usize,
    pub feedback_given: usize,
    pub feedback_total: usize,
    pub feedback_pct: f64,
}

/// Feedback ratio per week label, weeks in sorted order.
pub fn weekly_feedback(records: &[&UsageRecord]) -> Vec<WeekFeedback> {
    let mut weeks: BTreeMap<&str, (usize, usize, usize)> = BTreeMap::new();
    for r in records {
        if let Some(w) = r.week_label.as_deref() {
            let e = weeks.entry(w).or_default();
            e.0 += 1;
            e.1 += usize::from(r.rating.is_given());
            e.2 += usize::from(r.rating.is_known());
        }
    }
    weeks
        .into_iter()
        .map(|(week, (queries, given, total))| WeekFeedback {
            week: week.to_string(),
            queries,
            feedback_given: given,
            feedback_total: total,
            feedback_pct: feedback_percentage(given, total),
        })
        .collect()
}
