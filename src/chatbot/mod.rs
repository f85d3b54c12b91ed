//! Scripted FAQ assistant: keyword groups mapped to canned answers,
//! interpolated with statistics from the current data.

use serde::Serialize;
use tracing::debug;

use crate::report::fmt_thousands;
use crate::usage::stats::{top_tools, Kpis};
use crate::usage::UsageRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// What a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Help,
    Tools,
    Feedback,
    Users,
    Charts,
    Filters,
    Downloads,
    Fallback,
}

/// Checked in order; the first group with a keyword contained in the
/// lower-cased input wins.
const RULES: &[(Intent, &[&str])] = &[
    (Intent::Greeting, &["hello", "hi", "hey", "greetings"]),
    (Intent::Help, &["help", "assist", "support", "guide"]),
    (Intent::Tools, &["tool", "tools", "most used", "popular"]),
    (Intent::Feedback, &["feedback", "rating", "like", "dislike"]),
    (Intent::Users, &["user", "users", "people", "active"]),
    (Intent::Charts, &["chart", "graph", "visualization", "plot"]),
    (Intent::Filters, &["filter", "filters", "customize", "select"]),
    (Intent::Downloads, &["download", "export", "csv", "data"]),
];

pub fn classify(input: &str) -> Intent {
    let lower = input.to_lowercase();
    RULES
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Fallback)
}

/// One conversation; history lives as long as the session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    assistant_name: String,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn greeting(&self) -> String {
        format!(
            "👋 Hi! I'm your {}.\n\nAsk me about tools, users, feedback, charts, or filters.",
            self.assistant_name
        )
    }

    /// Answer `input` using statistics over `records`, recording both sides
    /// of the exchange.
    pub fn respond(&mut self, input: &str, records: &[&UsageRecord]) -> String {
        self.history.push(ChatMessage {
            role: Role::User,
            content: input.to_string(),
        });

        let intent = classify(input);
        debug!(?intent, "chat intent");
        let reply = self.render(intent, input, records);

        self.history.push(ChatMessage {
            role: Role::Assistant,
            content: reply.clone(),
        });
        reply
    }

    fn render(&self, intent: Intent, input: &str, records: &[&UsageRecord]) -> String {
        let k = Kpis::compute(records);
        let users = fmt_thousands(k.unique_users);
        let queries = fmt_thousands(k.total_queries);

        match intent {
            Intent::Greeting => format!(
                "Hello! 👋 I'm your {}. Currently, your dashboard shows data for \
                 {} unique users with {} total queries across {} tools.",
                self.assistant_name, users, queries, k.distinct_tools
            ),
            Intent::Help => "I can help with:\n\n\
                 📊 Dashboard insights\n\
                 🔍 Data analysis\n\
                 📈 Performance trends\n\
                 💡 Tips on filters and charts\n\n\
                 Try asking: 'Most used tools?' or 'Feedback percentage?'"
                .to_string(),
            Intent::Tools => {
                let list = top_tools(records, 5)
                    .iter()
                    .map(|t| format!("{} ({} queries)", t.tool, fmt_thousands(t.queries)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "Top 5 most used tools:\n\n{}\n\nUse Filters to focus on specific tools.",
                    list
                )
            }
            Intent::Feedback => format!(
                "📊 Feedback overview:\n- Total feedback: {}\n- Feedback %: {:.1}%\n\
                 - Types: like, dislike, comment, none\n\n\
                 See the per-tool breakdown and the users-without-feedback ranking for details.",
                fmt_thousands(k.feedback_given),
                k.feedback_pct
            ),
            Intent::Users => format!(
                "👥 Users: {}\n💬 Queries: {}\nAvg queries/user: {:.1}\n\n\
                 Use KA User filter for specifics.",
                users,
                queries,
                k.avg_queries_per_user()
            ),
            Intent::Charts => "📈 Views:\n\
                 - Feedback distribution by tool\n\
                 - Users using tools without feedback\n\
                 - Weekly feedback ratio\n\n\
                 Tip: Use filters to customize data."
                .to_string(),
            Intent::Filters => "🔍 Filters:\nTools, Management Chain, Date Range, KA Users\n\n\
                 Tip: Start with Week filter for recent trends."
                .to_string(),
            Intent::Downloads => "📥 Downloads:\n1) View Raw Data Table\n\
                 2) Download Filtered Data (CSV)\n3) Download Original Excel"
                .to_string(),
            Intent::Fallback => format!(
                "You asked: '{}'.\n\nTry: 'Most used tools', 'Feedback %', 'User stats', \
                 'Explain charts', 'How to filter'.\n\
                 Quick stats: {} users, {} queries, {:.1}% feedback.",
                input, users, queries, k.feedback_pct
            ),
        }
    }
}
