//! Property-based tests for the data-hygiene guarantees of the loaders,
//! filters and the mail compose loop.

use kausage::{
    config::{EmailSettings, UsageColumns},
    email::{compose_all, validate_email, DeliveryMode, MailClient, OutgoingMail},
    sheet::read_csv,
    usage::{apply, stats::feedback_percentage, stats::Kpis, FilterSelection, UsageTable},
};
use proptest::prelude::*;
use std::collections::BTreeSet;

const TOOLS: [&str; 4] = ["vcs", "pt", "fc", "kb"];
const RATINGS: [&str; 6] = ["like", "dislike", "comment", "none", "", "maybe"];

const HEADER: &str =
    "Username,Full Name,tool,Date,iso_year,year_week_label,metadata.feedback_rating,Mgmnt Chain 1\n";

fn usage_row() -> impl Strategy<Value = String> {
    (0usize..6, 0usize..TOOLS.len(), 1u32..28, 0usize..RATINGS.len(), any::<bool>())
        .prop_map(|(user, tool, day, rating, named)| {
            format!(
                "u{},{},{},2025-08-{:02},2025,2025-W{},{},Boss {}\n",
                user,
                if named { "Some Name" } else { "" },
                TOOLS[tool],
                day,
                31 + day / 7,
                RATINGS[rating],
                user % 2
            )
        })
}

fn usage_csv() -> impl Strategy<Value = String> {
    prop::collection::vec(usage_row(), 0..40).prop_map(|rows| format!("{}{}", HEADER, rows.concat()))
}

fn table(csv: &str) -> UsageTable {
    let sheet = read_csv(csv.as_bytes()).unwrap();
    UsageTable::from_sheet(&sheet, &UsageColumns::default()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_tool_filter_only_keeps_selected_tools(
        csv in usage_csv(),
        picked in prop::collection::btree_set(0usize..TOOLS.len(), 1..=TOOLS.len()),
    ) {
        let table = table(&csv);
        let tools: Vec<&str> = picked.iter().map(|&i| TOOLS[i]).collect();
        let sel = FilterSelection {
            granularity: BTreeSet::new(),
            ..FilterSelection::with_tools(tools.clone())
        };
        let view = apply(&table, &sel).unwrap();

        for r in &view.records {
            prop_assert!(tools.contains(&r.tool.as_deref().unwrap()));
        }
        let expected = table
            .records
            .iter()
            .filter(|r| r.tool.as_deref().map_or(false, |t| tools.contains(&t)))
            .count();
        prop_assert_eq!(view.records.len(), expected);
        prop_assert!(view.ka_records.len() <= view.records.len());
    }

    #[test]
    fn prop_feedback_percentage_bounds(given in 0usize..10_000, extra in 0usize..10_000) {
        let total = given + extra;
        let pct = feedback_percentage(given, total);
        if total == 0 {
            prop_assert_eq!(pct, 0.0);
        } else {
            prop_assert!((0.0..=100.0).contains(&pct));
            prop_assert!((pct - given as f64 / total as f64 * 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_kpi_percentage_matches_counts(csv in usage_csv()) {
        let table = table(&csv);
        let all: Vec<_> = table.records.iter().collect();
        let k = Kpis::compute(&all);
        prop_assert!(k.feedback_given <= k.feedback_total);
        prop_assert!(k.feedback_total <= k.total_queries);
        prop_assert_eq!(k.feedback_pct, feedback_percentage(k.feedback_given, k.feedback_total));
    }

    #[test]
    fn prop_loading_twice_gives_identical_views(
        csv in usage_csv(),
        picked in prop::collection::btree_set(0usize..TOOLS.len(), 1..=TOOLS.len()),
        week in 31u32..36,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.csv");
        std::fs::write(&path, &csv).unwrap();

        let first = UsageTable::load(&path, None, &UsageColumns::default()).unwrap();
        let second = UsageTable::load(&path, None, &UsageColumns::default()).unwrap();
        prop_assert_eq!(&first, &second);

        let mut sel = FilterSelection::with_tools(picked.iter().map(|&i| TOOLS[i]));
        sel.weeks = vec![format!("2025-W{}", week)];
        sel.management = vec!["Boss 1".into()];
        let a = apply(&first, &sel).unwrap();
        let b = apply(&second, &sel).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[derive(Default)]
struct Recorder {
    sent: Vec<String>,
}

impl MailClient for Recorder {
    fn deliver(&mut self, mail: &OutgoingMail, _mode: DeliveryMode) -> kausage::Result<()> {
        self.sent.push(mail.to.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Addr {
    Valid(String),
    Invalid(String),
    Missing,
}

fn addr() -> impl Strategy<Value = Addr> {
    prop_oneof![
        "[a-z]{1,8}@[a-z]{1,8}\\.(com|org|io)".prop_map(Addr::Valid),
        "[a-z]{1,8}@?[a-z]{0,5}".prop_map(Addr::Invalid),
        Just(Addr::Missing),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_only_valid_rows_are_delivered(
        rows in prop::collection::vec((any::<bool>(), addr()), 0..30),
    ) {
        let mut csv = String::from("User,userEmail,Like,dislike,comment,week,year,tools\n");
        let mut expected = Vec::new();
        for (i, (has_user, a)) in rows.iter().enumerate() {
            let user = if *has_user { format!("user{}", i) } else { String::new() };
            let email = match a {
                Addr::Valid(e) | Addr::Invalid(e) => e.clone(),
                Addr::Missing => String::new(),
            };
            if let (true, Addr::Valid(e)) = (*has_user, a) {
                prop_assert!(validate_email(e));
                expected.push(e.clone());
            }
            csv.push_str(&format!("{},{},3,1,,W32,2025,vcs\n", user, email));
        }

        let sheet = read_csv(csv.as_bytes()).unwrap();
        let mut client = Recorder::default();
        let report = compose_all(&sheet, &mut client, &EmailSettings::default()).unwrap();

        prop_assert_eq!(&client.sent, &expected);
        prop_assert_eq!(report.success, expected.len());
        prop_assert_eq!(report.success + report.errors, rows.len());
        prop_assert_eq!(report.skipped.len(), report.errors);
    }
}
