use anyhow::{Context, Result};
use clap::Parser;
use kausage::{
    chatbot::ChatSession,
    cli::{Cli, Command, DashboardArgs, FilterArgs, SourceArgs},
    config::Config,
    email::{self, DeliveryMode},
    export,
    report::{self, HtmlReport},
    sheet::{self, TableCache},
    usage::{
        apply,
        stats::{feedback_by_tool, top_tools, users_without_feedback, weekly_feedback, Kpis, TopN},
        FilterOptions, FilterSelection, UsageTable,
    },
};
use serde_json::json;
use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    // stdout carries reports and JSON, so logs go to stderr
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kausage=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(io::stderr)
        .init();

    // ─── 2) config ───────────────────────────────────────────────────
    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref())
        .with_context(|| format!("loading config {:?}", cli.config))?;
    let mut cache: TableCache<UsageTable> = TableCache::new(cfg.usage.cache_ttl());

    // ─── 3) dispatch ─────────────────────────────────────────────────
    match cli.command {
        Command::Emails {
            source,
            outbox,
            send,
        } => run_emails(&cfg, &source, outbox, send, cli.json),
        Command::Dashboard(args) => run_dashboard(&cfg, &mut cache, &args, cli.json),
        Command::Options { source } => run_options(&cfg, &mut cache, &source, cli.json),
        Command::Summary {
            source,
            html,
            copy_to,
        } => run_summary(&cfg, &source, html.as_deref(), copy_to.as_deref()),
        Command::Chat {
            source,
            filters,
            ask,
        } => run_chat(&cfg, &mut cache, &source, &filters, &ask, cli.json),
    }
}

fn usage_source(cfg: &Config, source: &SourceArgs) -> (PathBuf, Option<String>) {
    let path = source.input.clone().unwrap_or_else(|| cfg.usage.path.clone());
    let sheet = source.sheet.clone().or_else(|| cfg.usage.sheet.clone());
    (path, sheet)
}

fn load_usage(
    cfg: &Config,
    cache: &mut TableCache<UsageTable>,
    source: &SourceArgs,
) -> Result<Arc<UsageTable>> {
    let (path, sheet) = usage_source(cfg, source);
    let columns = &cfg.usage.columns;
    cache
        .get_or_load(&path, sheet.as_deref(), || {
            UsageTable::load(&path, sheet.as_deref(), columns)
        })
        .with_context(|| format!("loading usage data from {}", path.display()))
}

fn selection(
    cfg: &Config,
    table: &UsageTable,
    filters: &FilterArgs,
) -> (FilterOptions, FilterSelection) {
    let options = FilterOptions::from_table(table, &cfg.dashboard);
    let sel = filters.to_selection(&options);
    (options, sel)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_emails(
    cfg: &Config,
    source: &SourceArgs,
    outbox: Option<PathBuf>,
    send: bool,
    json: bool,
) -> Result<()> {
    let path = source.input.clone().unwrap_or_else(|| cfg.email.path.clone());
    let mut settings = cfg.email.clone();
    if let Some(sheet) = &source.sheet {
        settings.sheet = Some(sheet.clone());
    }
    if let Some(dir) = outbox {
        settings.outbox = dir;
    }
    if send {
        settings.mode = DeliveryMode::Send;
    }
    info!(path = %path.display(), outbox = %settings.outbox.display(), mode = %settings.mode, "composing feedback mails");

    let report = email::run(&path, &settings)
        .with_context(|| format!("composing mails from {}", path.display()))?;
    for issue in &report.skipped {
        eprintln!("Warning: {}", issue);
    }
    if json {
        print_json(&report)?;
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}

fn run_dashboard(
    cfg: &Config,
    cache: &mut TableCache<UsageTable>,
    args: &DashboardArgs,
    json: bool,
) -> Result<()> {
    let table = load_usage(cfg, cache, &args.source)?;
    let (_, sel) = selection(cfg, &table, &args.filters);
    let view = apply(&table, &sel)?;
    if view.is_empty() {
        warn!("no rows match the current filters");
    }

    let top = args.top_n.unwrap_or(TopN::Limit(cfg.dashboard.top_n));
    let preview = args.preview.unwrap_or(cfg.dashboard.preview_rows);
    let kpis = Kpis::compute(&view.records);
    let by_tool = feedback_by_tool(&view.ka_records);
    let no_feedback = users_without_feedback(&view.ka_records, top);
    let weekly = weekly_feedback(&view.records);

    if json {
        print_json(&json!({
            "kpis": kpis,
            "avg_queries_per_user": kpis.avg_queries_per_user(),
            "top_tools": top_tools(&view.records, 5),
            "feedback_by_tool": by_tool,
            "users_without_feedback": no_feedback,
            "weekly_feedback": weekly,
        }))?;
    } else {
        println!("{}", cfg.dashboard.title);
        println!();
        print!("{}", report::render_kpis(&kpis));
        println!();
        println!("Feedback Distribution by Tool");
        print!("{}", report::render_feedback_by_tool(&by_tool));
        println!();
        println!("Users Using Tools Without Feedback ({})", top);
        print!("{}", report::render_users_without_feedback(&no_feedback));
        println!();
        println!("Weekly Feedback");
        print!("{}", report::render_weekly(&weekly));
        if preview > 0 {
            println!();
            println!("Raw Data");
            print!("{}", report::render_preview(view.headers, &view.records, preview));
        }
    }

    if let Some(path) = &args.export_csv {
        export::export_csv(view.headers, &view.records, path)
            .with_context(|| format!("exporting CSV to {}", path.display()))?;
    }
    if let Some(path) = &args.export_parquet {
        export::export_parquet(view.headers, &view.records, path)
            .with_context(|| format!("exporting Parquet to {}", path.display()))?;
    }
    if let Some(path) = &args.html {
        let mut page = HtmlReport::new(&cfg.dashboard.title);
        page.add_kpis(&kpis)
            .add_feedback_by_tool(&by_tool)
            .add_users_without_feedback(&no_feedback, &top.to_string())
            .add_weekly(&weekly)
            .add_raw_table(view.headers, &view.records, preview);
        fs::write(path, page.to_html())
            .with_context(|| format!("writing HTML report {}", path.display()))?;
        info!(path = %path.display(), "wrote HTML report");
    }
    Ok(())
}

fn run_options(
    cfg: &Config,
    cache: &mut TableCache<UsageTable>,
    source: &SourceArgs,
    json: bool,
) -> Result<()> {
    let table = load_usage(cfg, cache, source)?;
    let options = FilterOptions::from_table(&table, &cfg.dashboard);
    if json {
        return print_json(&options);
    }
    println!("Tools:       {}", options.tools.join(", "));
    println!("Management:  {}", options.management.join(", "));
    let years: Vec<String> = options.years.iter().map(i32::to_string).collect();
    println!("Years:       {}", years.join(", "));
    println!("Months:      {}", options.months.join(", "));
    println!("Weeks:       {}", options.weeks.join(", "));
    println!("KA users:    {}", options.ka_users.len());
    if let Some((lo, hi)) = options.date_bounds {
        println!("Dates:       {} .. {}", lo, hi);
    }
    if let Some(w) = options.latest_week() {
        println!("Latest week: {}", w);
    }
    Ok(())
}

fn run_summary(
    cfg: &Config,
    source: &SourceArgs,
    html: Option<&Path>,
    copy_to: Option<&Path>,
) -> Result<()> {
    let path = source.input.clone().unwrap_or_else(|| cfg.summary.path.clone());
    let sheet_name = source.sheet.clone().or_else(|| cfg.summary.sheet.clone());
    let grid = sheet::load_sheet(&path, sheet_name.as_deref())
        .with_context(|| format!("loading summary from {}", path.display()))?;

    println!("{}", grid.headers.join("\t"));
    for row in &grid.rows {
        println!("{}", row.join("\t"));
    }

    if let Some(out) = html {
        fs::write(out, report::sheet_to_html("Summary", &grid))
            .with_context(|| format!("writing HTML summary {}", out.display()))?;
        info!(path = %out.display(), "wrote HTML summary");
    }
    if let Some(dir) = copy_to {
        let dest = export::copy_source(&path, dir)?;
        println!("Copied {} to {}", path.display(), dest.display());
    }
    Ok(())
}

fn run_chat(
    cfg: &Config,
    cache: &mut TableCache<UsageTable>,
    source: &SourceArgs,
    filters: &FilterArgs,
    ask: &[String],
    json: bool,
) -> Result<()> {
    let mut session = ChatSession::new(&cfg.chatbot.assistant_name);
    if !json {
        println!("{}\n", session.greeting());
    }

    let mut answer = |session: &mut ChatSession, question: &str| -> Result<String> {
        let table = load_usage(cfg, cache, source)?;
        let (_, sel) = selection(cfg, &table, filters);
        let view = apply(&table, &sel)?;
        Ok(session.respond(question, &view.records))
    };

    if ask.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let q = line.trim();
            if q.is_empty() {
                continue;
            }
            if q.eq_ignore_ascii_case("exit") {
                break;
            }
            let reply = answer(&mut session, q)?;
            if !json {
                println!("{}\n", reply);
                io::stdout().flush()?;
            }
        }
    } else {
        for q in ask {
            let reply = answer(&mut session, q)?;
            if !json {
                println!("> {}\n{}\n", q, reply);
            }
        }
    }

    if json {
        print_json(&session.history())?;
    }
    Ok(())
}
