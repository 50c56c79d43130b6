mod render;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use pulse_core::chat::{AssistantResponder, ChatManager};
use pulse_core::error::PulseError;
use pulse_core::types::{
    EventCategory, EventFilter, EventId, EventSort, EventStatus, Industry, MyEventId, ProfileId,
    SponsorFilter, SponsorSort, SponsorTier,
};
use pulse_core::{Backend, Config, Dashboard, FixtureDataset, RequestContext};
use pulse_db::SqliteBackend;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pulse", version, about = "Sponsorship market intelligence")]
struct Cli {
    /// TOML config file; `pulse.toml` in the working directory is used when present.
    #[arg(long, global = true, env = "PULSE_CONFIG")]
    config: Option<PathBuf>,
    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dashboard totals and data source.
    Snapshot,
    Events {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "category", value_parser = parse_category)]
        categories: Vec<EventCategory>,
        #[arg(long = "status", value_parser = parse_status)]
        statuses: Vec<EventStatus>,
        #[arg(long = "tier", value_parser = parse_tier)]
        tiers: Vec<SponsorTier>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        min_attendance: Option<u32>,
        #[arg(long)]
        max_attendance: Option<u32>,
        #[arg(long)]
        min_budget: Option<f64>,
        #[arg(long)]
        max_budget: Option<f64>,
        #[arg(long, value_enum, default_value_t = EventSortArg::DateAsc)]
        sort: EventSortArg,
    },
    Sponsors {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "industry", value_parser = parse_industry)]
        industries: Vec<Industry>,
        #[arg(long = "tier", value_parser = parse_tier)]
        tiers: Vec<SponsorTier>,
        #[arg(long)]
        min_total: Option<f64>,
        #[arg(long, value_enum, default_value_t = SponsorSortArg::Name)]
        sort: SponsorSortArg,
    },
    /// Market gaps ranked by severity times opportunity.
    Gaps,
    Activity {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    Tasks {
        #[arg(long)]
        overdue: bool,
    },
    /// Analyze an event and store the report on it.
    Analyze { event_id: String },
    /// Build a sponsorship strategy for a draft and store it.
    Strategy { draft_id: String },
    /// Interactive assistant. `/clear` resets the conversation, `/quit` exits.
    Chat,
    /// Print a summary every time the snapshot changes.
    Watch,
    /// Load the bundled fixture dataset into the configured database.
    Seed,
}

#[derive(Clone, Copy, ValueEnum)]
enum EventSortArg {
    DateAsc,
    DateDesc,
    Name,
    Attendance,
}

impl From<EventSortArg> for EventSort {
    fn from(value: EventSortArg) -> Self {
        match value {
            EventSortArg::DateAsc => Self::DateAsc,
            EventSortArg::DateDesc => Self::DateDesc,
            EventSortArg::Name => Self::Name,
            EventSortArg::Attendance => Self::Attendance,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SponsorSortArg {
    Name,
    Total,
    Events,
}

impl From<SponsorSortArg> for SponsorSort {
    fn from(value: SponsorSortArg) -> Self {
        match value {
            SponsorSortArg::Name => Self::Name,
            SponsorSortArg::Total => Self::TotalSponsorship,
            SponsorSortArg::Events => Self::EventsCount,
        }
    }
}

fn parse_category(value: &str) -> Result<EventCategory, String> {
    EventCategory::parse_loose(value).ok_or_else(|| format!("unknown category: {value}"))
}

fn parse_status(value: &str) -> Result<EventStatus, String> {
    EventStatus::parse_loose(value).ok_or_else(|| format!("unknown status: {value}"))
}

fn parse_tier(value: &str) -> Result<SponsorTier, String> {
    SponsorTier::parse_loose(value).ok_or_else(|| format!("unknown tier: {value}"))
}

fn parse_industry(value: &str) -> Result<Industry, String> {
    Industry::parse_loose(value).ok_or_else(|| format!("unknown industry: {value}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pulse=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            if let PulseError::Mutation(mutation) = &err {
                eprintln!("{}", mutation.user_notice());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), PulseError> {
    let config = Config::load(cli.config.as_deref())?;
    let backend = match &config.backend.database_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|err| PulseError::Internal {
                    message: format!("create {}: {err}", parent.display()),
                })?;
            }
            Some(Arc::new(SqliteBackend::open(path)?))
        }
        None => None,
    };

    if let Command::Seed = cli.command {
        let Some(backend) = backend else {
            return Err(PulseError::Internal {
                message: "seed needs backend.database_path or PULSE_DATABASE_PATH".to_string(),
            });
        };
        let written = backend.seed(FixtureDataset::bundled()).await?;
        println!("{} {written} rows", "seeded".green());
        return Ok(());
    }

    let remote = backend.map(|backend| backend as Arc<dyn Backend>);
    let dashboard = Dashboard::from_config(&config, remote);
    let snapshot = dashboard.sync().initialize().await;
    info!(
        generation = snapshot.generation,
        degraded = snapshot.is_degraded(),
        ai = dashboard.ai().is_configured(),
        "dashboard ready"
    );
    if !cli.json {
        render::source_banner(&snapshot);
    }

    let ctx = RequestContext::new(
        config.session.actor_id.clone().map(ProfileId::new),
        Some(format!("cli-{}", std::process::id())),
    );
    let today = Local::now().date_naive();

    match cli.command {
        Command::Snapshot => {
            let stats = dashboard.analytics().stats(today);
            if cli.json {
                print_json(&stats)?;
            } else {
                render::stats(&stats);
            }
        }
        Command::Events {
            search,
            categories,
            statuses,
            tiers,
            from,
            to,
            min_attendance,
            max_attendance,
            min_budget,
            max_budget,
            sort,
        } => {
            let filter = EventFilter {
                search_query: search,
                date_from: from,
                date_to: to,
                categories,
                statuses,
                min_attendance,
                max_attendance,
                min_budget,
                max_budget,
                sponsor_tiers: tiers,
                sort: sort.into(),
            };
            let events = dashboard.events().filter(&filter);
            if cli.json {
                print_json(&events)?;
            } else {
                render::events(&dashboard.snapshot(), &events);
            }
        }
        Command::Sponsors {
            search,
            industries,
            tiers,
            min_total,
            sort,
        } => {
            let filter = SponsorFilter {
                search_query: search,
                industries,
                tiers,
                min_total_sponsorship: min_total,
                sort: sort.into(),
            };
            let sponsors = dashboard.sponsors().filter(&filter);
            if cli.json {
                print_json(&sponsors)?;
            } else {
                render::sponsors(&sponsors);
            }
        }
        Command::Gaps => {
            let ranked = dashboard.gaps().ranked();
            let summary = dashboard.gaps().summary();
            if cli.json {
                print_json(&serde_json::json!({ "summary": summary, "gaps": ranked }))?;
            } else {
                render::gaps(&ranked, &summary);
            }
        }
        Command::Activity { limit } => {
            let mut recent = dashboard.activity().recent();
            recent.truncate(limit);
            if cli.json {
                print_json(&recent)?;
            } else {
                render::activity(&dashboard.snapshot(), &recent);
            }
        }
        Command::Tasks { overdue } => {
            let tasks = if overdue {
                dashboard.tasks().overdue(today)
            } else {
                dashboard.tasks().list()
            };
            if cli.json {
                print_json(&tasks)?;
            } else {
                render::tasks(&dashboard.snapshot(), &tasks, today);
            }
        }
        Command::Analyze { event_id } => {
            let insight = dashboard
                .insights()
                .analyze_event(&ctx, &EventId::new(event_id))
                .await?;
            if cli.json {
                print_json(&insight.value)?;
            } else {
                render::notice(insight.notice());
                println!("{}", insight.value.render());
            }
        }
        Command::Strategy { draft_id } => {
            let insight = dashboard
                .insights()
                .recommend(&ctx, &MyEventId::new(draft_id))
                .await?;
            if cli.json {
                print_json(&insight.value)?;
            } else {
                render::notice(insight.notice());
                render::strategy(&insight.value);
            }
        }
        Command::Chat => chat(&dashboard).await?,
        Command::Watch => watch(&dashboard, today).await,
        Command::Seed => {}
    }

    dashboard.sync().shutdown().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PulseError> {
    let rendered = serde_json::to_string_pretty(value).map_err(|err| PulseError::Internal {
        message: err.to_string(),
    })?;
    println!("{rendered}");
    Ok(())
}

async fn chat(dashboard: &Dashboard) -> Result<(), PulseError> {
    let manager = ChatManager::new(Arc::new(AssistantResponder::new(dashboard.ai().clone())));
    for message in manager.transcript() {
        render::chat_message(&message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        render::prompt();
        let Some(line) = lines.next_line().await.map_err(|err| PulseError::Internal {
            message: format!("stdin: {err}"),
        })?
        else {
            break;
        };
        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                manager.clear();
                for message in manager.transcript() {
                    render::chat_message(&message);
                }
            }
            message => {
                if let Some(reply) = manager.send(&dashboard.snapshot(), message).await? {
                    render::chat_message(&reply);
                }
            }
        }
    }
    Ok(())
}

async fn watch(dashboard: &Dashboard, today: NaiveDate) {
    let mut updates = dashboard.sync().watch();
    render::stats(&dashboard.analytics().stats(today));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                render::generation(&snapshot);
                render::stats(&dashboard.analytics().stats(today));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn event_filters_parse_loosely() {
        let cli = Cli::try_parse_from([
            "pulse",
            "events",
            "--category",
            "Music",
            "--status",
            "upcoming",
            "--from",
            "2026-01-01",
            "--sort",
            "date-desc",
        ])
        .unwrap();
        let Command::Events {
            categories,
            statuses,
            from,
            sort,
            ..
        } = cli.command
        else {
            panic!("expected events");
        };
        assert_eq!(categories, vec![EventCategory::Music]);
        assert_eq!(statuses, vec![EventStatus::Upcoming]);
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(EventSort::from(sort), EventSort::DateDesc);
    }

    #[test]
    fn unknown_industry_is_rejected() {
        assert!(Cli::try_parse_from(["pulse", "sponsors", "--industry", "mining"]).is_err());
    }
}
