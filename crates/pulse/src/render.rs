use chrono::NaiveDate;
use owo_colors::OwoColorize;
use pulse_core::analytics::{DashboardStats, GapQuadrant, GapSummary};
use pulse_core::types::{
    Activity, ChatMessage, ChatRole, Event, MarketGap, Sponsor, SponsorshipStrategy, Task,
    TaskPriority,
};
use pulse_core::{FallbackReason, Snapshot, SnapshotSource};
use std::io::Write;

pub fn source_banner(snapshot: &Snapshot) {
    match &snapshot.source {
        SnapshotSource::Remote => {}
        SnapshotSource::Fixture(FallbackReason::Unconfigured) => {
            eprintln!("{}", "offline mode: showing bundled sample data".yellow());
        }
        SnapshotSource::Fixture(FallbackReason::RemoteFailure { message }) => {
            eprintln!(
                "{} {message}",
                "backend unavailable, showing bundled sample data:".yellow()
            );
        }
    }
}

pub fn generation(snapshot: &Snapshot) {
    println!(
        "{} generation {} at {}",
        "refreshed".cyan(),
        snapshot.generation,
        snapshot.loaded_at.format("%H:%M:%S")
    );
}

pub fn notice(notice: Option<&str>) {
    if let Some(notice) = notice {
        eprintln!("{}", notice.yellow());
    }
}

pub fn stats(stats: &DashboardStats) {
    println!("{}", "Dashboard".bold());
    println!(
        "  events      {} ({} upcoming, {} completed, {} cancelled)",
        stats.events, stats.upcoming_events, stats.completed_events, stats.cancelled_events
    );
    println!(
        "  sponsors    {} (avg ROI {:.1}x)",
        stats.sponsors, stats.average_sponsor_roi
    );
    println!("  deal value  {}", money(stats.total_deal_value));
    println!(
        "  tasks       {} open, {} overdue",
        stats.open_tasks,
        if stats.overdue_tasks > 0 {
            stats.overdue_tasks.red().to_string()
        } else {
            stats.overdue_tasks.to_string()
        }
    );
    println!(
        "  gaps        {} ({} high severity, {} high opportunity)",
        stats.gaps.total, stats.gaps.high_severity, stats.gaps.high_opportunity
    );
}

pub fn events(snapshot: &Snapshot, events: &[Event]) {
    if events.is_empty() {
        println!("no matching events");
        return;
    }
    for event in events {
        let date = event
            .date
            .map_or_else(|| "undated".to_string(), |date| date.to_string());
        println!(
            "{} {} {}",
            date.dimmed(),
            event.name.bold(),
            format!("[{} / {}]", event.category, event.status).cyan()
        );
        println!(
            "    {} | {} attendees | budget {} - {}",
            event.location,
            event.attendance.best(),
            money(event.budget.min),
            money(event.budget.max)
        );
        let sponsors: Vec<String> = snapshot
            .resolve_sponsors(event)
            .into_iter()
            .map(|(association, sponsor)| format!("{} ({})", sponsor.name, association.tier))
            .collect();
        if !sponsors.is_empty() {
            println!("    sponsors: {}", sponsors.join(", "));
        }
        println!("    {}", event.id.as_str().dimmed());
    }
}

pub fn sponsors(sponsors: &[Sponsor]) {
    if sponsors.is_empty() {
        println!("no matching sponsors");
        return;
    }
    for sponsor in sponsors {
        println!(
            "{} {}",
            sponsor.name.bold(),
            format!("[{}]", sponsor.industry).cyan()
        );
        println!(
            "    total {} | avg deal {} | ROI {:.1}x | {} events",
            money(sponsor.total_sponsorship),
            money(sponsor.average_deal),
            sponsor.average_roi,
            sponsor.events_sponsored.len()
        );
        println!("    {}", sponsor.id.as_str().dimmed());
    }
}

pub fn gaps(ranked: &[MarketGap], summary: &GapSummary) {
    println!(
        "{} {} gaps, {} high severity, {} high opportunity, {} potential",
        "Market gaps".bold(),
        summary.total,
        summary.high_severity,
        summary.high_opportunity,
        money(summary.potential_revenue)
    );
    for gap in ranked {
        let quadrant = GapQuadrant::of(gap);
        let label = match quadrant {
            GapQuadrant::Critical => quadrant.as_str().red().to_string(),
            GapQuadrant::Strategic => quadrant.as_str().green().to_string(),
            _ => quadrant.as_str().dimmed().to_string(),
        };
        println!(
            "  {:>2}x{:<2} {} {} ({})",
            gap.severity,
            gap.opportunity,
            label,
            gap.title.bold(),
            gap.affected_area
        );
    }
}

pub fn activity(snapshot: &Snapshot, activities: &[Activity]) {
    if activities.is_empty() {
        println!("no recent activity");
        return;
    }
    for entry in activities {
        let actor = entry
            .actor_id
            .as_ref()
            .and_then(|id| snapshot.profile(id))
            .map_or("someone", |profile| profile.full_name.as_str());
        println!(
            "{} {} {} {} {}",
            entry.at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            actor,
            entry.activity_type.green(),
            entry.entity_type,
            entry.entity_name.bold()
        );
    }
}

pub fn tasks(snapshot: &Snapshot, tasks: &[Task], today: NaiveDate) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for task in tasks {
        let priority = match task.priority {
            TaskPriority::Urgent | TaskPriority::High => task.priority.red().to_string(),
            _ => task.priority.to_string(),
        };
        let due = match task.due_date {
            Some(due) if task.is_overdue(today) => format!("overdue since {due}").red().to_string(),
            Some(due) => format!("due {due}"),
            None => "no due date".to_string(),
        };
        let assignee = task
            .assignee_id
            .as_ref()
            .and_then(|id| snapshot.profile(id))
            .map_or("unassigned", |profile| profile.full_name.as_str());
        println!(
            "{} [{} / {}] {} | {}",
            task.title.bold(),
            task.status,
            priority,
            due,
            assignee
        );
    }
}

pub fn strategy(strategy: &SponsorshipStrategy) {
    println!("{}", "Market gaps".bold());
    for gap in &strategy.market_gaps {
        println!(
            "  {} (severity {}, opportunity {})",
            gap.title, gap.severity, gap.opportunity
        );
        println!("    {}", gap.description.dimmed());
    }
    println!("{}", "Sponsor matches".bold());
    for candidate in &strategy.sponsor_matches {
        println!(
            "  {:>3} {} (est. ROI {:.1}x)",
            candidate.fit_score.green(),
            candidate.sponsor_name,
            candidate.estimated_roi
        );
        println!("      {}", candidate.reasoning.dimmed());
    }
}

pub fn chat_message(message: &ChatMessage) {
    match message.role {
        ChatRole::User => println!("{} {}", "you:".bold(), message.content),
        ChatRole::Assistant => println!("{} {}", "pulse:".cyan().bold(), message.content),
    }
}

pub fn prompt() {
    print!("{} ", ">".cyan());
    let _ = std::io::stdout().flush();
}

fn money(amount: f64) -> String {
    if amount >= 1_000_000_000.0 {
        format!("Rp {:.1}B", amount / 1_000_000_000.0)
    } else if amount >= 1_000_000.0 {
        format!("Rp {:.1}M", amount / 1_000_000.0)
    } else {
        format!("Rp {amount:.0}")
    }
}
