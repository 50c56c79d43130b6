use crate::analytics::rank_gaps;
use crate::snapshot::Snapshot;
use crate::types::{ChatMessage, ChatRole, Event, MyEvent};
use std::fmt::Write;

/// Transcript turns included in a chat prompt.
pub const CHAT_HISTORY_TURNS: usize = 10;

pub fn event_analysis_prompt(snapshot: &Snapshot, event: &Event) -> String {
    let mut prompt = String::from(
        "You are a sponsorship analyst for regional events. Assess the event below.\n\
         Reply with one JSON object and nothing else, shaped as:\n\
         {\"summary\": string, \"score\": number 0-100, \"strengths\": [string], \
         \"weaknesses\": [string], \"sponsorInsights\": [string], \"recommendations\": [string]}\n\n",
    );
    let _ = writeln!(prompt, "Event: {}", event.name);
    let _ = writeln!(prompt, "Category: {}", event.category);
    let _ = writeln!(prompt, "Status: {}", event.status);
    if let Some(date) = event.date {
        let _ = writeln!(prompt, "Date: {date}");
    }
    let _ = writeln!(prompt, "Location: {} ({})", event.location, event.venue);
    let _ = writeln!(prompt, "Organizer: {}", event.organizer);
    let _ = writeln!(
        prompt,
        "Attendance: estimated {}, actual {}",
        event.attendance.estimated,
        event
            .attendance
            .actual
            .map_or_else(|| "unknown".to_string(), |n| n.to_string())
    );
    let _ = writeln!(
        prompt,
        "Budget: {:.0}-{:.0} {}",
        event.budget.min, event.budget.max, event.budget.currency
    );
    let _ = writeln!(
        prompt,
        "Audience: {}% male / {}% female / {}% other, ages {}-{}, income {}, interests: {}",
        event.demographics.gender.male,
        event.demographics.gender.female,
        event.demographics.gender.other,
        event.demographics.age_range.min,
        event.demographics.age_range.max,
        event.demographics.income_tier,
        event.demographics.interests.join(", ")
    );
    let metrics = &event.success_metrics;
    let _ = writeln!(
        prompt,
        "Results: satisfaction {:.1}/10, engagement {}, leads {}, ROI {:.1}x",
        metrics.satisfaction, metrics.social_engagement, metrics.lead_count, metrics.roi
    );
    let resolved = snapshot.resolve_sponsors(event);
    if resolved.is_empty() {
        prompt.push_str("Sponsors: none\n");
    } else {
        prompt.push_str("Sponsors:\n");
        for (association, sponsor) in resolved {
            let _ = writeln!(
                prompt,
                "- {} ({}, {} tier, {:.0} {}): {}",
                sponsor.name,
                sponsor.industry,
                association.tier,
                association.deal_amount,
                event.budget.currency,
                association.deliverables
            );
        }
    }
    if !event.critical_analysis.is_empty() {
        let _ = writeln!(prompt, "Organizer notes: {}", event.critical_analysis);
    }
    prompt
}

pub fn strategy_prompt(snapshot: &Snapshot, draft: &MyEvent) -> String {
    let mut prompt = String::from(
        "You are a sponsorship strategist. Recommend market gaps to target and sponsors to \
         approach for the planned event below. Only name sponsors from the provided list.\n\
         Reply with one JSON object and nothing else, shaped as:\n\
         {\"marketGaps\": [{\"title\": string, \"description\": string, \"severity\": 1-10, \
         \"opportunity\": 1-10}], \"sponsorMatches\": [{\"sponsorId\": string, \
         \"sponsorName\": string, \"fitScore\": 0-100, \"estimatedRoi\": number, \
         \"reasoning\": string}]}\n\n",
    );
    let _ = writeln!(prompt, "Planned event: {}", draft.name);
    let _ = writeln!(prompt, "Category: {}", draft.category);
    let _ = writeln!(prompt, "Audience: {}", draft.target_audience.join(", "));
    let _ = writeln!(
        prompt,
        "Budget goal: {:.0} {}",
        draft.budget_goal, draft.currency
    );
    let _ = writeln!(prompt, "Unique angle: {}", draft.unique_angle);

    prompt.push_str("\nKnown market gaps:\n");
    for gap in rank_gaps(&snapshot.market_gaps).into_iter().take(5) {
        let _ = writeln!(
            prompt,
            "- {} ({}; severity {}, opportunity {})",
            gap.title, gap.gap_type, gap.severity, gap.opportunity
        );
    }
    prompt.push_str("\nSponsors:\n");
    for sponsor in &snapshot.sponsors {
        let _ = writeln!(
            prompt,
            "- {} [{}] {}; average ROI {:.1}x; {} prior events; interests: {}",
            sponsor.id,
            sponsor.industry,
            sponsor.name,
            sponsor.average_roi,
            sponsor.events_sponsored.len(),
            sponsor.target_demographics.interests.join(", ")
        );
    }
    prompt
}

pub fn chat_prompt(snapshot: &Snapshot, history: &[ChatMessage], message: &str) -> String {
    let mut prompt = String::from(
        "You are the assistant inside a sponsorship market-intelligence dashboard. \
         Answer briefly and concretely, using the data summary when relevant.\n\n",
    );
    let _ = writeln!(
        prompt,
        "Data: {} events, {} sponsors, {} market gaps, {} open tasks.",
        snapshot.events.len(),
        snapshot.sponsors.len(),
        snapshot.market_gaps.len(),
        snapshot
            .tasks
            .iter()
            .filter(|task| task.status != crate::types::TaskStatus::Done)
            .count()
    );
    let start = history.len().saturating_sub(CHAT_HISTORY_TURNS);
    if start < history.len() {
        prompt.push_str("\nConversation so far:\n");
        for turn in &history[start..] {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Assistant",
            };
            let _ = writeln!(prompt, "{speaker}: {}", turn.content);
        }
    }
    let _ = write!(prompt, "\nUser: {message}\nAssistant:");
    prompt
}
