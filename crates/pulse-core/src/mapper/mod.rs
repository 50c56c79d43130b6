//! Raw backend rows -> domain types.
//!
//! Every `map_*` function is total: missing or malformed optional fields
//! become the domain default rather than an error.

pub mod fields;
pub mod rows;

use crate::backend::Row;
use crate::types::{
    Activity, ActivityType, AgeRange, Attendance, BudgetRange, ContactInfo, Demographics,
    EntityType, Event, EventCategory, EventId, EventStatus, GapType, GenderSplit, IncomeTier,
    Industry, MarketGap, MediaMetrics, MyEvent, MyEventStatus, Profile, Sponsor,
    SponsorAssociation, SponsorId, SponsorIntel, SponsorTier, SponsorshipStrategy,
    SuccessMetrics, TargetDemographics, Task, TaskLink, TaskPriority, TaskStatus, Verification,
    VerificationStatus, ACTIVITY_RETENTION, DEFAULT_CURRENCY,
};
use fields::{
    amount, bounded, count, count_u32, date, field, first, number, opt_count_u32, opt_number,
    opt_text, string_list, text, timestamp,
};
use serde_json::Value;
use std::collections::HashMap;

/// Sponsor id -> ids of events listing it, built once per snapshot load.
pub type SponsorshipIndex = HashMap<SponsorId, Vec<EventId>>;

pub fn map_association(row: &Row) -> Option<(EventId, SponsorAssociation)> {
    let event_id = opt_text(field(row, "event_id"))?;
    let sponsor_id = opt_text(field(row, "sponsor_id"))?;
    Some((
        EventId::new(event_id),
        SponsorAssociation {
            sponsor_id: SponsorId::new(sponsor_id),
            tier: SponsorTier::parse_loose(&text(field(row, "tier"))).unwrap_or_default(),
            deal_amount: amount(first(row, &["deal_amount", "amount"])),
            deliverables: text(field(row, "deliverables")),
        },
    ))
}

/// Maps event rows, attaching associations in backend order.
pub fn map_events(event_rows: &[Row], association_rows: &[Row]) -> Vec<Event> {
    let mut by_event: HashMap<EventId, Vec<SponsorAssociation>> = HashMap::new();
    for (event_id, association) in association_rows.iter().filter_map(map_association) {
        by_event.entry(event_id).or_default().push(association);
    }
    event_rows
        .iter()
        .filter_map(|row| {
            let id = EventId::new(opt_text(field(row, "id"))?);
            let sponsors = by_event.remove(&id).unwrap_or_default();
            Some(map_event(row, id, sponsors))
        })
        .collect()
}

pub fn map_event(row: &Row, id: EventId, sponsors: Vec<SponsorAssociation>) -> Event {
    let demographics = field(row, "demographics");
    let metrics = field(row, "success_metrics");
    let media = field(row, "media_metrics");
    Event {
        id,
        name: text(field(row, "name")),
        date: date(first(row, &["date", "start_date"])),
        end_date: date(field(row, "end_date")),
        location: text(field(row, "location")),
        venue: text(field(row, "venue")),
        organizer: text(field(row, "organizer")),
        category: EventCategory::parse_loose(&text(field(row, "category"))).unwrap_or_default(),
        status: EventStatus::parse_loose(&text(field(row, "status"))).unwrap_or_default(),
        attendance: Attendance {
            estimated: count_u32(first(row, &["estimated_attendance", "attendance"])),
            actual: opt_count_u32(field(row, "actual_attendance")),
        },
        demographics: Demographics {
            gender: map_gender(field(demographics, "gender")),
            age_range: map_age_range(field(demographics, "age_range")),
            income_tier: IncomeTier::parse_loose(&text(field(demographics, "income_tier")))
                .unwrap_or_default(),
            interests: string_list(field(demographics, "interests")),
        },
        sponsors,
        success_metrics: SuccessMetrics {
            satisfaction: number(field(metrics, "satisfaction")).clamp(0.0, 10.0),
            social_engagement: count(field(metrics, "social_engagement")),
            lead_count: count(field(metrics, "lead_count")),
            roi: amount(field(metrics, "roi")),
        },
        critical_analysis: text(field(row, "critical_analysis")),
        report: opt_text(field(row, "report")),
        budget: map_budget(row),
        media_metrics: MediaMetrics {
            impressions: count(field(media, "impressions")),
            reach: count(field(media, "reach")),
            mentions: count(field(media, "mentions")),
            media_value: amount(field(media, "media_value")),
        },
        tags: string_list(field(row, "tags")),
        verification: Verification {
            status: VerificationStatus::parse_loose(&text(field(row, "verification_status")))
                .unwrap_or_default(),
            confidence: bounded(field(row, "confidence_score"), 0, 100),
            verified_at: timestamp(field(row, "verified_at")),
        },
        created_at: timestamp(field(row, "created_at")),
        created_by: opt_text(field(row, "created_by")).map(Into::into),
    }
}

fn map_gender(value: &Value) -> GenderSplit {
    if value.is_null() {
        return GenderSplit::default();
    }
    GenderSplit {
        male: bounded(field(value, "male"), 0, 100),
        female: bounded(field(value, "female"), 0, 100),
        other: bounded(field(value, "other"), 0, 100),
    }
}

fn map_age_range(value: &Value) -> AgeRange {
    let min = bounded(field(value, "min"), 0, 120);
    let max = bounded(field(value, "max"), 0, 120);
    AgeRange {
        min: min.min(max),
        max: min.max(max),
    }
}

fn map_budget(row: &Row) -> BudgetRange {
    let min = amount(field(row, "budget_min"));
    let max = amount(field(row, "budget_max"));
    BudgetRange {
        // Swapped bounds are repaired rather than rejected.
        min: min.min(max),
        max: min.max(max),
        currency: opt_text(field(row, "currency")).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    }
}

pub fn index_sponsorships(events: &[Event]) -> SponsorshipIndex {
    let mut index = SponsorshipIndex::new();
    for event in events {
        for association in &event.sponsors {
            let ids = index.entry(association.sponsor_id.clone()).or_default();
            if !ids.contains(&event.id) {
                ids.push(event.id.clone());
            }
        }
    }
    index
}

/// Maps sponsor rows. `events_sponsored` is always recomputed from the
/// already-mapped events; whatever the row claims is ignored.
pub fn map_sponsors(rows: &[Row], events: &[Event]) -> Vec<Sponsor> {
    let index = index_sponsorships(events);
    rows.iter()
        .filter_map(|row| {
            let id = SponsorId::new(opt_text(field(row, "id"))?);
            Some(map_sponsor(row, id, &index))
        })
        .collect()
}

pub fn map_sponsor(row: &Row, id: SponsorId, index: &SponsorshipIndex) -> Sponsor {
    let target = field(row, "target_demographics");
    let intel = field(row, "intel");
    Sponsor {
        events_sponsored: index.get(&id).cloned().unwrap_or_default(),
        id,
        name: text(field(row, "name")),
        industry: Industry::parse_loose(&text(field(row, "industry"))).unwrap_or_default(),
        description: text(field(row, "description")),
        contact: ContactInfo {
            contact_person: text(field(row, "contact_person")),
            email: text(first(row, &["email", "contact_email"])),
            phone: text(first(row, &["phone", "contact_phone"])),
            website: text(field(row, "website")),
        },
        total_sponsorship: amount(field(row, "total_sponsorship")),
        average_deal: amount(field(row, "average_deal")),
        average_roi: amount(field(row, "average_roi")),
        preferred_tiers: string_list(field(row, "preferred_tiers"))
            .iter()
            .filter_map(|tier| SponsorTier::parse_loose(tier))
            .collect(),
        target_demographics: TargetDemographics {
            age_range: map_age_range(field(target, "age_range")),
            income_tiers: string_list(field(target, "income_tiers"))
                .iter()
                .filter_map(|tier| IncomeTier::parse_loose(tier))
                .collect(),
            interests: string_list(field(target, "interests")),
        },
        intel: if intel.is_object() {
            Some(SponsorIntel {
                strategy_notes: text(field(intel, "strategy_notes")),
                red_flags: string_list(field(intel, "red_flags")),
            })
        } else {
            None
        },
        created_at: timestamp(field(row, "created_at")),
    }
}

pub fn map_my_event(row: &Row) -> Option<MyEvent> {
    let id = opt_text(field(row, "id"))?;
    Some(MyEvent {
        id: id.into(),
        name: text(field(row, "name")),
        category: EventCategory::parse_loose(&text(field(row, "category"))).unwrap_or_default(),
        target_audience: string_list(field(row, "target_audience")),
        budget_goal: amount(field(row, "budget_goal")),
        currency: opt_text(field(row, "currency")).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        unique_angle: text(field(row, "unique_angle")),
        status: MyEventStatus::parse_loose(&text(field(row, "status"))).unwrap_or_default(),
        recommendations: map_recommendations(field(row, "recommendations")),
        created_at: timestamp(field(row, "created_at")),
    })
}

fn map_recommendations(value: &Value) -> Option<SponsorshipStrategy> {
    if value.is_null() {
        return None;
    }
    // Stored either as a JSON object or as its serialized text.
    match value {
        Value::String(raw) => serde_json::from_str(raw).ok(),
        other => serde_json::from_value(other.clone()).ok(),
    }
}

pub fn map_market_gap(row: &Row) -> Option<MarketGap> {
    let id = opt_text(field(row, "id"))?;
    Some(MarketGap {
        id: id.into(),
        gap_type: GapType::parse_loose(&text(first(row, &["gap_type", "type"]))).unwrap_or_default(),
        title: text(field(row, "title")),
        description: text(field(row, "description")),
        severity: bounded(field(row, "severity"), 1, 10),
        opportunity: bounded(first(row, &["opportunity", "opportunity_score"]), 1, 10),
        affected_area: text(field(row, "affected_area")),
        recommendations: string_list(field(row, "recommendations")),
        potential_revenue: opt_number(field(row, "potential_revenue")).map(|n| n.max(0.0)),
        identified_at: timestamp(first(row, &["identified_at", "created_at"])),
    })
}

pub fn map_activity(row: &Row) -> Option<Activity> {
    let id = opt_text(field(row, "id"))?;
    Some(Activity {
        id: id.into(),
        activity_type: ActivityType::parse_loose(&text(first(row, &["activity_type", "type"])))
            .unwrap_or(ActivityType::Update),
        entity_type: EntityType::parse_loose(&text(field(row, "entity_type")))
            .unwrap_or(EntityType::Event),
        entity_name: text(field(row, "entity_name")),
        at: timestamp(first(row, &["at", "created_at"])).unwrap_or_default(),
        actor_id: opt_text(first(row, &["actor_id", "user_id"])).map(Into::into),
    })
}

/// Newest first, capped at [`ACTIVITY_RETENTION`]. Rows are expected in
/// insertion order; equal timestamps keep the later insert first.
pub fn map_activities(rows: &[Row]) -> Vec<Activity> {
    let mut activities: Vec<Activity> = rows.iter().rev().filter_map(map_activity).collect();
    activities.sort_by(|a, b| b.at.cmp(&a.at));
    activities.truncate(ACTIVITY_RETENTION);
    activities
}

pub fn map_task(row: &Row) -> Option<Task> {
    let id = opt_text(field(row, "id"))?;
    let link = opt_text(field(row, "event_id"))
        .map(|id| TaskLink::Event(id.into()))
        .or_else(|| opt_text(field(row, "sponsor_id")).map(|id| TaskLink::Sponsor(id.into())));
    Some(Task {
        id: id.into(),
        title: text(field(row, "title")),
        description: opt_text(field(row, "description")),
        status: TaskStatus::parse_loose(&text(field(row, "status"))).unwrap_or_default(),
        priority: TaskPriority::parse_loose(&text(field(row, "priority"))).unwrap_or_default(),
        category: opt_text(field(row, "category")).unwrap_or_else(|| "general".to_string()),
        due_date: date(field(row, "due_date")),
        assignee_id: opt_text(first(row, &["assignee_id", "assigned_to"])).map(Into::into),
        created_by: opt_text(field(row, "created_by")).map(Into::into),
        link,
        created_at: timestamp(field(row, "created_at")),
        updated_at: timestamp(field(row, "updated_at")),
    })
}

pub fn map_profile(row: &Row) -> Option<Profile> {
    let id = opt_text(field(row, "id"))?;
    Some(Profile {
        id: id.into(),
        full_name: text(field(row, "full_name")),
        email: text(field(row, "email")),
        role: opt_text(field(row, "role")).unwrap_or_else(|| "member".to_string()),
    })
}
