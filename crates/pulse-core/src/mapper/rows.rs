//! Domain inputs -> backend rows (the inverse direction of the mapper).
//!
//! Creates produce full rows; updates produce patches holding only the
//! fields that were set.

use crate::backend::Row;
use crate::types::{
    ActivityType, AgeRange, CreateEventInput, CreateMarketGapInput, CreateMyEventInput,
    CreateSponsorInput, CreateTaskInput, Demographics, EntityType, EventId, EventStatus,
    MediaMetrics, MyEventStatus, ProfileId, SponsorAssociation, SponsorIntel, SuccessMetrics,
    TargetDemographics, TaskLink, UpdateEventInput, UpdateMarketGapInput, UpdateMyEventInput,
    UpdateSponsorInput, UpdateTaskInput, DEFAULT_CURRENCY,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Accumulates only the fields that were provided.
#[derive(Default)]
struct Patch(Map<String, Value>);

impl Patch {
    fn set<T: Serialize>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), json!(value));
        }
        self
    }

    fn set_raw(&mut self, key: &str, value: Option<Value>) -> &mut Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value);
        }
        self
    }

    fn into_row(self) -> Row {
        Value::Object(self.0)
    }
}

fn age_range_json(range: &AgeRange) -> Value {
    json!({ "min": range.min, "max": range.max })
}

fn demographics_json(demographics: &Demographics) -> Value {
    json!({
        "gender": {
            "male": demographics.gender.male,
            "female": demographics.gender.female,
            "other": demographics.gender.other,
        },
        "age_range": age_range_json(&demographics.age_range),
        "income_tier": demographics.income_tier.as_str(),
        "interests": demographics.interests,
    })
}

fn success_metrics_json(metrics: &SuccessMetrics) -> Value {
    json!({
        "satisfaction": metrics.satisfaction,
        "social_engagement": metrics.social_engagement,
        "lead_count": metrics.lead_count,
        "roi": metrics.roi,
    })
}

fn media_metrics_json(metrics: &MediaMetrics) -> Value {
    json!({
        "impressions": metrics.impressions,
        "reach": metrics.reach,
        "mentions": metrics.mentions,
        "media_value": metrics.media_value,
    })
}

fn target_json(target: &TargetDemographics) -> Value {
    json!({
        "age_range": age_range_json(&target.age_range),
        "income_tiers": target.income_tiers.iter().map(|tier| tier.as_str()).collect::<Vec<_>>(),
        "interests": target.interests,
    })
}

fn intel_json(intel: &SponsorIntel) -> Value {
    json!({
        "strategy_notes": intel.strategy_notes,
        "red_flags": intel.red_flags,
    })
}

fn timestamp_json(at: Option<DateTime<Utc>>) -> Value {
    at.map_or(Value::Null, |at| Value::String(at.to_rfc3339()))
}

pub fn event_row(input: &CreateEventInput, created_by: Option<&ProfileId>) -> Row {
    json!({
        "name": input.name.trim(),
        "date": input.date,
        "end_date": input.end_date,
        "location": input.location,
        "venue": input.venue,
        "organizer": input.organizer,
        "category": input.category.as_str(),
        "status": input.status.unwrap_or(EventStatus::Upcoming).as_str(),
        "estimated_attendance": input.attendance.estimated,
        "actual_attendance": input.attendance.actual,
        "demographics": demographics_json(&input.demographics),
        "success_metrics": success_metrics_json(&input.success_metrics),
        "critical_analysis": input.critical_analysis,
        "budget_min": input.budget.min,
        "budget_max": input.budget.max,
        "currency": input.budget.currency,
        "media_metrics": media_metrics_json(&input.media_metrics),
        "tags": input.tags,
        "verification_status": input.verification.status.as_str(),
        "confidence_score": input.verification.confidence,
        "verified_at": timestamp_json(input.verification.verified_at),
        "created_by": created_by,
    })
}

/// Association changes are written separately through [`association_rows`].
pub fn event_patch(input: &UpdateEventInput) -> Row {
    let mut patch = Patch::default();
    patch
        .set("name", input.name.as_deref().map(str::trim))
        .set("date", input.date)
        .set("end_date", input.end_date)
        .set("location", input.location.as_ref())
        .set("venue", input.venue.as_ref())
        .set("organizer", input.organizer.as_ref())
        .set("category", input.category.map(|c| c.as_str()))
        .set("status", input.status.map(|s| s.as_str()))
        .set("critical_analysis", input.critical_analysis.as_ref())
        .set("report", input.report.as_ref())
        .set("tags", input.tags.as_ref())
        .set_raw("demographics", input.demographics.as_ref().map(demographics_json))
        .set_raw(
            "success_metrics",
            input.success_metrics.as_ref().map(success_metrics_json),
        )
        .set_raw(
            "media_metrics",
            input.media_metrics.as_ref().map(media_metrics_json),
        );
    if let Some(attendance) = &input.attendance {
        patch
            .set("estimated_attendance", Some(attendance.estimated))
            .set_raw("actual_attendance", Some(json!(attendance.actual)));
    }
    if let Some(budget) = &input.budget {
        patch
            .set("budget_min", Some(budget.min))
            .set("budget_max", Some(budget.max))
            .set("currency", Some(&budget.currency));
    }
    if let Some(verification) = &input.verification {
        patch
            .set("verification_status", Some(verification.status.as_str()))
            .set("confidence_score", Some(verification.confidence))
            .set_raw("verified_at", Some(timestamp_json(verification.verified_at)));
    }
    patch.into_row()
}

pub fn association_rows(event_id: &EventId, associations: &[SponsorAssociation]) -> Vec<Row> {
    associations
        .iter()
        .map(|association| {
            json!({
                "event_id": event_id,
                "sponsor_id": association.sponsor_id,
                "tier": association.tier.as_str(),
                "deal_amount": association.deal_amount,
                "deliverables": association.deliverables,
            })
        })
        .collect()
}

pub fn sponsor_row(input: &CreateSponsorInput) -> Row {
    json!({
        "name": input.name.trim(),
        "industry": input.industry.as_str(),
        "description": input.description,
        "contact_person": input.contact.contact_person,
        "email": input.contact.email,
        "phone": input.contact.phone,
        "website": input.contact.website,
        "total_sponsorship": input.total_sponsorship,
        "average_deal": input.average_deal,
        "average_roi": input.average_roi,
        "preferred_tiers": input.preferred_tiers.iter().map(|tier| tier.as_str()).collect::<Vec<_>>(),
        "target_demographics": target_json(&input.target_demographics),
        "intel": input.intel.as_ref().map(intel_json),
    })
}

pub fn sponsor_patch(input: &UpdateSponsorInput) -> Row {
    let mut patch = Patch::default();
    patch
        .set("name", input.name.as_deref().map(str::trim))
        .set("industry", input.industry.map(|i| i.as_str()))
        .set("description", input.description.as_ref())
        .set("total_sponsorship", input.total_sponsorship)
        .set("average_deal", input.average_deal)
        .set("average_roi", input.average_roi)
        .set(
            "preferred_tiers",
            input
                .preferred_tiers
                .as_ref()
                .map(|tiers| tiers.iter().map(|tier| tier.as_str()).collect::<Vec<_>>()),
        )
        .set_raw(
            "target_demographics",
            input.target_demographics.as_ref().map(target_json),
        )
        .set_raw("intel", input.intel.as_ref().map(intel_json));
    if let Some(contact) = &input.contact {
        patch
            .set("contact_person", Some(&contact.contact_person))
            .set("email", Some(&contact.email))
            .set("phone", Some(&contact.phone))
            .set("website", Some(&contact.website));
    }
    patch.into_row()
}

pub fn my_event_row(input: &CreateMyEventInput, created_by: Option<&ProfileId>) -> Row {
    json!({
        "name": input.name.trim(),
        "category": input.category.as_str(),
        "target_audience": input.target_audience,
        "budget_goal": input.budget_goal,
        "currency": input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
        "unique_angle": input.unique_angle,
        "status": input.status.unwrap_or(MyEventStatus::Draft).as_str(),
        "recommendations": Value::Null,
        "created_by": created_by,
    })
}

pub fn my_event_patch(input: &UpdateMyEventInput) -> Row {
    let mut patch = Patch::default();
    patch
        .set("name", input.name.as_deref().map(str::trim))
        .set("category", input.category.map(|c| c.as_str()))
        .set("target_audience", input.target_audience.as_ref())
        .set("budget_goal", input.budget_goal)
        .set("currency", input.currency.as_ref())
        .set("unique_angle", input.unique_angle.as_ref())
        .set("status", input.status.map(|s| s.as_str()))
        .set("recommendations", input.recommendations.as_ref());
    patch.into_row()
}

pub fn market_gap_row(input: &CreateMarketGapInput) -> Row {
    json!({
        "gap_type": input.gap_type.as_str(),
        "title": input.title.trim(),
        "description": input.description,
        "severity": input.severity,
        "opportunity": input.opportunity,
        "affected_area": input.affected_area,
        "recommendations": input.recommendations,
        "potential_revenue": input.potential_revenue,
        "identified_at": Utc::now().to_rfc3339(),
    })
}

pub fn market_gap_patch(input: &UpdateMarketGapInput) -> Row {
    let mut patch = Patch::default();
    patch
        .set("gap_type", input.gap_type.map(|g| g.as_str()))
        .set("title", input.title.as_deref().map(str::trim))
        .set("description", input.description.as_ref())
        .set("severity", input.severity)
        .set("opportunity", input.opportunity)
        .set("affected_area", input.affected_area.as_ref())
        .set("recommendations", input.recommendations.as_ref())
        .set("potential_revenue", input.potential_revenue);
    patch.into_row()
}

fn link_columns(link: Option<&TaskLink>) -> (Value, Value) {
    match link {
        Some(TaskLink::Event(id)) => (json!(id), Value::Null),
        Some(TaskLink::Sponsor(id)) => (Value::Null, json!(id)),
        None => (Value::Null, Value::Null),
    }
}

pub fn task_row(input: &CreateTaskInput, created_by: Option<&ProfileId>) -> Row {
    let (event_id, sponsor_id) = link_columns(input.link.as_ref());
    json!({
        "title": input.title.trim(),
        "description": input.description,
        "status": input.status.unwrap_or_default().as_str(),
        "priority": input.priority.unwrap_or_default().as_str(),
        "category": if input.category.trim().is_empty() { "general" } else { input.category.trim() },
        "due_date": input.due_date,
        "assigned_to": input.assignee_id,
        "created_by": created_by,
        "event_id": event_id,
        "sponsor_id": sponsor_id,
    })
}

pub fn task_patch(input: &UpdateTaskInput) -> Row {
    let mut patch = Patch::default();
    patch
        .set("title", input.title.as_deref().map(str::trim))
        .set("description", input.description.as_ref())
        .set("status", input.status.map(|s| s.as_str()))
        .set("priority", input.priority.map(|p| p.as_str()))
        .set("category", input.category.as_ref())
        .set("due_date", input.due_date)
        .set("assigned_to", input.assignee_id.as_ref());
    if let Some(link) = &input.link {
        let (event_id, sponsor_id) = link_columns(Some(link));
        patch
            .set_raw("event_id", Some(event_id))
            .set_raw("sponsor_id", Some(sponsor_id));
    }
    patch.into_row()
}

pub fn activity_row(
    activity_type: ActivityType,
    entity_type: EntityType,
    entity_name: &str,
    actor_id: Option<&ProfileId>,
) -> Row {
    json!({
        "type": activity_type.as_str(),
        "entity_type": entity_type.as_str(),
        "entity_name": entity_name,
        "user_id": actor_id,
        "created_at": Utc::now().to_rfc3339(),
    })
}
