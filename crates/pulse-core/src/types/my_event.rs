use crate::types::enums::{EventCategory, MyEventStatus};
use crate::types::ids::MyEventId;
use crate::types::insight::SponsorshipStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A strategy draft for an event the user is planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyEvent {
    pub id: MyEventId,
    pub name: String,
    pub category: EventCategory,
    pub target_audience: Vec<String>,
    pub budget_goal: f64,
    pub currency: String,
    pub unique_angle: String,
    pub status: MyEventStatus,
    pub recommendations: Option<SponsorshipStrategy>,
    pub created_at: Option<DateTime<Utc>>,
}
