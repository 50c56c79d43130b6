use crate::types::enums::{IncomeTier, Industry, SponsorTier};
use crate::types::event::AgeRange;
use crate::types::ids::{EventId, SponsorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sponsor {
    pub id: SponsorId,
    pub name: String,
    pub industry: Industry,
    pub description: String,
    pub contact: ContactInfo,
    /// Derived on every snapshot load from event associations; never read
    /// from the backend.
    pub events_sponsored: Vec<EventId>,
    pub total_sponsorship: f64,
    pub average_deal: f64,
    /// Historical return multiple, 0-10 scale.
    pub average_roi: f64,
    pub preferred_tiers: Vec<SponsorTier>,
    pub target_demographics: TargetDemographics,
    pub intel: Option<SponsorIntel>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDemographics {
    pub age_range: AgeRange,
    pub income_tiers: Vec<IncomeTier>,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorIntel {
    pub strategy_notes: String,
    pub red_flags: Vec<String>,
}
