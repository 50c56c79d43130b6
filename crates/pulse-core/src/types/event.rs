use crate::types::enums::{EventCategory, EventStatus, IncomeTier, SponsorTier, VerificationStatus};
use crate::types::ids::{EventId, ProfileId, SponsorId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: String,
    pub venue: String,
    pub organizer: String,
    pub category: EventCategory,
    pub status: EventStatus,
    pub attendance: Attendance,
    pub demographics: Demographics,
    /// Ordered as the backend returned them.
    pub sponsors: Vec<SponsorAssociation>,
    pub success_metrics: SuccessMetrics,
    pub critical_analysis: String,
    pub report: Option<String>,
    pub budget: BudgetRange,
    pub media_metrics: MediaMetrics,
    pub tags: Vec<String>,
    pub verification: Verification,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<ProfileId>,
}

impl Event {
    pub fn has_sponsor(&self, sponsor_id: &SponsorId) -> bool {
        self.sponsors
            .iter()
            .any(|association| &association.sponsor_id == sponsor_id)
    }

    pub fn total_deal_value(&self) -> f64 {
        self.sponsors.iter().map(|a| a.deal_amount).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub estimated: u32,
    pub actual: Option<u32>,
}

impl Attendance {
    /// Actual figure when the event has one, estimate otherwise.
    pub fn best(&self) -> u32 {
        self.actual.unwrap_or(self.estimated)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub gender: GenderSplit,
    pub age_range: AgeRange,
    pub income_tier: IncomeTier,
    pub interests: Vec<String>,
}

/// Percentages; a valid split sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderSplit {
    pub male: u8,
    pub female: u8,
    pub other: u8,
}

impl Default for GenderSplit {
    fn default() -> Self {
        Self {
            male: 50,
            female: 50,
            other: 0,
        }
    }
}

impl GenderSplit {
    pub fn total(&self) -> u16 {
        u16::from(self.male) + u16::from(self.female) + u16::from(self.other)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorAssociation {
    pub sponsor_id: SponsorId,
    pub tier: SponsorTier,
    pub deal_amount: f64,
    pub deliverables: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessMetrics {
    /// 0-10
    pub satisfaction: f64,
    pub social_engagement: u64,
    pub lead_count: u64,
    pub roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

impl Default for BudgetRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl BudgetRange {
    pub fn overlaps(&self, min: Option<f64>, max: Option<f64>) -> bool {
        min.is_none_or(|min| self.max >= min) && max.is_none_or(|max| self.min <= max)
    }
}

pub const DEFAULT_CURRENCY: &str = "IDR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetrics {
    pub impressions: u64,
    pub reach: u64,
    pub mentions: u64,
    pub media_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub status: VerificationStatus,
    /// 0-100
    pub confidence: u8,
    pub verified_at: Option<DateTime<Utc>>,
}
