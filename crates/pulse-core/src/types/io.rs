use crate::types::enums::{
    EventCategory, EventStatus, GapType, Industry, MyEventStatus, SponsorTier, TaskPriority,
    TaskStatus,
};
use crate::types::event::{
    Attendance, BudgetRange, Demographics, MediaMetrics, SponsorAssociation, SuccessMetrics,
    Verification,
};
use crate::types::ids::ProfileId;
use crate::types::insight::SponsorshipStrategy;
use crate::types::sponsor::{ContactInfo, SponsorIntel, TargetDemographics};
use crate::types::task::TaskLink;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: String,
    pub venue: String,
    pub organizer: String,
    pub category: EventCategory,
    pub status: Option<EventStatus>,
    pub attendance: Attendance,
    pub demographics: Demographics,
    pub sponsors: Vec<SponsorAssociation>,
    pub success_metrics: SuccessMetrics,
    pub critical_analysis: String,
    pub budget: BudgetRange,
    pub media_metrics: MediaMetrics,
    pub tags: Vec<String>,
    pub verification: Verification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub venue: Option<String>,
    pub organizer: Option<String>,
    pub category: Option<EventCategory>,
    pub status: Option<EventStatus>,
    pub attendance: Option<Attendance>,
    pub demographics: Option<Demographics>,
    /// Replaces the whole association list when present.
    pub sponsors: Option<Vec<SponsorAssociation>>,
    pub success_metrics: Option<SuccessMetrics>,
    pub critical_analysis: Option<String>,
    pub report: Option<String>,
    pub budget: Option<BudgetRange>,
    pub media_metrics: Option<MediaMetrics>,
    pub tags: Option<Vec<String>>,
    pub verification: Option<Verification>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSponsorInput {
    pub name: String,
    pub industry: Industry,
    pub description: String,
    pub contact: ContactInfo,
    pub total_sponsorship: f64,
    pub average_deal: f64,
    pub average_roi: f64,
    pub preferred_tiers: Vec<SponsorTier>,
    pub target_demographics: TargetDemographics,
    pub intel: Option<SponsorIntel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSponsorInput {
    pub name: Option<String>,
    pub industry: Option<Industry>,
    pub description: Option<String>,
    pub contact: Option<ContactInfo>,
    pub total_sponsorship: Option<f64>,
    pub average_deal: Option<f64>,
    pub average_roi: Option<f64>,
    pub preferred_tiers: Option<Vec<SponsorTier>>,
    pub target_demographics: Option<TargetDemographics>,
    pub intel: Option<SponsorIntel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMyEventInput {
    pub name: String,
    pub category: EventCategory,
    pub target_audience: Vec<String>,
    pub budget_goal: f64,
    pub currency: Option<String>,
    pub unique_angle: String,
    pub status: Option<MyEventStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMyEventInput {
    pub name: Option<String>,
    pub category: Option<EventCategory>,
    pub target_audience: Option<Vec<String>>,
    pub budget_goal: Option<f64>,
    pub currency: Option<String>,
    pub unique_angle: Option<String>,
    pub status: Option<MyEventStatus>,
    pub recommendations: Option<SponsorshipStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketGapInput {
    pub gap_type: GapType,
    pub title: String,
    pub description: String,
    pub severity: u8,
    pub opportunity: u8,
    pub affected_area: String,
    pub recommendations: Vec<String>,
    pub potential_revenue: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMarketGapInput {
    pub gap_type: Option<GapType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<u8>,
    pub opportunity: Option<u8>,
    pub affected_area: Option<String>,
    pub recommendations: Option<Vec<String>>,
    pub potential_revenue: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: String,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<ProfileId>,
    pub link: Option<TaskLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<ProfileId>,
    pub link: Option<TaskLink>,
}

/// Unset fields and empty sets impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub search_query: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub categories: Vec<EventCategory>,
    pub statuses: Vec<EventStatus>,
    pub min_attendance: Option<u32>,
    pub max_attendance: Option<u32>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
    /// Events with at least one association in one of these tiers.
    pub sponsor_tiers: Vec<SponsorTier>,
    pub sort: EventSort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSort {
    #[default]
    DateAsc,
    DateDesc,
    Name,
    Attendance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorFilter {
    pub search_query: Option<String>,
    pub industries: Vec<Industry>,
    /// Sponsors preferring at least one of these tiers.
    pub tiers: Vec<SponsorTier>,
    pub min_total_sponsorship: Option<f64>,
    pub sort: SponsorSort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SponsorSort {
    #[default]
    Name,
    TotalSponsorship,
    EventsCount,
}
