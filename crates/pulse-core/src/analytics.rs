//! Derived figures computed from a snapshot on every read: sponsor fit,
//! gap placement and dashboard totals.

use crate::snapshot::Snapshot;
use crate::types::{
    Event, EventCategory, EventStatus, Industry, MarketGap, Sponsor, SponsorId, SponsorMatch,
    TaskStatus,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Severity/opportunity rating at or above which a gap counts as "high".
pub const HIGH_RATING: u8 = 8;

/// Split point of the severity x opportunity plane.
pub const QUADRANT_SPLIT: u8 = 6;

const INTEREST_WEIGHT: f64 = 0.4;
const INDUSTRY_WEIGHT: f64 = 0.35;
const ROI_WEIGHT: f64 = 0.25;

fn affinities(industry: Industry) -> &'static [EventCategory] {
    use EventCategory::{
        Charity, Conference, Corporate, Culinary, Cultural, Exhibition, Festival, Music, Sports,
    };
    match industry {
        Industry::Technology => &[Conference, Exhibition, Music],
        Industry::Finance => &[Conference, Corporate, Sports, Charity],
        Industry::Telecommunications => &[Music, Sports, Festival, Conference],
        Industry::Automotive => &[Exhibition, Sports],
        Industry::FoodBeverage => &[Culinary, Festival, Music],
        Industry::Retail => &[Festival, Culinary, Exhibition],
        Industry::Energy => &[Conference, Sports, Corporate],
        Industry::Healthcare => &[Sports, Charity, Conference],
        Industry::Media => &[Music, Festival, Cultural, Conference],
        Industry::RealEstate => &[Exhibition, Corporate],
        Industry::Hospitality => &[Culinary, Cultural, Festival],
        Industry::Other => &[],
    }
}

/// Industry/category compatibility in `[0, 1]`.
pub fn industry_match(industry: Industry, category: EventCategory) -> f64 {
    if affinities(industry).contains(&category) {
        1.0
    } else if industry == Industry::Other || category == EventCategory::Other {
        0.5
    } else {
        0.25
    }
}

/// Share of the smaller interest list found in the other, case-insensitive.
pub fn interest_overlap(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let left: HashSet<String> = a.iter().map(|s| s.trim().to_lowercase()).collect();
    let right: HashSet<String> = b.iter().map(|s| s.trim().to_lowercase()).collect();
    let shared = left.intersection(&right).count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = shared as f64 / left.len().min(right.len()) as f64;
    ratio
}

/// Clamps any externally supplied score into `0..=100`; NaN becomes 0.
pub fn clamp_fit_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamped = score.round().clamp(0.0, 100.0) as u8;
    clamped
}

fn roi_factor(roi: f64) -> f64 {
    if roi.is_nan() {
        return 0.0;
    }
    (roi / 10.0).clamp(0.0, 1.0)
}

/// Weighted local affinity of a sponsor for an event.
pub fn fit_score(event: &Event, sponsor: &Sponsor) -> u8 {
    let overlap = interest_overlap(
        &event.demographics.interests,
        &sponsor.target_demographics.interests,
    );
    let industry = industry_match(sponsor.industry, event.category);
    clamp_fit_score(
        100.0
            * (INTEREST_WEIGHT * overlap
                + INDUSTRY_WEIGHT * industry
                + ROI_WEIGHT * roi_factor(sponsor.average_roi)),
    )
}

/// Ranks sponsors for an event by local fit score. Ties prefer the sponsor
/// with more prior sponsorships, then the name.
pub fn rank_sponsors(event: &Event, sponsors: &[Sponsor]) -> Vec<SponsorMatch> {
    let mut scored: Vec<(u8, &Sponsor)> = sponsors
        .iter()
        .map(|sponsor| (fit_score(event, sponsor), sponsor))
        .collect();
    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .cmp(score_a)
            .then_with(|| b.events_sponsored.len().cmp(&a.events_sponsored.len()))
            .then_with(|| a.name.cmp(&b.name))
    });
    scored
        .into_iter()
        .map(|(fit_score, sponsor)| SponsorMatch {
            sponsor_id: sponsor.id.clone(),
            sponsor_name: sponsor.name.clone(),
            fit_score,
            estimated_roi: sponsor.average_roi.max(0.0),
            reasoning: format!(
                "{} industry fit for {} events; {} prior sponsorships; average ROI {:.1}x",
                fit_label(industry_match(sponsor.industry, event.category)),
                event.category,
                sponsor.events_sponsored.len(),
                sponsor.average_roi
            ),
        })
        .collect()
}

fn fit_label(industry_match: f64) -> &'static str {
    if industry_match >= 1.0 {
        "Strong"
    } else if industry_match >= 0.5 {
        "Neutral"
    } else {
        "Weak"
    }
}

/// Deterministic match used when the reasoning service is unavailable:
/// `round(100 * clamp(industry_match) * 0.6 + clamp(roi / 10) * 0.4)`, with
/// the sponsor's average ROI carried through unchanged.
pub fn fallback_match(sponsor: &Sponsor, industry_match: f64) -> SponsorMatch {
    let industry = if industry_match.is_nan() {
        0.0
    } else {
        industry_match.clamp(0.0, 1.0)
    };
    let score = 100.0 * industry * 0.6 + roi_factor(sponsor.average_roi) * 0.4;
    SponsorMatch {
        sponsor_id: sponsor.id.clone(),
        sponsor_name: sponsor.name.clone(),
        fit_score: clamp_fit_score(score),
        estimated_roi: sponsor.average_roi,
        reasoning: format!(
            "Offline estimate from industry fit ({:.0}%) and historical ROI.",
            industry * 100.0
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapQuadrant {
    /// Acute and lucrative.
    Critical,
    /// Mild today, lucrative to address.
    Strategic,
    /// Acute but with little upside.
    Niche,
    Monitor,
}

impl GapQuadrant {
    pub fn of(gap: &MarketGap) -> Self {
        match (
            gap.severity >= QUADRANT_SPLIT,
            gap.opportunity >= QUADRANT_SPLIT,
        ) {
            (true, true) => Self::Critical,
            (false, true) => Self::Strategic,
            (true, false) => Self::Niche,
            (false, false) => Self::Monitor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Strategic => "strategic",
            Self::Niche => "niche",
            Self::Monitor => "monitor",
        }
    }
}

/// Highest severity x opportunity first; ties prefer opportunity.
pub fn rank_gaps(gaps: &[MarketGap]) -> Vec<&MarketGap> {
    let mut ranked: Vec<&MarketGap> = gaps.iter().collect();
    ranked.sort_by(|a, b| {
        let product = |gap: &MarketGap| u16::from(gap.severity) * u16::from(gap.opportunity);
        product(b)
            .cmp(&product(a))
            .then_with(|| b.opportunity.cmp(&a.opportunity))
    });
    ranked
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapSummary {
    pub total: usize,
    pub high_severity: usize,
    pub high_opportunity: usize,
    /// Sum over gaps that carry an estimate.
    pub potential_revenue: f64,
}

pub fn summarize_gaps(gaps: &[MarketGap]) -> GapSummary {
    GapSummary {
        total: gaps.len(),
        high_severity: gaps.iter().filter(|g| g.severity >= HIGH_RATING).count(),
        high_opportunity: gaps.iter().filter(|g| g.opportunity >= HIGH_RATING).count(),
        potential_revenue: gaps.iter().filter_map(|g| g.potential_revenue).sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub events: usize,
    pub upcoming_events: usize,
    pub completed_events: usize,
    pub cancelled_events: usize,
    pub sponsors: usize,
    pub total_deal_value: f64,
    pub average_sponsor_roi: f64,
    pub open_tasks: usize,
    pub overdue_tasks: usize,
    pub gaps: GapSummary,
}

impl DashboardStats {
    pub fn compute(snapshot: &Snapshot, today: NaiveDate) -> Self {
        let with_status = |status: EventStatus| {
            snapshot
                .events
                .iter()
                .filter(|event| event.status == status)
                .count()
        };
        let average_sponsor_roi = if snapshot.sponsors.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = snapshot.sponsors.len() as f64;
            snapshot.sponsors.iter().map(|s| s.average_roi).sum::<f64>() / count
        };
        Self {
            events: snapshot.events.len(),
            upcoming_events: with_status(EventStatus::Upcoming),
            completed_events: with_status(EventStatus::Completed),
            cancelled_events: with_status(EventStatus::Cancelled),
            sponsors: snapshot.sponsors.len(),
            total_deal_value: snapshot.events.iter().map(Event::total_deal_value).sum(),
            average_sponsor_roi,
            open_tasks: snapshot
                .tasks
                .iter()
                .filter(|task| task.status != TaskStatus::Done)
                .count(),
            overdue_tasks: snapshot
                .tasks
                .iter()
                .filter(|task| task.is_overdue(today))
                .count(),
            gaps: summarize_gaps(&snapshot.market_gaps),
        }
    }
}

/// Orders matches best first without re-scoring them. Ties prefer the
/// sponsor with more prior sponsorships in `sponsors`, then the higher ROI,
/// then the name.
pub fn sort_matches(matches: &mut [SponsorMatch], sponsors: &[Sponsor]) {
    let prior = |id: &SponsorId| {
        sponsors
            .iter()
            .find(|sponsor| &sponsor.id == id)
            .map_or(0, |sponsor| sponsor.events_sponsored.len())
    };
    matches.sort_by(|a, b| {
        b.fit_score
            .cmp(&a.fit_score)
            .then_with(|| prior(&b.sponsor_id).cmp(&prior(&a.sponsor_id)))
            .then_with(|| {
                b.estimated_roi
                    .partial_cmp(&a.estimated_roi)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.sponsor_name.cmp(&b.sponsor_name))
    });
}
