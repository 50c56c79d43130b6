//! Fixed local payloads substituted whenever the reasoning service fails.

use crate::analytics::{
    clamp_fit_score, fallback_match, industry_match, rank_gaps, rank_sponsors, sort_matches,
};
use crate::snapshot::Snapshot;
use crate::types::{
    Event, EventAnalysisReport, EventStatus, GapInsight, InsightOrigin, MyEvent, SponsorTier,
    SponsorshipStrategy,
};

/// Sponsor matches kept in a fallback strategy.
pub const FALLBACK_MATCHES: usize = 5;
/// Market gaps kept in a fallback strategy.
pub const FALLBACK_GAPS: usize = 3;

/// Rule-based assessment built from the event's own numbers.
pub fn fallback_analysis(snapshot: &Snapshot, event: &Event) -> EventAnalysisReport {
    let metrics = &event.success_metrics;
    let resolved = snapshot.resolve_sponsors(event);
    let score = if metrics.satisfaction > 0.0 {
        clamp_fit_score(metrics.satisfaction * 10.0)
    } else {
        clamp_fit_score(f64::from(event.verification.confidence) * 0.5 + 25.0)
    };

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    if let Some(actual) = event.attendance.actual {
        if actual >= event.attendance.estimated {
            strengths.push(format!(
                "Attendance of {actual} met the estimate of {}.",
                event.attendance.estimated
            ));
        } else {
            weaknesses.push(format!(
                "Attendance of {actual} fell short of the estimate of {}.",
                event.attendance.estimated
            ));
        }
    }
    if metrics.roi >= 3.0 {
        strengths.push(format!("Reported ROI of {:.1}x.", metrics.roi));
    }
    if event.media_metrics.impressions > 0 {
        strengths.push(format!(
            "{} media impressions across {} mentions.",
            event.media_metrics.impressions, event.media_metrics.mentions
        ));
    }
    if resolved.is_empty() {
        weaknesses.push("No confirmed sponsors.".to_string());
    } else if !resolved
        .iter()
        .any(|(association, _)| association.tier == SponsorTier::Title)
    {
        weaknesses.push("No title sponsor secured.".to_string());
    }
    if event.status == EventStatus::Cancelled {
        weaknesses.push("The event was cancelled.".to_string());
    }

    let sponsor_insights = resolved
        .iter()
        .map(|(association, sponsor)| {
            format!(
                "{} ({} tier, {:.0} {}): average ROI {:.1}x.",
                sponsor.name,
                association.tier,
                association.deal_amount,
                event.budget.currency,
                sponsor.average_roi
            )
        })
        .collect();

    let recommendations = rank_sponsors(event, &snapshot.sponsors)
        .into_iter()
        .filter(|matched| !event.has_sponsor(&matched.sponsor_id))
        .take(3)
        .map(|matched| {
            format!(
                "Approach {} (local fit score {}).",
                matched.sponsor_name, matched.fit_score
            )
        })
        .collect();

    EventAnalysisReport {
        summary: format!(
            "{} ({}, {}): offline assessment from recorded metrics.",
            event.name, event.category, event.status
        ),
        score,
        strengths,
        weaknesses,
        sponsor_insights,
        recommendations,
        origin: InsightOrigin::Fallback,
    }
}

/// Highest-ranked gaps plus every sponsor scored by the documented
/// industry/ROI formula, best first.
pub fn fallback_strategy(snapshot: &Snapshot, draft: &MyEvent) -> SponsorshipStrategy {
    let market_gaps = rank_gaps(&snapshot.market_gaps)
        .into_iter()
        .take(FALLBACK_GAPS)
        .map(|gap| GapInsight {
            title: gap.title.clone(),
            description: gap.description.clone(),
            severity: gap.severity,
            opportunity: gap.opportunity,
        })
        .collect();
    let mut sponsor_matches: Vec<_> = snapshot
        .sponsors
        .iter()
        .map(|sponsor| fallback_match(sponsor, industry_match(sponsor.industry, draft.category)))
        .collect();
    sort_matches(&mut sponsor_matches, &snapshot.sponsors);
    sponsor_matches.truncate(FALLBACK_MATCHES);
    SponsorshipStrategy {
        market_gaps,
        sponsor_matches,
        origin: InsightOrigin::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureDataset;
    use crate::snapshot::FallbackReason;
    use crate::types::{EventId, Sponsor, SponsorId};

    #[test]
    fn fallback_analysis_is_deterministic() {
        let snapshot = FixtureDataset::bundled().snapshot(FallbackReason::Unconfigured, 1);
        let event = snapshot.event(&"evt_bandung-culinary-2025".into()).unwrap();
        let first = fallback_analysis(&snapshot, event);
        let second = fallback_analysis(&snapshot, event);
        assert_eq!(first, second);
        assert_eq!(first.score, 89);
        assert_eq!(first.origin, InsightOrigin::Fallback);
        assert_eq!(first.sponsor_insights.len(), 2);
        assert!(first.strengths.iter().any(|s| s.contains("28400")));
        assert!(first
            .recommendations
            .iter()
            .all(|r| !r.contains("Kopi Kita") && !r.contains("Segar Retail")));
    }

    #[test]
    fn fallback_strategy_uses_documented_formula() {
        let snapshot = FixtureDataset::bundled().snapshot(FallbackReason::Unconfigured, 1);
        let draft = snapshot.my_event(&"mye_makassar-food-week".into()).unwrap();
        let strategy = fallback_strategy(&snapshot, draft);
        assert_eq!(strategy.origin, InsightOrigin::Fallback);
        assert_eq!(strategy.market_gaps.len(), FALLBACK_GAPS);
        assert_eq!(strategy.market_gaps[0].title, snapshot.market_gaps[0].title);
        assert_eq!(strategy.sponsor_matches.len(), FALLBACK_MATCHES);
        for matched in &strategy.sponsor_matches {
            let sponsor = snapshot.sponsor(&matched.sponsor_id).unwrap();
            let expected = fallback_match(sponsor, industry_match(sponsor.industry, draft.category));
            assert_eq!(matched.fit_score, expected.fit_score);
            assert!((matched.estimated_roi - sponsor.average_roi).abs() < f64::EPSILON);
        }
        // Culinary drafts favour food and retail brands.
        assert_eq!(strategy.sponsor_matches[0].sponsor_name, "Kopi Kita");
    }

    #[test]
    fn fallback_strategy_ties_prefer_experienced_sponsors() {
        let mut snapshot = FixtureDataset::bundled().snapshot(FallbackReason::Unconfigured, 1);
        let template = snapshot.sponsors[0].clone();
        let newcomer = Sponsor {
            id: SponsorId::new("spn_new"),
            name: "Anchor Newcomer".to_string(),
            events_sponsored: Vec::new(),
            ..template.clone()
        };
        let veteran = Sponsor {
            id: SponsorId::new("spn_vet"),
            name: "Zenith Veteran".to_string(),
            events_sponsored: vec![
                EventId::new("evt_a"),
                EventId::new("evt_b"),
                EventId::new("evt_c"),
            ],
            ..template
        };
        snapshot.sponsors = vec![newcomer, veteran];
        let draft = snapshot.my_events[0].clone();

        let strategy = fallback_strategy(&snapshot, &draft);
        let ranked: Vec<(&str, u8)> = strategy
            .sponsor_matches
            .iter()
            .map(|m| (m.sponsor_id.as_str(), m.fit_score))
            .collect();
        assert_eq!(ranked[0].0, "spn_vet");
        assert_eq!(ranked[1].0, "spn_new");
        assert_eq!(ranked[0].1, ranked[1].1);
    }
}
