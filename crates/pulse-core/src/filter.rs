//! Pure filtered views over a snapshot. Inputs are never mutated; every call
//! returns freshly cloned entities.

use crate::types::{Event, EventFilter, EventSort, Sponsor, SponsorFilter, SponsorSort};
use std::cmp::Ordering;

fn matches_query(query: Option<&str>, fields: &[&str]) -> bool {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return true;
    };
    let needle = query.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn in_set<T: PartialEq>(set: &[T], value: &T) -> bool {
    set.is_empty() || set.contains(value)
}

pub fn event_matches(event: &Event, filter: &EventFilter) -> bool {
    let attendance = event.attendance.best();
    matches_query(
        filter.search_query.as_deref(),
        &[event.name.as_str(), event.organizer.as_str()],
    ) && filter
        .date_from
        .is_none_or(|from| event.date.is_some_and(|date| date >= from))
        && filter
            .date_to
            .is_none_or(|to| event.date.is_some_and(|date| date <= to))
        && in_set(&filter.categories, &event.category)
        && in_set(&filter.statuses, &event.status)
        && filter.min_attendance.is_none_or(|min| attendance >= min)
        && filter.max_attendance.is_none_or(|max| attendance <= max)
        && event.budget.overlaps(filter.min_budget, filter.max_budget)
        && (filter.sponsor_tiers.is_empty()
            || event
                .sponsors
                .iter()
                .any(|association| filter.sponsor_tiers.contains(&association.tier)))
}

pub fn filter_events(events: &[Event], filter: &EventFilter) -> Vec<Event> {
    let mut matched: Vec<Event> = events
        .iter()
        .filter(|event| event_matches(event, filter))
        .cloned()
        .collect();
    sort_events(&mut matched, filter.sort);
    matched
}

/// Undated events sort last in both date orders.
pub fn sort_events(events: &mut [Event], sort: EventSort) {
    match sort {
        EventSort::DateAsc => events.sort_by(|a, b| match (a.date, b.date) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        EventSort::DateDesc => events.sort_by(|a, b| match (a.date, b.date) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        EventSort::Name => events.sort_by_key(|event| event.name.to_lowercase()),
        EventSort::Attendance => {
            events.sort_by(|a, b| b.attendance.best().cmp(&a.attendance.best()));
        }
    }
}

pub fn sponsor_matches(sponsor: &Sponsor, filter: &SponsorFilter) -> bool {
    matches_query(
        filter.search_query.as_deref(),
        &[sponsor.name.as_str(), sponsor.description.as_str()],
    ) && in_set(&filter.industries, &sponsor.industry)
        && (filter.tiers.is_empty()
            || sponsor
                .preferred_tiers
                .iter()
                .any(|tier| filter.tiers.contains(tier)))
        && filter
            .min_total_sponsorship
            .is_none_or(|min| sponsor.total_sponsorship >= min)
}

pub fn filter_sponsors(sponsors: &[Sponsor], filter: &SponsorFilter) -> Vec<Sponsor> {
    let mut matched: Vec<Sponsor> = sponsors
        .iter()
        .filter(|sponsor| sponsor_matches(sponsor, filter))
        .cloned()
        .collect();
    match filter.sort {
        SponsorSort::Name => matched.sort_by_key(|sponsor| sponsor.name.to_lowercase()),
        SponsorSort::TotalSponsorship => matched.sort_by(|a, b| {
            b.total_sponsorship
                .partial_cmp(&a.total_sponsorship)
                .unwrap_or(Ordering::Equal)
        }),
        SponsorSort::EventsCount => {
            matched.sort_by(|a, b| b.events_sponsored.len().cmp(&a.events_sponsored.len()));
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureDataset;
    use crate::snapshot::{FallbackReason, Snapshot};
    use crate::types::{EventCategory, EventStatus, Industry, SponsorTier};
    use chrono::NaiveDate;

    fn snapshot() -> Snapshot {
        FixtureDataset::bundled().snapshot(FallbackReason::Unconfigured, 1)
    }

    fn names(events: &[Event]) -> Vec<&str> {
        events.iter().map(|event| event.name.as_str()).collect()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let snapshot = snapshot();
        let all = filter_events(&snapshot.events, &EventFilter::default());
        assert_eq!(all.len(), snapshot.events.len());
        let sponsors = filter_sponsors(&snapshot.sponsors, &SponsorFilter::default());
        assert_eq!(sponsors.len(), snapshot.sponsors.len());
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_organizer() {
        let snapshot = snapshot();
        let by_name = filter_events(
            &snapshot.events,
            &EventFilter {
                search_query: Some("JAZZ".to_string()),
                ..EventFilter::default()
            },
        );
        assert_eq!(names(&by_name), vec!["Harbour Jazz Night"]);

        let by_organizer = filter_events(
            &snapshot.events,
            &EventFilter {
                search_query: Some("jatim expo".to_string()),
                ..EventFilter::default()
            },
        );
        assert_eq!(names(&by_organizer), vec!["Surabaya Auto Expo"]);

        // Location is not a searchable field.
        let by_location = filter_events(
            &snapshot.events,
            &EventFilter {
                search_query: Some("Ancol".to_string()),
                ..EventFilter::default()
            },
        );
        assert!(by_location.is_empty());
    }

    #[test]
    fn sponsor_search_covers_description() {
        let snapshot = snapshot();
        let found = filter_sponsors(
            &snapshot.sponsors,
            &SponsorFilter {
                search_query: Some("coffee".to_string()),
                ..SponsorFilter::default()
            },
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Kopi Kita");
    }

    #[test]
    fn criteria_compose_conjunctively() {
        let snapshot = snapshot();
        let filter = EventFilter {
            statuses: vec![EventStatus::Upcoming],
            categories: vec![EventCategory::Conference, EventCategory::Culinary],
            ..EventFilter::default()
        };
        assert_eq!(
            names(&filter_events(&snapshot.events, &filter)),
            vec!["Nusantara Tech Summit"]
        );
    }

    #[test]
    fn date_attendance_and_budget_ranges_apply() {
        let snapshot = snapshot();
        let filter = EventFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 1, 1),
            min_attendance: Some(8_000),
            max_budget: Some(3_000_000_000.0),
            ..EventFilter::default()
        };
        assert_eq!(
            names(&filter_events(&snapshot.events, &filter)),
            vec!["Bali Coastal Marathon"]
        );
    }

    #[test]
    fn sponsor_tier_filter_uses_associations() {
        let snapshot = snapshot();
        let filter = EventFilter {
            sponsor_tiers: vec![SponsorTier::Platinum],
            ..EventFilter::default()
        };
        assert_eq!(
            names(&filter_events(&snapshot.events, &filter)),
            vec!["Nusantara Tech Summit"]
        );
    }

    #[test]
    fn sorting_orders_results() {
        let snapshot = snapshot();
        let by_attendance = filter_events(
            &snapshot.events,
            &EventFilter {
                sort: EventSort::Attendance,
                ..EventFilter::default()
            },
        );
        assert_eq!(by_attendance[0].name, "Surabaya Auto Expo");

        let by_date_desc = filter_events(
            &snapshot.events,
            &EventFilter {
                sort: EventSort::DateDesc,
                ..EventFilter::default()
            },
        );
        assert_eq!(by_date_desc[0].name, "Bali Coastal Marathon");

        let by_total = filter_sponsors(
            &snapshot.sponsors,
            &SponsorFilter {
                industries: vec![Industry::Finance, Industry::Retail, Industry::Automotive],
                sort: SponsorSort::TotalSponsorship,
                ..SponsorFilter::default()
            },
        );
        let sponsor_names: Vec<_> = by_total.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            sponsor_names,
            vec!["Garuda Motors", "Archipelago Bank", "Segar Retail"]
        );
    }

    #[test]
    fn filtering_is_pure_and_repeatable() {
        let snapshot = snapshot();
        let before = snapshot.events.clone();
        let filter = EventFilter {
            search_query: Some("a".to_string()),
            sort: EventSort::Name,
            ..EventFilter::default()
        };
        let first = filter_events(&snapshot.events, &filter);
        let second = filter_events(&snapshot.events, &filter);
        assert_eq!(first, second);
        assert_ne!(first.as_ptr(), second.as_ptr());
        assert_eq!(snapshot.events, before);
    }
}
