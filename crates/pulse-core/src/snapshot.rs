use crate::backend::Row;
use crate::mapper::{
    map_activities, map_events, map_market_gap, map_my_event, map_profile, map_sponsors, map_task,
};
use crate::types::{
    Activity, Event, EventId, MarketGap, MarketGapId, MyEvent, MyEventId, Profile, ProfileId,
    Sponsor, SponsorAssociation, SponsorId, Task, TaskId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why the snapshot is being served from bundled fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No backend configured.
    Unconfigured,
    /// A backend is configured but the load failed.
    RemoteFailure { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotSource {
    Remote,
    Fixture(FallbackReason),
}

/// Unmapped rows for every collection, as read in one load.
#[derive(Debug, Clone, Default)]
pub struct RawCollections {
    pub events: Vec<Row>,
    pub event_sponsors: Vec<Row>,
    pub sponsors: Vec<Row>,
    pub my_events: Vec<Row>,
    pub market_gaps: Vec<Row>,
    pub activities: Vec<Row>,
    pub tasks: Vec<Row>,
    pub profiles: Vec<Row>,
}

/// Complete, immutable view of all entities at one point in time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub events: Vec<Event>,
    pub sponsors: Vec<Sponsor>,
    pub my_events: Vec<MyEvent>,
    pub market_gaps: Vec<MarketGap>,
    /// Newest first, capped.
    pub activities: Vec<Activity>,
    pub tasks: Vec<Task>,
    pub profiles: Vec<Profile>,
    pub source: SnapshotSource,
    pub loaded_at: DateTime<Utc>,
    /// Incremented on every committed load; 0 means nothing has loaded yet.
    pub generation: u64,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            sponsors: Vec::new(),
            my_events: Vec::new(),
            market_gaps: Vec::new(),
            activities: Vec::new(),
            tasks: Vec::new(),
            profiles: Vec::new(),
            source: SnapshotSource::Fixture(FallbackReason::Unconfigured),
            loaded_at: Utc::now(),
            generation: 0,
        }
    }

    /// Maps every collection. Events are mapped first so sponsor
    /// back-references derive from them.
    pub fn from_raw(raw: &RawCollections, source: SnapshotSource, generation: u64) -> Self {
        let events = map_events(&raw.events, &raw.event_sponsors);
        let sponsors = map_sponsors(&raw.sponsors, &events);
        Self {
            sponsors,
            events,
            my_events: raw.my_events.iter().filter_map(map_my_event).collect(),
            market_gaps: raw.market_gaps.iter().filter_map(map_market_gap).collect(),
            activities: map_activities(&raw.activities),
            tasks: raw.tasks.iter().filter_map(map_task).collect(),
            profiles: raw.profiles.iter().filter_map(map_profile).collect(),
            source,
            loaded_at: Utc::now(),
            generation,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.source, SnapshotSource::Fixture(_))
    }

    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|event| &event.id == id)
    }

    pub fn sponsor(&self, id: &SponsorId) -> Option<&Sponsor> {
        self.sponsors.iter().find(|sponsor| &sponsor.id == id)
    }

    pub fn my_event(&self, id: &MyEventId) -> Option<&MyEvent> {
        self.my_events.iter().find(|draft| &draft.id == id)
    }

    pub fn market_gap(&self, id: &MarketGapId) -> Option<&MarketGap> {
        self.market_gaps.iter().find(|gap| &gap.id == id)
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn profile(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|profile| &profile.id == id)
    }

    /// Joins an event's associations to sponsors, in association order.
    /// Associations naming a sponsor that is not in the snapshot are skipped.
    pub fn resolve_sponsors<'a>(
        &'a self,
        event: &'a Event,
    ) -> Vec<(&'a SponsorAssociation, &'a Sponsor)> {
        event
            .sponsors
            .iter()
            .filter_map(|association| {
                self.sponsor(&association.sponsor_id)
                    .map(|sponsor| (association, sponsor))
            })
            .collect()
    }
}
