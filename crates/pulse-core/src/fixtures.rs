//! Bundled sample dataset, served whenever the backend is unconfigured or
//! unreachable.

use crate::backend::Row;
use crate::snapshot::{FallbackReason, RawCollections, Snapshot, SnapshotSource};
use pulse_events::Collection;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

const BUNDLED: &str = include_str!("../fixtures/dataset.json");

static DATASET: LazyLock<FixtureDataset> = LazyLock::new(|| {
    serde_json::from_str(BUNDLED).unwrap_or_else(|err| {
        tracing::error!(error = %err, "bundled fixture dataset is malformed");
        FixtureDataset::default()
    })
});

/// Rows per collection, in the backend's raw shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureDataset {
    pub version: String,
    #[serde(default)]
    collections: BTreeMap<Collection, Vec<Row>>,
}

impl FixtureDataset {
    pub fn bundled() -> &'static FixtureDataset {
        &DATASET
    }

    pub fn rows(&self, collection: Collection) -> &[Row] {
        self.collections
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn raw(&self) -> RawCollections {
        RawCollections {
            events: self.rows(Collection::Events).to_vec(),
            event_sponsors: self.rows(Collection::EventSponsors).to_vec(),
            sponsors: self.rows(Collection::Sponsors).to_vec(),
            my_events: self.rows(Collection::MyEvents).to_vec(),
            market_gaps: self.rows(Collection::MarketGaps).to_vec(),
            activities: self.rows(Collection::Activities).to_vec(),
            tasks: self.rows(Collection::Tasks).to_vec(),
            profiles: self.rows(Collection::Profiles).to_vec(),
        }
    }

    pub fn snapshot(&self, reason: FallbackReason, generation: u64) -> Snapshot {
        Snapshot::from_raw(&self.raw(), SnapshotSource::Fixture(reason), generation)
    }
}
