use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Named row collections exposed by the relational backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Events,
    Sponsors,
    EventSponsors,
    MyEvents,
    MarketGaps,
    Activities,
    Tasks,
    Profiles,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Events,
        Collection::Sponsors,
        Collection::EventSponsors,
        Collection::MyEvents,
        Collection::MarketGaps,
        Collection::Activities,
        Collection::Tasks,
        Collection::Profiles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Sponsors => "sponsors",
            Self::EventSponsors => "event_sponsors",
            Self::MyEvents => "my_events",
            Self::MarketGaps => "market_gaps",
            Self::Activities => "activities",
            Self::Tasks => "tasks",
            Self::Profiles => "profiles",
        }
    }

    /// Prefix used when the backend has to mint a row id itself.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Events => "evt_",
            Self::Sponsors => "spn_",
            Self::EventSponsors => "esp_",
            Self::MyEvents => "mye_",
            Self::MarketGaps => "gap_",
            Self::Activities => "act_",
            Self::Tasks => "tsk_",
            Self::Profiles => "usr_",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|collection| collection.as_str() == s)
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// "Something changed in collection X." Carries no row payload; receivers
/// re-read whatever they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub id: String,
    pub at: DateTime<Utc>,
    pub collection: Collection,
    pub kind: ChangeKind,
    pub row_id: Option<String>,
}

impl ChangeNotification {
    pub fn new(collection: Collection, kind: ChangeKind, row_id: Option<String>) -> Self {
        Self {
            id: format!("chg_{}", Ulid::new()),
            at: Utc::now(),
            collection,
            kind,
            row_id,
        }
    }
}
