use crate::types::enums::{ActivityType, EntityType};
use crate::types::ids::{ActivityId, ProfileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit record. Written once by the mutation layer, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub activity_type: ActivityType,
    pub entity_type: EntityType,
    pub entity_name: String,
    pub at: DateTime<Utc>,
    pub actor_id: Option<ProfileId>,
}

/// Most recent entries kept for display.
pub const ACTIVITY_RETENTION: usize = 50;
