use crate::types::enums::ChatRole;
use crate::types::ids::ChatMessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}
