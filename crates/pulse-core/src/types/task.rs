use crate::types::enums::{TaskPriority, TaskStatus};
use crate::types::ids::{EventId, ProfileId, SponsorId, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: String,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<ProfileId>,
    pub created_by: Option<ProfileId>,
    pub link: Option<TaskLink>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TaskLink {
    Event(EventId),
    Sponsor(SponsorId),
}
