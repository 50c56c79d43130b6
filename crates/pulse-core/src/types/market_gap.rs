use crate::types::enums::GapType;
use crate::types::ids::MarketGapId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketGap {
    pub id: MarketGapId,
    pub gap_type: GapType,
    pub title: String,
    pub description: String,
    /// 1-10
    pub severity: u8,
    /// 1-10
    pub opportunity: u8,
    pub affected_area: String,
    pub recommendations: Vec<String>,
    pub potential_revenue: Option<f64>,
    pub identified_at: Option<DateTime<Utc>>,
}
