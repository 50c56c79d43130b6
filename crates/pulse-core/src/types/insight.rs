use crate::types::ids::SponsorId;
use serde::{Deserialize, Serialize};

/// Where a generated payload came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightOrigin {
    #[default]
    Service,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAnalysisReport {
    pub summary: String,
    /// Overall rating, 0-100.
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub sponsor_insights: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub origin: InsightOrigin,
}

impl EventAnalysisReport {
    /// Markdown rendering stored in `Event::report`.
    pub fn render(&self) -> String {
        let mut out = format!("## Summary\n\n{}\n\nOverall score: {}/100\n", self.summary, self.score);
        for (heading, items) in [
            ("Strengths", &self.strengths),
            ("Weaknesses", &self.weaknesses),
            ("Sponsor insights", &self.sponsor_insights),
            ("Recommendations", &self.recommendations),
        ] {
            if items.is_empty() {
                continue;
            }
            out.push_str(&format!("\n## {heading}\n\n"));
            for item in items {
                out.push_str(&format!("- {item}\n"));
            }
        }
        if self.origin == InsightOrigin::Fallback {
            out.push_str("\n_Generated offline; the reasoning service was unavailable._\n");
        }
        out
    }
}

/// Recommendation bundle attached to a strategy draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipStrategy {
    pub market_gaps: Vec<GapInsight>,
    pub sponsor_matches: Vec<SponsorMatch>,
    #[serde(default)]
    pub origin: InsightOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapInsight {
    pub title: String,
    pub description: String,
    pub severity: u8,
    pub opportunity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorMatch {
    pub sponsor_id: SponsorId,
    pub sponsor_name: String,
    /// 0-100
    pub fit_score: u8,
    pub estimated_roi: f64,
    pub reasoning: String,
}
