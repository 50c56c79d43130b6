//! Schema validation for the two payloads the reasoning service returns.
//! Parse-valid JSON that does not fit the schema is an error, never a
//! partially filled payload.

use crate::ai::extract::parse_json;
use crate::analytics::clamp_fit_score;
use crate::error::AiError;
use crate::types::{
    EventAnalysisReport, GapInsight, InsightOrigin, Sponsor, SponsorMatch, SponsorshipStrategy,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisWire {
    summary: String,
    score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default, alias = "sponsor_insights")]
    sponsor_insights: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrategyWire {
    #[serde(default, alias = "market_gaps")]
    market_gaps: Vec<GapWire>,
    #[serde(default, alias = "sponsor_matches")]
    sponsor_matches: Vec<MatchWire>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GapWire {
    title: String,
    #[serde(default)]
    description: String,
    severity: f64,
    opportunity: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchWire {
    #[serde(default, alias = "sponsor_id")]
    sponsor_id: Option<String>,
    #[serde(alias = "sponsor_name", alias = "name")]
    sponsor_name: String,
    #[serde(alias = "fit_score")]
    fit_score: f64,
    #[serde(default, alias = "estimated_roi")]
    estimated_roi: f64,
    #[serde(default)]
    reasoning: String,
}

fn schema_error(message: impl Into<String>) -> AiError {
    AiError::Schema {
        message: message.into(),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AiError> {
    serde_json::from_value(value).map_err(|err| schema_error(err.to_string()))
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn rating(field: &str, value: f64) -> Result<u8, AiError> {
    if !value.is_finite() {
        return Err(schema_error(format!("{field} is not a number")));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = value.round().clamp(1.0, 10.0) as u8;
    Ok(rounded)
}

pub fn parse_event_analysis(reply: &str) -> Result<EventAnalysisReport, AiError> {
    let value = parse_json(reply)?;
    if !value.is_object() {
        return Err(schema_error("analysis must be a JSON object"));
    }
    let wire: AnalysisWire = decode(value)?;
    if wire.summary.trim().is_empty() {
        return Err(schema_error("summary is empty"));
    }
    if !wire.score.is_finite() {
        return Err(schema_error("score is not a number"));
    }
    Ok(EventAnalysisReport {
        summary: wire.summary.trim().to_string(),
        score: clamp_fit_score(wire.score),
        strengths: clean(wire.strengths),
        weaknesses: clean(wire.weaknesses),
        sponsor_insights: clean(wire.sponsor_insights),
        recommendations: clean(wire.recommendations),
        origin: InsightOrigin::Service,
    })
}

/// A bare array is read as the sponsor-match list. Matches naming sponsors
/// that are not in `sponsors` are dropped.
pub fn parse_strategy(reply: &str, sponsors: &[Sponsor]) -> Result<SponsorshipStrategy, AiError> {
    let wire: StrategyWire = match parse_json(reply)? {
        Value::Array(items) => StrategyWire {
            market_gaps: Vec::new(),
            sponsor_matches: decode(Value::Array(items))?,
        },
        value @ Value::Object(_) => decode(value)?,
        _ => return Err(schema_error("strategy must be an object or array")),
    };
    if wire.market_gaps.is_empty() && wire.sponsor_matches.is_empty() {
        return Err(schema_error("strategy is empty"));
    }

    let mut market_gaps = Vec::with_capacity(wire.market_gaps.len());
    for gap in wire.market_gaps {
        if gap.title.trim().is_empty() {
            return Err(schema_error("market gap title is empty"));
        }
        market_gaps.push(GapInsight {
            title: gap.title.trim().to_string(),
            description: gap.description,
            severity: rating("severity", gap.severity)?,
            opportunity: rating("opportunity", gap.opportunity)?,
        });
    }

    let mut sponsor_matches = Vec::with_capacity(wire.sponsor_matches.len());
    for matched in wire.sponsor_matches {
        if !matched.fit_score.is_finite() {
            return Err(schema_error("fitScore is not a number"));
        }
        let sponsor = sponsors.iter().find(|sponsor| {
            matched
                .sponsor_id
                .as_deref()
                .is_some_and(|id| sponsor.id.as_str() == id)
                || sponsor.name.eq_ignore_ascii_case(matched.sponsor_name.trim())
        });
        let Some(sponsor) = sponsor else {
            continue;
        };
        sponsor_matches.push(SponsorMatch {
            sponsor_id: sponsor.id.clone(),
            sponsor_name: sponsor.name.clone(),
            fit_score: clamp_fit_score(matched.fit_score),
            estimated_roi: if matched.estimated_roi.is_finite() {
                matched.estimated_roi.max(0.0)
            } else {
                0.0
            },
            reasoning: matched.reasoning.trim().to_string(),
        });
    }

    Ok(SponsorshipStrategy {
        market_gaps,
        sponsor_matches,
        origin: InsightOrigin::Service,
    })
}
