use crate::error::ValidationError;
use crate::types::{
    BudgetRange, CreateEventInput, CreateMarketGapInput, CreateMyEventInput, CreateSponsorInput,
    CreateTaskInput, Demographics, GenderSplit, SponsorAssociation, SuccessMetrics,
    UpdateEventInput, UpdateMarketGapInput, UpdateMyEventInput, UpdateSponsorInput,
    UpdateTaskInput, Verification,
};

fn invalid<T>(message: impl Into<String>) -> Result<T, ValidationError> {
    Err(ValidationError::invalid(message))
}

pub fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return invalid(format!("{field} must not be empty"));
    }
    Ok(())
}

pub fn validate_amount(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return invalid(format!("{field} must be a non-negative number"));
    }
    Ok(())
}

pub fn validate_budget(budget: &BudgetRange) -> Result<(), ValidationError> {
    validate_amount("budget min", budget.min)?;
    validate_amount("budget max", budget.max)?;
    if budget.min > budget.max {
        return invalid("budget min must not exceed budget max");
    }
    if budget.currency.trim().is_empty() {
        return invalid("budget currency must not be empty");
    }
    Ok(())
}

pub fn validate_gender_split(split: &GenderSplit) -> Result<(), ValidationError> {
    if split.total() != 100 {
        return invalid(format!(
            "gender split must sum to 100 (got {})",
            split.total()
        ));
    }
    Ok(())
}

pub fn validate_demographics(demographics: &Demographics) -> Result<(), ValidationError> {
    validate_gender_split(&demographics.gender)?;
    if demographics.age_range.min > demographics.age_range.max {
        return invalid("age range min must not exceed max");
    }
    Ok(())
}

/// Severity and opportunity ratings live in `1..=10`.
pub fn validate_rating(field: &str, value: u8) -> Result<(), ValidationError> {
    if !(1..=10).contains(&value) {
        return invalid(format!("{field} must be between 1 and 10 (got {value})"));
    }
    Ok(())
}

pub fn validate_verification(verification: &Verification) -> Result<(), ValidationError> {
    if verification.confidence > 100 {
        return invalid("confidence must be between 0 and 100");
    }
    Ok(())
}

pub fn validate_success_metrics(metrics: &SuccessMetrics) -> Result<(), ValidationError> {
    validate_amount("roi", metrics.roi)?;
    if !(0.0..=10.0).contains(&metrics.satisfaction) {
        return invalid("satisfaction must be between 0 and 10");
    }
    Ok(())
}

pub fn validate_associations(associations: &[SponsorAssociation]) -> Result<(), ValidationError> {
    for association in associations {
        validate_name("sponsor id", association.sponsor_id.as_str())?;
        validate_amount("deal amount", association.deal_amount)?;
    }
    Ok(())
}

pub fn validate_create_event(input: &CreateEventInput) -> Result<(), ValidationError> {
    validate_name("event name", &input.name)?;
    if let (Some(start), Some(end)) = (input.date, input.end_date) {
        if end < start {
            return invalid("end date must not precede start date");
        }
    }
    validate_budget(&input.budget)?;
    validate_demographics(&input.demographics)?;
    validate_associations(&input.sponsors)?;
    validate_success_metrics(&input.success_metrics)?;
    validate_amount("media value", input.media_metrics.media_value)?;
    validate_verification(&input.verification)
}

pub fn validate_update_event(input: &UpdateEventInput) -> Result<(), ValidationError> {
    if let Some(name) = &input.name {
        validate_name("event name", name)?;
    }
    if let (Some(start), Some(end)) = (input.date, input.end_date) {
        if end < start {
            return invalid("end date must not precede start date");
        }
    }
    if let Some(budget) = &input.budget {
        validate_budget(budget)?;
    }
    if let Some(demographics) = &input.demographics {
        validate_demographics(demographics)?;
    }
    if let Some(sponsors) = &input.sponsors {
        validate_associations(sponsors)?;
    }
    if let Some(metrics) = &input.success_metrics {
        validate_success_metrics(metrics)?;
    }
    if let Some(verification) = &input.verification {
        validate_verification(verification)?;
    }
    Ok(())
}

pub fn validate_create_sponsor(input: &CreateSponsorInput) -> Result<(), ValidationError> {
    validate_name("sponsor name", &input.name)?;
    validate_amount("total sponsorship", input.total_sponsorship)?;
    validate_amount("average deal", input.average_deal)?;
    validate_amount("average roi", input.average_roi)
}

pub fn validate_update_sponsor(input: &UpdateSponsorInput) -> Result<(), ValidationError> {
    if let Some(name) = &input.name {
        validate_name("sponsor name", name)?;
    }
    for (field, value) in [
        ("total sponsorship", input.total_sponsorship),
        ("average deal", input.average_deal),
        ("average roi", input.average_roi),
    ] {
        if let Some(value) = value {
            validate_amount(field, value)?;
        }
    }
    Ok(())
}

pub fn validate_create_my_event(input: &CreateMyEventInput) -> Result<(), ValidationError> {
    validate_name("draft name", &input.name)?;
    validate_amount("budget goal", input.budget_goal)
}

pub fn validate_update_my_event(input: &UpdateMyEventInput) -> Result<(), ValidationError> {
    if let Some(name) = &input.name {
        validate_name("draft name", name)?;
    }
    if let Some(goal) = input.budget_goal {
        validate_amount("budget goal", goal)?;
    }
    Ok(())
}

pub fn validate_create_market_gap(input: &CreateMarketGapInput) -> Result<(), ValidationError> {
    validate_name("gap title", &input.title)?;
    validate_rating("severity", input.severity)?;
    validate_rating("opportunity", input.opportunity)?;
    if let Some(revenue) = input.potential_revenue {
        validate_amount("potential revenue", revenue)?;
    }
    Ok(())
}

pub fn validate_update_market_gap(input: &UpdateMarketGapInput) -> Result<(), ValidationError> {
    if let Some(title) = &input.title {
        validate_name("gap title", title)?;
    }
    if let Some(severity) = input.severity {
        validate_rating("severity", severity)?;
    }
    if let Some(opportunity) = input.opportunity {
        validate_rating("opportunity", opportunity)?;
    }
    if let Some(revenue) = input.potential_revenue {
        validate_amount("potential revenue", revenue)?;
    }
    Ok(())
}

pub fn validate_create_task(input: &CreateTaskInput) -> Result<(), ValidationError> {
    validate_name("task title", &input.title)
}

pub fn validate_update_task(input: &UpdateTaskInput) -> Result<(), ValidationError> {
    if let Some(title) = &input.title {
        validate_name("task title", title)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_order_is_enforced() {
        let ok = BudgetRange {
            min: 1_000_000.0,
            max: 5_000_000.0,
            currency: "IDR".to_string(),
        };
        assert!(validate_budget(&ok).is_ok());
        let swapped = BudgetRange {
            min: 5.0,
            max: 1.0,
            ..ok.clone()
        };
        assert!(validate_budget(&swapped).is_err());
        let negative = BudgetRange { min: -1.0, ..ok };
        assert!(validate_budget(&negative).is_err());
    }

    #[test]
    fn gender_split_must_total_100() {
        assert!(validate_gender_split(&GenderSplit::default()).is_ok());
        let off = GenderSplit {
            male: 60,
            female: 30,
            other: 0,
        };
        assert!(validate_gender_split(&off).is_err());
    }

    #[test]
    fn ratings_are_one_to_ten() {
        assert!(validate_rating("severity", 1).is_ok());
        assert!(validate_rating("severity", 10).is_ok());
        assert!(validate_rating("severity", 0).is_err());
        assert!(validate_rating("severity", 11).is_err());
    }

    #[test]
    fn create_event_rejects_blank_name_and_bad_dates() {
        let mut input = CreateEventInput {
            name: "  ".to_string(),
            ..CreateEventInput::default()
        };
        assert!(validate_create_event(&input).is_err());
        input.name = "Expo".to_string();
        assert!(validate_create_event(&input).is_ok());
        input.date = chrono::NaiveDate::from_ymd_opt(2026, 5, 2);
        input.end_date = chrono::NaiveDate::from_ymd_opt(2026, 5, 1);
        assert!(validate_create_event(&input).is_err());
    }

    #[test]
    fn confidence_above_100_is_rejected() {
        let verification = Verification {
            confidence: 101,
            ..Verification::default()
        };
        assert!(validate_verification(&verification).is_err());
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(validate_update_event(&UpdateEventInput::default()).is_ok());
        assert!(validate_update_market_gap(&UpdateMarketGapInput::default()).is_ok());
    }
}
