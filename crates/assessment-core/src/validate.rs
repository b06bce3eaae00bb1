//! Snapshot validation.
//!
//! Turns a loosely typed intake payload into a [`FinancialSnapshot`]. The first
//! offending field (text fields first, then amounts in declaration order) is reported.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::types::FinancialSnapshot;

pub const DEFAULT_LANGUAGE: &str = "en";

const AMOUNT_FIELDS: [&str; 12] = [
    "revenue",
    "prior_revenue",
    "expenses",
    "cogs",
    "receivables",
    "payables",
    "inventory",
    "debt",
    "cash_on_hand",
    "monthly_burn",
    "tax_liability",
    "deductions",
];

/// A validated snapshot plus the language code exactly as requested.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedIntake {
    pub snapshot: FinancialSnapshot,
    pub language_code: String,
}

pub fn validate_intake(raw: &Value) -> Result<ValidatedIntake, ValidationError> {
    let fields = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let business_name = required_text(fields, "business_name")?;
    let industry = required_text(fields, "industry")?;
    let region = required_text(fields, "region")?;

    let mut amounts = [0.0; AMOUNT_FIELDS.len()];
    for (slot, field) in amounts.iter_mut().zip(AMOUNT_FIELDS) {
        *slot = required_amount(fields, field)?;
    }
    let [
        revenue,
        prior_revenue,
        expenses,
        cogs,
        receivables,
        payables,
        inventory,
        debt,
        cash_on_hand,
        monthly_burn,
        tax_liability,
        deductions,
    ] = amounts;

    let language_code = match fields.get("language") {
        None | Some(Value::Null) => DEFAULT_LANGUAGE.to_string(),
        Some(Value::String(code)) => code.trim().to_string(),
        Some(_) => return Err(ValidationError::NotText { field: "language" }),
    };

    Ok(ValidatedIntake {
        snapshot: FinancialSnapshot {
            business_name,
            industry,
            region,
            revenue,
            prior_revenue,
            expenses,
            cogs,
            receivables,
            payables,
            inventory,
            debt,
            cash_on_hand,
            monthly_burn,
            tax_liability,
            deductions,
        },
        language_code,
    })
}

fn required_text(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing { field }),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::Blank { field }),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(ValidationError::NotText { field }),
    }
}

fn required_amount(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, ValidationError> {
    let value = match fields.get(field) {
        None | Some(Value::Null) => return Err(ValidationError::Missing { field }),
        Some(Value::Number(n)) => n.as_f64().ok_or(ValidationError::NotNumeric { field })?,
        Some(_) => return Err(ValidationError::NotNumeric { field }),
    };
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}
