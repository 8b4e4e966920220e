use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::load::{LoadDraft, DEFAULT_CURRENCY};

/// Collects every problem with a payload so the caller sees them all at once.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.0.push(format!("{field} is required"));
        }
    }

    pub fn require<T: Copy>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.0.push(format!("{field} is required"));
        }
        value
    }

    pub fn require_positive(&mut self, field: &str, value: Option<f64>) -> Option<f64> {
        match value {
            None => {
                self.0.push(format!("{field} is required"));
                None
            }
            Some(v) if !v.is_finite() || v <= 0.0 => {
                self.0.push(format!("{field} must be > 0"));
                None
            }
            Some(v) => Some(v),
        }
    }

    pub fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.0.push(message.into());
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0.join(", ")))
        }
    }
}

/// A load draft with every required field present and checked.
#[derive(Debug, Clone)]
pub struct ValidLoad {
    pub origin: String,
    pub destination: String,
    pub cargo_type: String,
    pub weight_kg: f64,
    pub budget: f64,
    pub currency: String,
    pub pickup_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub equipment: Option<String>,
    pub notes: Option<String>,
}

pub fn validate_load(draft: LoadDraft) -> Result<ValidLoad, AppError> {
    let mut violations = Violations::new();

    violations.require_text("origin", &draft.origin);
    violations.require_text("destination", &draft.destination);
    violations.require_text("cargo_type", &draft.cargo_type);
    let weight_kg = violations.require_positive("weight_kg", draft.weight_kg);
    let budget = violations.require_positive("budget", draft.budget);
    let pickup_date = violations.require("pickup_date", draft.pickup_date);
    let delivery_date = violations.require("delivery_date", draft.delivery_date);

    if let (Some(pickup), Some(delivery)) = (pickup_date, delivery_date) {
        violations.check(
            delivery >= pickup,
            "delivery_date must not be before pickup_date",
        );
    }

    let currency = match draft.currency.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_CURRENCY.to_string(),
        Some(code) => {
            violations.check(
                code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()),
                "currency must be a 3-letter code",
            );
            code.to_ascii_uppercase()
        }
    };

    violations.finish()?;

    match (weight_kg, budget, pickup_date, delivery_date) {
        (Some(weight_kg), Some(budget), Some(pickup_date), Some(delivery_date)) => Ok(ValidLoad {
            origin: draft.origin.trim().to_string(),
            destination: draft.destination.trim().to_string(),
            cargo_type: draft.cargo_type.trim().to_string(),
            weight_kg,
            budget,
            currency,
            pickup_date,
            delivery_date,
            equipment: non_blank(draft.equipment),
            notes: non_blank(draft.notes),
        }),
        _ => Err(AppError::Internal("load validation lost a field".to_string())),
    }
}

/// Trims an optional free-text field, mapping blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
