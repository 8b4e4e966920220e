use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "PKR";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Available,
    Booked,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub id: Uuid,
    pub shipper_id: Uuid,
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
    pub status: LoadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a shipper supplies when posting a load. Every field is optional on
/// the wire so that missing values surface as validation errors instead of
/// deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadDraft {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub cargo_type: String,
    pub weight_kg: Option<f64>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub equipment: Option<String>,
    pub notes: Option<String>,
}

/// Partial edit of an existing load.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadPatch {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub cargo_type: Option<String>,
    pub weight_kg: Option<f64>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub equipment: Option<String>,
    pub notes: Option<String>,
}

impl Load {
    pub fn to_draft(&self) -> LoadDraft {
        LoadDraft {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            cargo_type: self.cargo_type.clone(),
            weight_kg: Some(self.weight_kg),
            budget: Some(self.budget),
            currency: Some(self.currency.clone()),
            pickup_date: Some(self.pickup_date),
            delivery_date: Some(self.delivery_date),
            equipment: self.equipment.clone(),
            notes: self.notes.clone(),
        }
    }
}

impl LoadDraft {
    pub fn apply(mut self, patch: LoadPatch) -> Self {
        if let Some(origin) = patch.origin {
            self.origin = origin;
        }
        if let Some(destination) = patch.destination {
            self.destination = destination;
        }
        if let Some(cargo_type) = patch.cargo_type {
            self.cargo_type = cargo_type;
        }
        if patch.weight_kg.is_some() {
            self.weight_kg = patch.weight_kg;
        }
        if patch.budget.is_some() {
            self.budget = patch.budget;
        }
        if patch.currency.is_some() {
            self.currency = patch.currency;
        }
        if patch.pickup_date.is_some() {
            self.pickup_date = patch.pickup_date;
        }
        if patch.delivery_date.is_some() {
            self.delivery_date = patch.delivery_date;
        }
        if patch.equipment.is_some() {
            self.equipment = patch.equipment;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
        self
    }
}
