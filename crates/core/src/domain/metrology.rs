use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind, ValidationErrors, Validator};

/// A physical quantity (length, mass, temperature, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub name: String,
}

impl Entity for Quantity {
    const KIND: EntityKind = EntityKind::Quantity;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().length("name", &self.name, 1, 100).finish()
    }
}

/// A unit of measurement of a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub symbol: String,
    pub quantity_id: Uuid,
}

impl Entity for Unit {
    const KIND: EntityKind = EntityKind::Unit;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("name", &self.name, 1, 100)
            .length("symbol", &self.symbol, 1, 20)
            .finish()
    }
}

/// A measuring range of a standard with its accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristic {
    pub name: String,
    pub standard_id: Uuid,
    pub unit_id: Uuid,
    pub range_start: f64,
    pub range_end: f64,
    pub accuracy: f64,
}

impl Entity for Characteristic {
    const KIND: EntityKind = EntityKind::Characteristic;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("name", &self.name, 1, 100)
            .ensure(
                "range_end",
                self.range_start.is_finite()
                    && self.range_end.is_finite()
                    && self.range_start < self.range_end,
                "must be greater than range_start",
            )
            .positive("accuracy", self.accuracy)
            .finish()
    }
}

/// A consumable used by services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub unit_id: Uuid,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_string")]
    pub comments: Option<String>,
}

impl Entity for Material {
    const KIND: EntityKind = EntityKind::Material;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("name", &self.name, 1, 100)
            .max_length("comments", self.comments.as_deref(), 1000)
            .finish()
    }
}

/// A measurement standard kept at a workplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
    pub name: String,
    pub responsible_person_id: Uuid,
    #[serde(default)]
    pub workplace_id: Option<Uuid>,
    #[serde(default)]
    pub calibration_interval_months: Option<i32>,
    #[serde(default)]
    pub verification_interval_months: Option<i32>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_string")]
    pub comments: Option<String>,
}

impl Standard {
    pub fn new(name: impl Into<String>, responsible_person_id: Uuid) -> Self {
        Self {
            name: name.into(),
            responsible_person_id,
            workplace_id: None,
            calibration_interval_months: None,
            verification_interval_months: None,
            comments: None,
        }
    }
}

impl Entity for Standard {
    const KIND: EntityKind = EntityKind::Standard;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut validator = Validator::new();
        validator
            .length("name", &self.name, 1, 200)
            .max_length("comments", self.comments.as_deref(), 1000);
        if let Some(months) = self.calibration_interval_months {
            validator.range("calibration_interval_months", months, 1, 120);
        }
        if let Some(months) = self.verification_interval_months {
            validator.range("verification_interval_months", months, 1, 120);
        }
        validator.finish()
    }
}

/// What a service does to a standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Maintenance,
    Repair,
    Calibration,
    Verification,
}

/// A service operation on a standard and the materials it consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub service_type: ServiceType,
    pub standard_id: Uuid,
    #[serde(default)]
    pub material_ids: Vec<Uuid>,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_string")]
    pub comments: Option<String>,
}

impl Entity for Service {
    const KIND: EntityKind = EntityKind::Service;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let unique: HashSet<_> = self.material_ids.iter().collect();
        Validator::new()
            .length("name", &self.name, 1, 100)
            .ensure(
                "material_ids",
                unique.len() == self.material_ids.len(),
                "must not contain duplicates",
            )
            .max_length("comments", self.comments.as_deref(), 1000)
            .finish()
    }
}
