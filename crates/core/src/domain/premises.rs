use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind, ValidationErrors, Validator};

/// A building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Housing {
    pub name: String,
    pub short_name: String,
    pub address: String,
    pub floors_count: i32,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_string")]
    pub comments: Option<String>,
}

impl Housing {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        address: impl Into<String>,
        floors_count: i32,
    ) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            address: address.into(),
            floors_count,
            comments: None,
        }
    }
}

impl Entity for Housing {
    const KIND: EntityKind = EntityKind::Housing;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("name", &self.name, 1, 100)
            .length("short_name", &self.short_name, 1, 20)
            .length("address", &self.address, 1, 250)
            .range("floors_count", self.floors_count, 1, 100)
            .max_length("comments", self.comments.as_deref(), 1000)
            .finish()
    }
}

/// A floor of a housing. Negative numbers are basement levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub housing_id: Uuid,
    pub number: i32,
}

impl Entity for Floor {
    const KIND: EntityKind = EntityKind::Floor;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .range("number", self.number, -10, 100)
            .finish()
    }
}

/// A room on a floor, optionally assigned to a sector. Dimensions in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub floor_id: Uuid,
    #[serde(default)]
    pub sector_id: Option<Uuid>,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_string")]
    pub comments: Option<String>,
}

impl Room {
    pub fn new(name: impl Into<String>, floor_id: Uuid, length: f64, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            floor_id,
            sector_id: None,
            length,
            width,
            height,
            comments: None,
        }
    }

    pub fn area(&self) -> f64 {
        self.length * self.width
    }
}

impl Entity for Room {
    const KIND: EntityKind = EntityKind::Room;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("name", &self.name, 1, 100)
            .positive("length", self.length)
            .positive("width", self.width)
            .positive("height", self.height)
            .max_length("comments", self.comments.as_deref(), 1000)
            .finish()
    }
}

/// A workplace inside a room with a responsible person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workplace {
    pub name: String,
    pub room_id: Uuid,
    pub responsible_person_id: Uuid,
}

impl Entity for Workplace {
    const KIND: EntityKind = EntityKind::Workplace;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().length("name", &self.name, 1, 100).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_housing_floor_count_range() {
        assert!(Housing::new("Main", "M", "1 Main St", 1).validate().is_ok());
        let errors = Housing::new("Main", "M", "1 Main St", 0)
            .validate()
            .unwrap_err();
        assert_eq!(errors.errors[0].field, "floors_count");
    }

    #[test]
    fn test_floor_allows_basement() {
        let floor = Floor {
            housing_id: Uuid::nil(),
            number: -1,
        };
        assert!(floor.validate().is_ok());
        let floor = Floor {
            housing_id: Uuid::nil(),
            number: -11,
        };
        assert!(floor.validate().is_err());
    }

    #[test]
    fn test_room_dimensions_must_be_positive() {
        let errors = Room::new("101", Uuid::nil(), 0.0, -1.0, 3.0)
            .validate()
            .unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["length", "width"]);
    }

    #[test]
    fn test_room_area() {
        assert_eq!(Room::new("101", Uuid::nil(), 5.0, 4.0, 3.0).area(), 20.0);
    }
}
