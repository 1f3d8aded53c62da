use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind, ValidationErrors, Validator};

/// An organizational department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub name: String,
    pub short_name: String,
}

impl Department {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
        }
    }
}

impl Entity for Department {
    const KIND: EntityKind = EntityKind::Department;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("name", &self.name, 1, 100)
            .length("short_name", &self.short_name, 1, 20)
            .finish()
    }
}

/// A sector (laboratory) inside a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub short_name: String,
    pub department_id: Uuid,
}

impl Sector {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        department_id: Uuid,
    ) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            department_id,
        }
    }
}

impl Entity for Sector {
    const KIND: EntityKind = EntityKind::Sector;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("name", &self.name, 1, 100)
            .length("short_name", &self.short_name, 1, 20)
            .finish()
    }
}

/// Job title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub name: String,
}

impl Entity for Position {
    const KIND: EntityKind = EntityKind::Position;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().length("name", &self.name, 1, 100).finish()
    }
}

/// Qualification category of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().length("name", &self.name, 1, 100).finish()
    }
}

/// Academic or professional grade of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub name: String,
}

impl Entity for Grade {
    const KIND: EntityKind = EntityKind::Grade;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().length("name", &self.name, 1, 100).finish()
    }
}

/// An employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_string")]
    pub middle_name: Option<String>,
    pub birthday: NaiveDate,
    pub position_id: Uuid,
    #[serde(default)]
    pub sector_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub grade_id: Option<Uuid>,
}

impl Person {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthday: NaiveDate,
        position_id: Uuid,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            middle_name: None,
            birthday,
            position_id,
            sector_id: None,
            category_id: None,
            grade_id: None,
        }
    }

    pub fn with_sector(mut self, sector_id: Uuid) -> Self {
        self.sector_id = Some(sector_id);
        self
    }

    /// "Last F. M." as printed in journals.
    pub fn short_name(&self) -> String {
        let mut name = self.last_name.clone();
        for part in [Some(&self.first_name), self.middle_name.as_ref()]
            .into_iter()
            .flatten()
        {
            if let Some(initial) = part.chars().next() {
                name.push(' ');
                name.push(initial);
                name.push('.');
            }
        }
        name
    }
}

impl Entity for Person {
    const KIND: EntityKind = EntityKind::Person;

    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("first_name", &self.first_name, 1, 50)
            .length("last_name", &self.last_name, 1, 50)
            .max_length("middle_name", self.middle_name.as_deref(), 50)
            .ensure(
                "birthday",
                self.birthday.year() >= 1900,
                "must not be before 1900",
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_department_validation() {
        assert!(Department::new("Metrology", "MET").validate().is_ok());
        let errors = Department::new("", "").validate().unwrap_err();
        assert_eq!(errors.errors.len(), 2);
    }

    #[test]
    fn test_person_short_name() {
        let mut person = Person::new(
            "Ivan",
            "Petrov",
            NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            Uuid::nil(),
        );
        assert_eq!(person.short_name(), "Petrov I.");
        person.middle_name = Some("Sergeevich".to_string());
        assert_eq!(person.short_name(), "Petrov I. S.");
    }

    #[test]
    fn test_person_rejects_old_birthday() {
        let person = Person::new(
            "Ivan",
            "Petrov",
            NaiveDate::from_ymd_opt(1850, 1, 1).unwrap(),
            Uuid::nil(),
        );
        let errors = person.validate().unwrap_err();
        assert_eq!(errors.errors[0].field, "birthday");
    }

    #[test]
    fn test_person_optional_references_default_to_none() {
        let person: Person = serde_json::from_value(json!({
            "first_name": "Anna",
            "last_name": "Smirnova",
            "middle_name": "",
            "birthday": "1990-05-01",
            "position_id": "00000000-0000-0000-0000-000000000000"
        }))
        .unwrap();
        assert_eq!(person.middle_name, None);
        assert_eq!(person.sector_id, None);
        assert_eq!(person.grade_id, None);
    }
}
