use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Every kind of record the service stores.
///
/// The snake_case name is used for storage, cache keys and events; the URL
/// segment is used for HTTP routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Department,
    Sector,
    Position,
    Category,
    Grade,
    Person,
    Housing,
    Floor,
    Room,
    Workplace,
    Quantity,
    Unit,
    Characteristic,
    Material,
    Standard,
    Service,
    CalibrationJournalItem,
    VerificationJournalItem,
}

impl EntityKind {
    pub const ALL: [EntityKind; 18] = [
        EntityKind::Department,
        EntityKind::Sector,
        EntityKind::Position,
        EntityKind::Category,
        EntityKind::Grade,
        EntityKind::Person,
        EntityKind::Housing,
        EntityKind::Floor,
        EntityKind::Room,
        EntityKind::Workplace,
        EntityKind::Quantity,
        EntityKind::Unit,
        EntityKind::Characteristic,
        EntityKind::Material,
        EntityKind::Standard,
        EntityKind::Service,
        EntityKind::CalibrationJournalItem,
        EntityKind::VerificationJournalItem,
    ];

    /// Storage name, e.g. `"calibration_journal_item"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Department => "department",
            EntityKind::Sector => "sector",
            EntityKind::Position => "position",
            EntityKind::Category => "category",
            EntityKind::Grade => "grade",
            EntityKind::Person => "person",
            EntityKind::Housing => "housing",
            EntityKind::Floor => "floor",
            EntityKind::Room => "room",
            EntityKind::Workplace => "workplace",
            EntityKind::Quantity => "quantity",
            EntityKind::Unit => "unit",
            EntityKind::Characteristic => "characteristic",
            EntityKind::Material => "material",
            EntityKind::Standard => "standard",
            EntityKind::Service => "service",
            EntityKind::CalibrationJournalItem => "calibration_journal_item",
            EntityKind::VerificationJournalItem => "verification_journal_item",
        }
    }

    /// URL segment under `/api`, e.g. `"calibration-journal"`.
    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::Department => "departments",
            EntityKind::Sector => "sectors",
            EntityKind::Position => "positions",
            EntityKind::Category => "categories",
            EntityKind::Grade => "grades",
            EntityKind::Person => "persons",
            EntityKind::Housing => "housings",
            EntityKind::Floor => "floors",
            EntityKind::Room => "rooms",
            EntityKind::Workplace => "workplaces",
            EntityKind::Quantity => "quantities",
            EntityKind::Unit => "units",
            EntityKind::Characteristic => "characteristics",
            EntityKind::Material => "materials",
            EntityKind::Standard => "standards",
            EntityKind::Service => "services",
            EntityKind::CalibrationJournalItem => "calibration-journal",
            EntityKind::VerificationJournalItem => "verification-journal",
        }
    }

    /// Name used in error messages, e.g. `"CalibrationJournalItem"`.
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Department => "Department",
            EntityKind::Sector => "Sector",
            EntityKind::Position => "Position",
            EntityKind::Category => "Category",
            EntityKind::Grade => "Grade",
            EntityKind::Person => "Person",
            EntityKind::Housing => "Housing",
            EntityKind::Floor => "Floor",
            EntityKind::Room => "Room",
            EntityKind::Workplace => "Workplace",
            EntityKind::Quantity => "Quantity",
            EntityKind::Unit => "Unit",
            EntityKind::Characteristic => "Characteristic",
            EntityKind::Material => "Material",
            EntityKind::Standard => "Standard",
            EntityKind::Service => "Service",
            EntityKind::CalibrationJournalItem => "CalibrationJournalItem",
            EntityKind::VerificationJournalItem => "VerificationJournalItem",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    /// Accepts either the storage name or the URL segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.path() == s)
            .ok_or_else(|| DomainError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_and_paths_are_unique() {
        let names: HashSet<_> = EntityKind::ALL.iter().map(|k| k.as_str()).collect();
        let paths: HashSet<_> = EntityKind::ALL.iter().map(|k| k.path()).collect();
        assert_eq!(names.len(), EntityKind::ALL.len());
        assert_eq!(paths.len(), EntityKind::ALL.len());
    }

    #[test]
    fn test_from_str_accepts_name_and_path() {
        assert_eq!(
            "calibration_journal_item".parse::<EntityKind>().unwrap(),
            EntityKind::CalibrationJournalItem
        );
        assert_eq!(
            "calibration-journal".parse::<EntityKind>().unwrap(),
            EntityKind::CalibrationJournalItem
        );
        assert_eq!("rooms".parse::<EntityKind>().unwrap(), EntityKind::Room);
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "spaceships".parse::<EntityKind>().unwrap_err();
        assert_eq!(err, DomainError::UnknownKind("spaceships".to_string()));
    }

    #[test]
    fn test_serde_uses_storage_name() {
        let json = serde_json::to_string(&EntityKind::VerificationJournalItem).unwrap();
        assert_eq!(json, "\"verification_journal_item\"");
        for kind in EntityKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
        }
    }
}
