use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Entity, EntityKind, ValidationErrors, Validator};

/// A calibration performed on a standard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationJournalItem {
    pub standard_id: Uuid,
    pub performed_on: NaiveDate,
    pub valid_until: NaiveDate,
    pub certificate_number: String,
    pub performed_by: String,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_string")]
    pub comments: Option<String>,
}

impl Entity for CalibrationJournalItem {
    const KIND: EntityKind = EntityKind::CalibrationJournalItem;

    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_journal_item(
            self.performed_on,
            self.valid_until,
            &self.certificate_number,
            &self.performed_by,
            self.comments.as_deref(),
        )
    }
}

/// A verification performed on a standard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationJournalItem {
    pub standard_id: Uuid,
    pub performed_on: NaiveDate,
    pub valid_until: NaiveDate,
    pub certificate_number: String,
    pub performed_by: String,
    pub passed: bool,
    #[serde(default, deserialize_with = "crate::serde::deserialize_optional_string")]
    pub comments: Option<String>,
}

impl Entity for VerificationJournalItem {
    const KIND: EntityKind = EntityKind::VerificationJournalItem;

    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_journal_item(
            self.performed_on,
            self.valid_until,
            &self.certificate_number,
            &self.performed_by,
            self.comments.as_deref(),
        )
    }
}

fn validate_journal_item(
    performed_on: NaiveDate,
    valid_until: NaiveDate,
    certificate_number: &str,
    performed_by: &str,
    comments: Option<&str>,
) -> Result<(), ValidationErrors> {
    Validator::new()
        .ensure(
            "valid_until",
            valid_until > performed_on,
            "must be after performed_on",
        )
        .length("certificate_number", certificate_number, 1, 50)
        .length("performed_by", performed_by, 1, 200)
        .max_length("comments", comments, 1000)
        .finish()
}
