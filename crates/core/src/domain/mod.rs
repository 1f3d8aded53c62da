mod entity;
mod error;
mod journals;
mod kind;
mod metrology;
mod organization;
mod premises;
mod references;
mod validation;

pub use entity::{merge_patch, Entity, Record};
pub use error::DomainError;
pub use journals::{CalibrationJournalItem, VerificationJournalItem};
pub use kind::EntityKind;
pub use metrology::{Characteristic, Material, Quantity, Service, ServiceType, Standard, Unit};
pub use organization::{Category, Department, Grade, Person, Position, Sector};
pub use premises::{Floor, Housing, Room, Workplace};
pub use references::{
    dependents_of, reference_fields, references_of, Reference, ReferenceField, REFERENCES,
};
pub use validation::{FieldError, ValidationErrors, Validator};
