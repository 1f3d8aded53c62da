//! Sample registry used by `--seed`.
//!
//! Records go through the regular services, so they are validated and
//! produce domain events like any client write.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use standards_core::domain::{
    CalibrationJournalItem, Category, Characteristic, Department, Floor, Grade, Housing, Material,
    Person, Position, Quantity, Room, Sector, Service, ServiceType, Standard, Unit,
    VerificationJournalItem, Workplace,
};

use crate::state::AppState;

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("invalid date {year}-{month}-{day}"))
}

/// Creates one connected record of every kind.
pub async fn seed(state: &AppState) -> Result<()> {
    let department = state
        .service::<Department>()
        .create(Department::new("Metrology Department", "MD"))
        .await?;
    let sector = state
        .service::<Sector>()
        .create(Sector::new(
            "Electrical Measurements Laboratory",
            "EML",
            department.id,
        ))
        .await?;
    let position = state
        .service::<Position>()
        .create(Position {
            name: "Metrologist".to_string(),
        })
        .await?;
    let category = state
        .service::<Category>()
        .create(Category {
            name: "First category".to_string(),
        })
        .await?;
    let grade = state
        .service::<Grade>()
        .create(Grade {
            name: "Senior".to_string(),
        })
        .await?;

    let mut person = Person::new("Anna", "Sokolova", date(1985, 4, 12)?, position.id)
        .with_sector(sector.id);
    person.category_id = Some(category.id);
    person.grade_id = Some(grade.id);
    let person = state.service::<Person>().create(person).await?;

    let housing = state
        .service::<Housing>()
        .create(Housing::new("Main building", "MB", "12 Lab Street", 4))
        .await?;
    let floor = state
        .service::<Floor>()
        .create(Floor {
            housing_id: housing.id,
            number: 2,
        })
        .await?;
    let mut room = Room::new("Room 204", floor.id, 6.5, 4.0, 3.0);
    room.sector_id = Some(sector.id);
    let room = state.service::<Room>().create(room).await?;
    let workplace = state
        .service::<Workplace>()
        .create(Workplace {
            name: "Bench 1".to_string(),
            room_id: room.id,
            responsible_person_id: person.id,
        })
        .await?;

    let quantity = state
        .service::<Quantity>()
        .create(Quantity {
            name: "Electric resistance".to_string(),
        })
        .await?;
    let unit = state
        .service::<Unit>()
        .create(Unit {
            name: "Ohm".to_string(),
            symbol: "Ω".to_string(),
            quantity_id: quantity.id,
        })
        .await?;

    let mut standard = Standard::new("Resistance measure set", person.id);
    standard.workplace_id = Some(workplace.id);
    standard.calibration_interval_months = Some(12);
    standard.verification_interval_months = Some(24);
    let standard = state.service::<Standard>().create(standard).await?;

    state
        .service::<Characteristic>()
        .create(Characteristic {
            name: "Resistance range".to_string(),
            standard_id: standard.id,
            unit_id: unit.id,
            range_start: 0.001,
            range_end: 100_000.0,
            accuracy: 0.005,
        })
        .await?;
    let material = state
        .service::<Material>()
        .create(Material {
            name: "Contact cleaner".to_string(),
            unit_id: unit.id,
            comments: None,
        })
        .await?;
    state
        .service::<Service>()
        .create(Service {
            name: "Contact maintenance".to_string(),
            service_type: ServiceType::Maintenance,
            standard_id: standard.id,
            material_ids: vec![material.id],
            comments: None,
        })
        .await?;

    state
        .service::<CalibrationJournalItem>()
        .create(CalibrationJournalItem {
            standard_id: standard.id,
            performed_on: date(2024, 3, 1)?,
            valid_until: date(2025, 3, 1)?,
            certificate_number: "CAL-2024-0117".to_string(),
            performed_by: "Regional Metrology Center".to_string(),
            comments: None,
        })
        .await?;
    state
        .service::<VerificationJournalItem>()
        .create(VerificationJournalItem {
            standard_id: standard.id,
            performed_on: date(2024, 3, 2)?,
            valid_until: date(2026, 3, 2)?,
            certificate_number: "VER-2024-0042".to_string(),
            performed_by: "Regional Metrology Center".to_string(),
            passed: true,
            comments: None,
        })
        .await?;

    tracing::info!(
        kinds = standards_core::domain::EntityKind::ALL.len(),
        "Seeded sample records"
    );
    Ok(())
}
