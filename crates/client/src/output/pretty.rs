//! Pretty output formatting.

use serde_json::{Map, Value};

use standards_core::domain::EntityKind;
use standards_core::query::Page;

use crate::client::events::ReceivedEvent;
use crate::client::health::HealthReport;
use crate::client::resources::ResourceInfo;

/// Fields printed in the record header instead of the body.
const HEADER_FIELDS: [&str; 3] = ["id", "name", "title"];

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn title(record: &Map<String, Value>) -> String {
    ["name", "title", "code", "number"]
        .iter()
        .find_map(|field| record.get(*field).filter(|v| !v.is_null()))
        .map(scalar)
        .unwrap_or_else(|| "(unnamed)".to_string())
}

/// Format a record for display.
pub fn format_record(record: &Value) -> String {
    let Value::Object(fields) = record else {
        return scalar(record);
    };

    let mut output = title(fields);
    if let Some(id) = fields.get("id") {
        output.push_str(&format!("\n  ID: {}", scalar(id)));
    }
    for (key, value) in fields {
        if HEADER_FIELDS.contains(&key.as_str()) {
            continue;
        }
        output.push_str(&format!("\n  {}: {}", key, scalar(value)));
    }
    output
}

/// Format records for display.
pub fn format_records(kind: EntityKind, records: &[Value]) -> String {
    if records.is_empty() {
        return format!("No {} records found.", kind.display_name());
    }
    let mut output = format!("{} ({})\n", kind.display_name().to_uppercase(), records.len());
    output.push_str(&"-".repeat(40));
    for record in records {
        output.push_str(&format!("\n{}", format_record(record)));
        output.push('\n');
    }
    output
}

/// Format a search result page for display.
pub fn format_page(kind: EntityKind, page: &Page<Value>) -> String {
    let mut output = format_records(kind, &page.items);
    output.push_str(&format!(
        "\nPage {} of {} ({} total)",
        page.page, page.total_pages, page.total
    ));
    output
}

/// Format the resource catalogue for display.
pub fn format_resources(resources: &[ResourceInfo]) -> String {
    let mut output = format!("RESOURCES ({})\n", resources.len());
    output.push_str(&"-".repeat(40));
    for resource in resources {
        output.push_str(&format!(
            "\n{:<28} /api/{}",
            resource.kind.as_str(),
            resource.path
        ));
    }
    output
}

/// Format a received event as a single line.
pub fn format_event(event: &ReceivedEvent) -> String {
    let id = event
        .id
        .map(|id| format!("#{id} "))
        .unwrap_or_default();
    format!(
        "{}{} {} {}",
        id,
        event.event.occurred_at.format("%Y-%m-%d %H:%M:%S"),
        event.event.event_type(),
        event.event.entity_id
    )
}

/// Format the health report for display.
pub fn format_health(report: &HealthReport) -> String {
    let mut output = format!(
        "Health:\n  Storage: {}\n  Cache: {}",
        scalar(&report.backends["storage"]),
        scalar(&report.backends["cache"])
    );
    if let Value::Object(stats) = &report.cache {
        for (key, value) in stats {
            output.push_str(&format!("\n  cache.{}: {}", key, scalar(value)));
        }
    }
    let pending = report
        .outbox_pending
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unavailable".to_string());
    output.push_str(&format!(
        "\n  Outbox pending: {}\n  Event history: {}",
        pending, report.event_history_size
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use standards_core::events::DomainEvent;
    use uuid::Uuid;

    #[test]
    fn test_format_record_header_then_fields() {
        let record = json!({"id": "r1", "name": "Lab", "length": 5.5, "sector_id": null});

        let output = format_record(&record);

        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("Lab"));
        assert_eq!(lines.next(), Some("  ID: r1"));
        assert!(output.contains("  length: 5.5"));
        assert!(output.contains("  sector_id: -"));
        assert!(!output.contains("  name:"));
    }

    #[test]
    fn test_format_record_without_name() {
        let output = format_record(&json!({"id": "r1", "value": 3}));
        assert!(output.starts_with("(unnamed)"));
    }

    #[test]
    fn test_format_empty_records() {
        assert_eq!(
            format_records(EntityKind::Room, &[]),
            format!("No {} records found.", EntityKind::Room.display_name())
        );
    }

    #[test]
    fn test_format_page_footer() {
        let page = Page {
            items: vec![json!({"id": "r1", "name": "Lab"})],
            total: 11,
            page: 2,
            page_size: 10,
            total_pages: 2,
        };
        assert!(format_page(EntityKind::Room, &page).ends_with("Page 2 of 2 (11 total)"));
    }

    #[test]
    fn test_format_event() {
        let event = ReceivedEvent {
            id: Some(7),
            event: DomainEvent::deleted(EntityKind::Room, Uuid::nil()),
        };
        let output = format_event(&event);
        assert!(output.starts_with("#7 "));
        assert!(output.contains("room.deleted"));
    }
}
