//! CLI command definitions.

pub mod events;
pub mod health;
pub mod resources;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use standards_core::domain::EntityKind;

pub use resources::{parse_data, ListArgs};

/// CLI client for the standards API.
#[derive(Debug, Parser)]
#[command(name = "standards-client")]
#[command(about = "CLI client for the standards API", long_about = None)]
pub struct Cli {
    /// Server base URL.
    #[arg(long, env = "STANDARDS_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
///
/// `<RESOURCE>` accepts the kind name (`calibration_journal_item`) or its URL
/// segment (see `resources`).
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List records, optionally filtered, sorted and paged.
    List(ListArgs),
    /// Get a record by ID.
    Get {
        resource: EntityKind,
        id: Uuid,
    },
    /// Get a record with the records it references.
    Details {
        resource: EntityKind,
        id: Uuid,
    },
    /// Create a record.
    Create {
        resource: EntityKind,
        /// Record JSON, or @path to read it from a file.
        #[arg(long)]
        data: String,
    },
    /// Replace a record's data.
    Update {
        resource: EntityKind,
        id: Uuid,
        /// Record JSON, or @path to read it from a file.
        #[arg(long)]
        data: String,
    },
    /// Apply a JSON merge patch to a record.
    Patch {
        resource: EntityKind,
        id: Uuid,
        /// Patch JSON, or @path to read it from a file.
        #[arg(long)]
        data: String,
    },
    /// Delete a record.
    Delete {
        resource: EntityKind,
        id: Uuid,
    },
    /// List the resource kinds the server exposes.
    Resources,
    /// Watch real-time SSE events.
    Events(events::EventsCommand),
    /// Server health checks.
    Health(health::HealthCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_accepts_name_or_path() {
        let cli = Cli::try_parse_from([
            "standards-client",
            "get",
            "calibration_journal_item",
            "00000000-0000-0000-0000-000000000000",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Get {
                resource: EntityKind::CalibrationJournalItem,
                ..
            }
        ));

        let path = EntityKind::Room.path();
        let cli = Cli::try_parse_from(["standards-client", "list", path]).unwrap();
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.resource, EntityKind::Room);
    }

    #[test]
    fn test_unknown_resource_rejected() {
        assert!(Cli::try_parse_from(["standards-client", "list", "spaceships"]).is_err());
    }
}
