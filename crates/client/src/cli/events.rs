//! Events CLI commands.

use clap::{Parser, Subcommand};

use standards_core::domain::EntityKind;

/// Events commands.
#[derive(Debug, Parser)]
pub struct EventsCommand {
    #[command(subcommand)]
    pub action: EventsAction,
}

/// Available events actions.
#[derive(Debug, Subcommand)]
pub enum EventsAction {
    /// Watch real-time SSE events.
    Watch {
        /// Only events of this resource kind.
        #[arg(long)]
        kind: Option<EntityKind>,
        /// Resume from event ID.
        #[arg(long)]
        last_event_id: Option<u64>,
    },
}
