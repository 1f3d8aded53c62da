//! SSE stream of domain events.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio::sync::broadcast;

use standards_core::domain::EntityKind;

use crate::history::StoredEvent;
use crate::state::AppState;

/// Query parameters for the SSE events endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Only stream events of this kind.
    pub kind: Option<EntityKind>,
    /// Last event ID received (for reconnection catch-up).
    pub last_event_id: Option<u64>,
}

fn to_sse(stored: &StoredEvent) -> Event {
    let data = serde_json::to_string(&stored.event).unwrap_or_default();
    Event::default()
        .id(stored.id.to_string())
        .event(stored.event.event_type())
        .data(data)
}

/// Whether events after `last_event_id` were already dropped from a history
/// whose oldest event is `oldest`.
fn missed_history(last_event_id: u64, oldest: u64) -> bool {
    last_event_id > 0 && last_event_id.saturating_add(1) < oldest
}

/// SSE endpoint for domain events (GET /api/events).
///
/// Replays the history after `last_event_id` (or the `Last-Event-ID`
/// header), then streams new events until the server shuts down.
pub async fn events_sse(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let kind = query.kind;
    let last_event_id = query
        .last_event_id
        .or_else(|| {
            headers
                .get("last-event-id")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        })
        .unwrap_or(0);

    let oldest = state.history.oldest_id();
    if missed_history(last_event_id, oldest) {
        tracing::debug!(last_event_id, oldest, "Client missed events no longer in history");
    }

    // Subscribe before replaying so nothing falls between the two.
    let mut live_rx = state.history.subscribe();
    let mut shutdown_rx = state.subscribe_shutdown();

    let stream = async_stream::stream! {
        let mut last_sent = last_event_id;

        for stored in state.history.since(kind, last_event_id) {
            last_sent = stored.id;
            yield Ok(to_sse(&stored));
        }

        loop {
            tokio::select! {
                result = live_rx.recv() => {
                    match result {
                        Ok(stored) => {
                            if stored.id <= last_sent || kind.is_some_and(|k| k != stored.event.kind) {
                                continue;
                            }
                            last_sent = stored.id;
                            yield Ok(to_sse(&stored));
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(lagged = n, "SSE client lagged, replaying history");
                            for stored in state.history.since(kind, last_sent) {
                                last_sent = stored.id;
                                yield Ok(to_sse(&stored));
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("SSE session received shutdown signal");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
