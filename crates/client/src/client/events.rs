//! SSE events operations.

use serde::{Deserialize, Serialize};

use standards_core::domain::EntityKind;
use standards_core::events::DomainEvent;

use super::StandardsClient;
use crate::error::{ClientError, Result};

/// A domain event as received from the stream, with its SSE id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedEvent {
    pub id: Option<u64>,
    pub event: DomainEvent,
}

impl StandardsClient {
    /// Watch SSE domain events, optionally of one kind.
    /// Returns a stream of events.
    pub async fn watch_events(
        &self,
        kind: Option<EntityKind>,
        last_event_id: Option<u64>,
    ) -> Result<impl futures_core::Stream<Item = Result<ReceivedEvent>>> {
        let mut query = Vec::new();
        if let Some(kind) = kind {
            query.push(format!("kind={}", kind.as_str()));
        }
        if let Some(id) = last_event_id {
            query.push(format!("last_event_id={id}"));
        }
        let mut url = self.url("/api/events");
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        let response = self
            .client
            .get(&url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::ServerError {
                status: response.status().as_u16(),
                message: "Failed to connect to SSE endpoint".to_string(),
            });
        }

        let stream = async_stream::stream! {
            use tokio_stream::StreamExt;

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));

                        // Parse complete SSE events from buffer
                        while let Some(pos) = buffer.find("\n\n") {
                            let event_str = buffer[..pos].to_string();
                            buffer = buffer[pos + 2..].to_string();

                            match parse_sse_event(&event_str) {
                                Ok(Some(event)) => yield Ok(event),
                                Ok(None) => {}
                                Err(e) => yield Err(e),
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(ClientError::Connection(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(stream)
    }
}

/// Parse an SSE event from a string. Comment-only blocks (keep-alives) yield `None`.
fn parse_sse_event(event_str: &str) -> Result<Option<ReceivedEvent>> {
    let mut id = None;
    let mut data: Option<String> = None;

    for line in event_str.lines() {
        if let Some(value) = line.strip_prefix("id:") {
            id = value.trim().parse().ok();
        } else if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            match &mut data {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }

    let Some(data) = data else {
        return Ok(None);
    };
    let event = serde_json::from_str(&data).map_err(|e| ClientError::SseParse(e.to_string()))?;
    Ok(Some(ReceivedEvent { id, event }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_parse_event_with_id() {
        let event = DomainEvent::deleted(EntityKind::Room, Uuid::nil());
        let block = format!(
            "id: 7\nevent: room.deleted\ndata: {}",
            serde_json::to_string(&event).unwrap()
        );

        let parsed = parse_sse_event(&block).unwrap().unwrap();

        assert_eq!(parsed.id, Some(7));
        assert_eq!(parsed.event, event);
    }

    #[test]
    fn test_keep_alive_is_skipped() {
        assert!(parse_sse_event(":").unwrap().is_none());
    }

    #[test]
    fn test_invalid_data_is_an_error() {
        assert!(matches!(
            parse_sse_event("data: {not json"),
            Err(ClientError::SseParse(_))
        ));
    }
}
