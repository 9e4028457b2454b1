//! Server-Sent Events stream
//!
//! New clients first receive the current snapshot, then every event
//! published on the engine's bus. Lagging clients skip what they missed.

use crate::api::server::AppContext;
use ambient_common::PlayerEvent;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /events
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    // Subscribe before reading the snapshot so nothing falls between them
    let mut events = BroadcastStream::new(ctx.engine.events().subscribe());
    let initial = PlayerEvent::SnapshotChanged {
        snapshot: ctx.engine.snapshot(),
        timestamp: Utc::now(),
    };

    let stream = async_stream::stream! {
        if let Some(event) = to_sse(&initial) {
            yield Ok(event);
        }

        while let Some(result) = events.next().await {
            match result {
                Ok(event) => {
                    if let Some(event) = to_sse(&event) {
                        yield Ok(event);
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!("SSE client lagged, skipped {} events", skipped);
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_sse(event: &PlayerEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            None
        }
    }
}
