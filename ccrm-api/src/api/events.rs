//! Server-Sent Events stream of CRM events

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::AppState;

/// GET /api/events
///
/// Sends `ConnectionStatus: connected` first, then one SSE event per bus
/// event, named after its type with the JSON body as data. A client that
/// falls behind skips the missed events and keeps streaming.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected");
    let mut rx = state.events.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let name = event.event_type();
                    match Event::default().event(name).json_data(&event) {
                        Ok(sse_event) => yield Ok(sse_event),
                        Err(e) => warn!("SSE: failed to encode {}: {}", name, e),
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("SSE: client lagged, {} events skipped", missed);
                }
                Err(RecvError::Closed) => {
                    debug!("SSE: event bus closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/api/events", get(event_stream))
}
