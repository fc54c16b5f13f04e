// src/handlers/streams.rs

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{stream, Stream};
use serde::Serialize;
use std::{convert::Infallible, time::Duration};
use tokio::sync::watch;

/// Transforma um `watch` em SSE: o valor atual sai na conexão e depois um
/// evento por mudança. O stream termina quando o emissor some.
pub fn watch_events<T, P, F>(
    rx: watch::Receiver<T>,
    event_name: &'static str,
    project: F,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Send + Sync + 'static,
    P: Serialize,
    F: Fn(&T) -> P + Send + 'static,
{
    let events = stream::unfold((rx, true, project), move |(mut rx, first, project)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let payload = project(&rx.borrow_and_update());
        let event = Event::default()
            .event(event_name)
            .json_data(&payload)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Some((Ok(event), (rx, false, project)))
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
