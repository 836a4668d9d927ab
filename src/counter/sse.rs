//! Datastar server-sent events.

use std::convert::Infallible;

use axum::response::sse::{Event, Sse};
use futures::future;
use futures::stream::{self, Stream};
use serde::Serialize;

use crate::core::error::{Error, Result};

/// Event type the Datastar runtime merges into its signals.
pub const MERGE_SIGNALS_EVENT: &str = "datastar-merge-signals";

/// Build a `datastar-merge-signals` event carrying `signals` as compact JSON.
pub fn merge_signals<T: Serialize>(signals: &T) -> Result<Event> {
    let json = serde_json::to_string(signals).map_err(Error::Serialize)?;
    Ok(Event::default()
        .event(MERGE_SIGNALS_EVENT)
        .data(format!("signals {json}")))
}

/// A response stream that sends `event` and then ends.
pub fn single_event(
    event: Event,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    Sse::new(stream::once(future::ready(Ok::<_, Infallible>(event))))
}
