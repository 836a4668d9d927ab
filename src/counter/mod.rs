//! The counter page and its increment action.

use axum::Router;
use axum::routing::get;

use crate::server::AppState;

pub mod handlers;
pub mod service;
pub mod signals;
pub mod sse;
pub mod view;

pub use service::{COUNT_KEY, Counter, CounterConfig, IncrementMode};
pub use signals::{CountPatch, Signals};
pub use view::ViewConfig;

/// Routes for `/count`, with and without the trailing slash.
pub fn routes() -> Router<AppState> {
    let count = || get(handlers::show).put(handlers::increment);
    Router::new()
        .route("/count", count())
        .route("/count/", count())
}
