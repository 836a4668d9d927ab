//! Counter Signals
//!
//! A server-rendered counter page: the count lives in a SQLite key-value
//! table, the page carries Datastar reactive attributes, and each increment
//! answers with a server-sent event that patches the client's signals.

#![forbid(unsafe_code)]

pub mod app;
pub mod core;
pub mod counter;
pub mod prelude;
pub mod server;
pub mod store;

pub use app::App;
