//! Webhook relay server internals, exposed as a library for tests.

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use state::AppState;
