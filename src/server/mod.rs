//! HTTP server wiring: shared state, router construction, health probe.

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
