//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use super::health::health_check;
use super::state::AppState;
use crate::api::{allocations, applications, hostels, rooms, users};
use crate::store::DocumentStore;

/// Build the complete Axum router.
///
/// Handlers are generic over the store, so the turbofish pins them to the
/// concrete state type here. Everything under `/api` requires a bearer token;
/// `/health` does not.
pub fn build_router<S: DocumentStore>(state: AppState<S>) -> Router {
    let api_routes = Router::new()
        // User management
        .route("/users", post(users::create_user::<S>))
        .route("/users", get(users::list_users::<S>))
        .route("/users/:id", get(users::get_user::<S>))
        .route("/users/:id", put(users::update_user::<S>))
        .route("/users/:id", delete(users::delete_user::<S>))
        // Hostels
        .route("/hostels", post(hostels::create_hostel::<S>))
        .route("/hostels", get(hostels::list_hostels::<S>))
        .route("/hostels/:id", get(hostels::get_hostel::<S>))
        .route("/hostels/:id", put(hostels::update_hostel::<S>))
        .route("/hostels/:id", delete(hostels::delete_hostel::<S>))
        .route("/hostels/:id/occupancy", get(hostels::hostel_occupancy::<S>))
        // Rooms
        .route("/rooms", post(rooms::create_room::<S>))
        .route("/rooms", get(rooms::list_rooms::<S>))
        .route("/rooms/:id", get(rooms::get_room::<S>))
        .route("/rooms/:id", put(rooms::update_room::<S>))
        .route("/rooms/:id", delete(rooms::delete_room::<S>))
        // Applications
        .route("/applications", post(applications::submit_application::<S>))
        .route("/applications", get(applications::list_applications::<S>))
        .route("/applications/:id", get(applications::get_application::<S>))
        .route(
            "/applications/:id/review",
            patch(applications::review_application::<S>),
        )
        // Allocations
        .route("/allocations", post(allocations::create_allocation::<S>))
        .route("/allocations", get(allocations::list_allocations::<S>))
        .route("/allocations/mine", get(allocations::my_allocations::<S>))
        .route(
            "/allocations/room/:room_id",
            get(allocations::room_allocations::<S>),
        )
        .route("/allocations/:id", get(allocations::get_allocation::<S>))
        .route(
            "/allocations/:id/end",
            patch(allocations::end_allocation::<S>),
        )
        .route(
            "/allocations/:id",
            delete(allocations::delete_allocation::<S>),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .with_state(state)
}
