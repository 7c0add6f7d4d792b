//! Hostel management API endpoints.
//!
//! - POST /api/hostels - Create a hostel (staff)
//! - GET /api/hostels - List hostels with optional filters
//! - GET /api/hostels/:id - Get a hostel
//! - PUT /api/hostels/:id - Update a hostel (staff)
//! - DELETE /api/hostels/:id - Delete an empty hostel (staff)
//! - GET /api/hostels/:id/occupancy - Occupancy report (staff)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthUser, RequireStaff};
use crate::clock::Clock;
use crate::error::{not_found, AllocationError, Result};
use crate::server::state::AppState;
use crate::store::DocumentStore;
use crate::types::{GenderPolicy, Hostel, HostelId, OccupancyReport};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a hostel.
#[derive(Debug, Deserialize)]
pub struct CreateHostelRequest {
    pub name: String,
    pub gender_policy: Option<GenderPolicy>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Request to update a hostel. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateHostelRequest {
    pub name: Option<String>,
    pub gender_policy: Option<GenderPolicy>,
    pub active: Option<bool>,
}

/// Query parameters for listing hostels.
#[derive(Debug, Deserialize)]
pub struct ListHostelsQuery {
    pub gender: Option<GenderPolicy>,
    pub active: Option<bool>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a hostel. Staff only.
pub async fn create_hostel<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Json(req): Json<CreateHostelRequest>,
) -> Result<(StatusCode, Json<Hostel>)> {
    if req.name.trim().is_empty() {
        return Err(AllocationError::Validation(
            "hostel name must not be empty".to_string(),
        ));
    }

    let now = state.clock.now();
    let hostel = Hostel {
        id: HostelId::new(),
        name: req.name,
        gender_policy: req.gender_policy,
        active: req.active,
        created_at: now,
        updated_at: now,
    };
    state.store.create_hostel(hostel.clone()).await?;
    tracing::info!(hostel_id = %hostel.id, name = %hostel.name, "hostel created");
    Ok((StatusCode::CREATED, Json(hostel)))
}

/// List hostels. Any authenticated caller.
pub async fn list_hostels<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _caller: AuthUser,
    Query(query): Query<ListHostelsQuery>,
) -> Result<Json<Vec<Hostel>>> {
    let hostels = state.store.list_hostels(query.gender, query.active).await?;
    Ok(Json(hostels))
}

/// Get a hostel. Any authenticated caller.
pub async fn get_hostel<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Hostel>> {
    let id = HostelId::from_uuid(id);
    let hostel = state
        .store
        .get_hostel(&id)
        .await?
        .ok_or_else(|| not_found("hostel", id))?;
    Ok(Json(hostel))
}

/// Update a hostel. Staff only.
pub async fn update_hostel<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateHostelRequest>,
) -> Result<Json<Hostel>> {
    let id = HostelId::from_uuid(id);
    let mut hostel = state
        .store
        .get_hostel(&id)
        .await?
        .ok_or_else(|| not_found("hostel", id))?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AllocationError::Validation(
                "hostel name must not be empty".to_string(),
            ));
        }
        hostel.name = name;
    }
    if let Some(policy) = req.gender_policy {
        hostel.gender_policy = Some(policy);
    }
    if let Some(active) = req.active {
        hostel.active = active;
    }
    hostel.updated_at = state.clock.now();

    if !state.store.update_hostel(hostel.clone()).await? {
        return Err(not_found("hostel", id));
    }
    Ok(Json(hostel))
}

/// Delete a hostel. Staff only; refused while any room still houses someone.
pub async fn delete_hostel<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let id = HostelId::from_uuid(id);
    let rooms = state.store.list_rooms_by_hostel(&id).await?;
    if rooms.iter().any(|room| room.occupied > 0) {
        return Err(AllocationError::Validation(
            "hostel still has occupied rooms".to_string(),
        ));
    }
    if !state.store.delete_hostel(&id).await? {
        return Err(not_found("hostel", id));
    }
    tracing::info!(hostel_id = %id, "hostel deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Occupancy report for one hostel. Staff only.
pub async fn hostel_occupancy<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<OccupancyReport>> {
    let id = HostelId::from_uuid(id);
    let report = state.coordinator.hostel_occupancy(&id).await?;
    Ok(Json(report))
}
