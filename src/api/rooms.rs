//! Room management API endpoints.
//!
//! - POST /api/rooms - Create a room (staff)
//! - GET /api/rooms - List rooms, optionally by hostel
//! - GET /api/rooms/:id - Get a room
//! - PUT /api/rooms/:id - Update room metadata (staff)
//! - DELETE /api/rooms/:id - Delete an empty room (staff)
//!
//! The `occupied` counter is owned by the allocation transaction; no request
//! body here can touch it.

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
use crate::types::{HostelId, Room, RoomId};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a room.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub hostel_id: Uuid,
    pub room_number: String,
    pub capacity: u32,
    pub floor: Option<i32>,
    pub block: Option<String>,
}

/// Request to update a room. `occupied` is not accepted here; it changes
/// only through allocation and cancellation.
#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    pub room_number: Option<String>,
    pub capacity: Option<u32>,
    pub floor: Option<i32>,
    pub block: Option<String>,
}

/// Query parameters for listing rooms.
#[derive(Debug, Deserialize)]
pub struct ListRoomsQuery {
    pub hostel_id: Option<Uuid>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a room in a hostel. Staff only.
pub async fn create_room<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>)> {
    if req.room_number.trim().is_empty() {
        return Err(AllocationError::Validation(
            "room number must not be empty".to_string(),
        ));
    }
    if req.capacity == 0 {
        return Err(AllocationError::Validation(
            "room capacity must be at least 1".to_string(),
        ));
    }

    let hostel_id = HostelId::from_uuid(req.hostel_id);
    state
        .store
        .get_hostel(&hostel_id)
        .await?
        .ok_or_else(|| not_found("hostel", hostel_id))?;

    let rooms = state.store.list_rooms_by_hostel(&hostel_id).await?;
    if rooms.iter().any(|room| room.room_number == req.room_number) {
        return Err(AllocationError::Validation(format!(
            "room {} already exists in this hostel",
            req.room_number
        )));
    }

    let now = state.clock.now();
    let room = Room {
        id: RoomId::new(),
        hostel_id,
        room_number: req.room_number,
        capacity: req.capacity,
        occupied: 0,
        floor: req.floor,
        block: req.block,
        created_at: now,
        updated_at: now,
    };
    state.store.create_room(room.clone()).await?;
    tracing::info!(room_id = %room.id, hostel_id = %hostel_id, room_number = %room.room_number, "room created");
    Ok((StatusCode::CREATED, Json(room)))
}

/// List rooms, optionally restricted to one hostel. Any authenticated caller.
pub async fn list_rooms<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _caller: AuthUser,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<Vec<Room>>> {
    let rooms = match query.hostel_id {
        Some(hostel_id) => {
            state
                .store
                .list_rooms_by_hostel(&HostelId::from_uuid(hostel_id))
                .await?
        }
        None => state.store.list_rooms().await?,
    };
    Ok(Json(rooms))
}

/// Get a room. Any authenticated caller.
pub async fn get_room<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Room>> {
    let id = RoomId::from_uuid(id);
    let room = state
        .store
        .get_room(&id)
        .await?
        .ok_or_else(|| not_found("room", id))?;
    Ok(Json(room))
}

/// Update room metadata. Staff only.
///
/// Shrinking capacity below current occupancy is refused; beds in use cannot
/// be defined away.
pub async fn update_room<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoomRequest>,
) -> Result<Json<Room>> {
    let id = RoomId::from_uuid(id);
    let mut room = state
        .store
        .get_room(&id)
        .await?
        .ok_or_else(|| not_found("room", id))?;

    if let Some(room_number) = req.room_number {
        if room_number.trim().is_empty() {
            return Err(AllocationError::Validation(
                "room number must not be empty".to_string(),
            ));
        }
        room.room_number = room_number;
    }
    if let Some(capacity) = req.capacity {
        if capacity < room.occupied {
            return Err(AllocationError::Validation(format!(
                "capacity {capacity} is below current occupancy {}",
                room.occupied
            )));
        }
        room.capacity = capacity;
    }
    if let Some(floor) = req.floor {
        room.floor = Some(floor);
    }
    if let Some(block) = req.block {
        room.block = Some(block);
    }
    room.updated_at = state.clock.now();

    if !state.store.update_room(room.clone()).await? {
        return Err(not_found("room", id));
    }
    Ok(Json(room))
}

/// Delete a room. Staff only; refused while occupied.
pub async fn delete_room<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let id = RoomId::from_uuid(id);
    let room = state
        .store
        .get_room(&id)
        .await?
        .ok_or_else(|| not_found("room", id))?;
    if room.occupied > 0 {
        return Err(AllocationError::Validation(
            "room is still occupied".to_string(),
        ));
    }
    if !state.store.delete_room(&id).await? {
        return Err(not_found("room", id));
    }
    tracing::info!(room_id = %id, "room deleted");
    Ok(StatusCode::NO_CONTENT)
}
