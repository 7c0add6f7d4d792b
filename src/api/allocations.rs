//! Allocation API endpoints.
//!
//! - POST /api/allocations - Allocate a bed (staff)
//! - GET /api/allocations - List allocations with filters (staff; students
//!   see their own)
//! - GET /api/allocations/mine - The caller's own allocations
//! - GET /api/allocations/:id - Get an allocation (owner or staff)
//! - GET /api/allocations/room/:room_id - Allocations for one room (staff)
//! - PATCH /api/allocations/:id/end - Cancel an allocation (staff)
//! - DELETE /api/allocations/:id - Alias for cancel (staff)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthUser, RequireStaff};
use crate::error::{AllocationError, Result};
use crate::server::state::AppState;
use crate::services::AllocateCommand;
use crate::store::{AllocationFilter, DocumentStore};
use crate::types::{Allocation, AllocationId, AllocationStatus, HostelId, RoomId, UserId};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to allocate a bed to a student.
#[derive(Debug, Deserialize)]
pub struct CreateAllocationRequest {
    pub student_id: Uuid,
    pub hostel_id: Uuid,
    pub room_id: Uuid,
    pub bed_label: String,
    pub semester: String,
}

/// Query parameters for listing allocations.
#[derive(Debug, Deserialize)]
pub struct ListAllocationsQuery {
    pub student_id: Option<Uuid>,
    pub hostel_id: Option<Uuid>,
    pub semester: Option<String>,
    pub status: Option<AllocationStatus>,
}

impl ListAllocationsQuery {
    fn into_filter(self) -> AllocationFilter {
        AllocationFilter {
            student_id: self.student_id.map(UserId::from_uuid),
            hostel_id: self.hostel_id.map(HostelId::from_uuid),
            semester: self.semester,
            status: self.status,
            ..AllocationFilter::default()
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Allocate a bed. Staff only.
pub async fn create_allocation<S: DocumentStore>(
    State(state): State<AppState<S>>,
    staff: RequireStaff,
    Json(req): Json<CreateAllocationRequest>,
) -> Result<(StatusCode, Json<Allocation>)> {
    if req.semester.trim().is_empty() {
        return Err(AllocationError::Validation(
            "semester must not be empty".to_string(),
        ));
    }
    let allocation = state
        .coordinator
        .allocate(AllocateCommand {
            student_id: UserId::from_uuid(req.student_id),
            hostel_id: HostelId::from_uuid(req.hostel_id),
            room_id: RoomId::from_uuid(req.room_id),
            bed_label: req.bed_label,
            semester: req.semester,
            allocated_by: staff.0.id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}

/// List allocations. Staff may filter freely; students are pinned to their
/// own records regardless of the query.
pub async fn list_allocations<S: DocumentStore>(
    State(state): State<AppState<S>>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListAllocationsQuery>,
) -> Result<Json<Vec<Allocation>>> {
    let mut filter = query.into_filter();
    if !principal.is_staff() {
        filter.student_id = Some(principal.id);
    }
    let allocations = state.coordinator.list_allocations(filter).await?;
    Ok(Json(allocations))
}

/// The caller's own allocations.
pub async fn my_allocations<S: DocumentStore>(
    State(state): State<AppState<S>>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<Allocation>>> {
    let allocations = state
        .coordinator
        .allocations_for_student(principal.id)
        .await?;
    Ok(Json(allocations))
}

/// Get one allocation. Owner or staff.
pub async fn get_allocation<S: DocumentStore>(
    State(state): State<AppState<S>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Allocation>> {
    let allocation = state
        .coordinator
        .get_allocation(&AllocationId::from_uuid(id))
        .await?;
    if allocation.student_id != principal.id && !principal.is_staff() {
        return Err(AllocationError::Forbidden(
            "cannot read another student's allocation".to_string(),
        ));
    }
    Ok(Json(allocation))
}

/// Allocations for one room. Staff only.
pub async fn room_allocations<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<Allocation>>> {
    let allocations = state
        .coordinator
        .allocations_for_room(RoomId::from_uuid(room_id))
        .await?;
    Ok(Json(allocations))
}

/// Cancel an allocation and release its bed. Staff only.
pub async fn end_allocation<S: DocumentStore>(
    State(state): State<AppState<S>>,
    staff: RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<Allocation>> {
    let allocation = state
        .coordinator
        .cancel(&AllocationId::from_uuid(id), staff.0.id)
        .await?;
    Ok(Json(allocation))
}

/// DELETE alias for cancellation. Allocation records are never erased; the
/// audit trail survives as a cancelled allocation.
pub async fn delete_allocation<S: DocumentStore>(
    State(state): State<AppState<S>>,
    staff: RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .coordinator
        .cancel(&AllocationId::from_uuid(id), staff.0.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
