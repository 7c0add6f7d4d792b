//! User management API endpoints.
//!
//! - POST /api/users - Create a user (admin)
//! - GET /api/users - List users, optionally by role (staff)
//! - GET /api/users/:id - Get a user (self or staff)
//! - PUT /api/users/:id - Update a user's profile (self or staff)
//! - DELETE /api/users/:id - Delete a user (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthUser, RequireAdmin, RequireStaff};
use crate::clock::Clock;
use crate::error::{not_found, AllocationError, Result};
use crate::server::state::AppState;
use crate::store::DocumentStore;
use crate::types::{Gender, Role, User, UserId};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub gender: Gender,
}

/// Request to update a user's profile.
///
/// Role changes are not a profile edit; an admin recreates the account
/// instead.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a user. Admin only.
pub async fn create_user<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _admin: RequireAdmin,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    if req.email.trim().is_empty() {
        return Err(AllocationError::Validation("email must not be empty".to_string()));
    }
    if state.store.get_user_by_email(&req.email).await?.is_some() {
        return Err(AllocationError::Validation(format!(
            "a user with email {} already exists",
            req.email
        )));
    }

    let now = state.clock.now();
    let user = User {
        id: UserId::new(),
        email: req.email,
        full_name: req.full_name,
        role: req.role,
        gender: req.gender,
        created_at: now,
        updated_at: now,
    };
    state.store.create_user(user.clone()).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users, optionally filtered by role. Staff only.
pub async fn list_users<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _staff: RequireStaff,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>> {
    let users = state.store.list_users(query.role).await?;
    Ok(Json(users))
}

/// Get a user. Callers may read themselves; staff may read anyone.
pub async fn get_user<S: DocumentStore>(
    State(state): State<AppState<S>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>> {
    let id = UserId::from_uuid(id);
    if principal.id != id && !principal.is_staff() {
        return Err(AllocationError::Forbidden(
            "cannot read another user's profile".to_string(),
        ));
    }
    let user = state
        .store
        .get_user(&id)
        .await?
        .ok_or_else(|| not_found("user", id))?;
    Ok(Json(user))
}

/// Update a user's profile. Callers may update themselves; staff may update
/// anyone.
pub async fn update_user<S: DocumentStore>(
    State(state): State<AppState<S>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let id = UserId::from_uuid(id);
    if principal.id != id && !principal.is_staff() {
        return Err(AllocationError::Forbidden(
            "cannot update another user's profile".to_string(),
        ));
    }
    let mut user = state
        .store
        .get_user(&id)
        .await?
        .ok_or_else(|| not_found("user", id))?;

    if let Some(email) = req.email {
        if email.trim().is_empty() {
            return Err(AllocationError::Validation("email must not be empty".to_string()));
        }
        if let Some(existing) = state.store.get_user_by_email(&email).await? {
            if existing.id != user.id {
                return Err(AllocationError::Validation(format!(
                    "a user with email {email} already exists"
                )));
            }
        }
        user.email = email;
    }
    if let Some(full_name) = req.full_name {
        user.full_name = full_name;
    }
    user.updated_at = state.clock.now();

    if !state.store.update_user(user.clone()).await? {
        return Err(not_found("user", id));
    }
    Ok(Json(user))
}

/// Delete a user. Admin only.
pub async fn delete_user<S: DocumentStore>(
    State(state): State<AppState<S>>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let id = UserId::from_uuid(id);
    if !state.store.delete_user(&id).await? {
        return Err(not_found("user", id));
    }
    tracing::info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
