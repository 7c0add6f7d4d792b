//! Accommodation application API endpoints.
//!
//! - POST /api/applications - Submit an application (student for self, or staff)
//! - GET /api/applications - List applications (staff; students see their own)
//! - GET /api/applications/:id - Get an application (owner or staff)
//! - PATCH /api/applications/:id/review - Approve or reject (staff)

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
use crate::services::ReviewDecision;
use crate::store::DocumentStore;
use crate::types::{Application, ApplicationId, ApplicationStatus, UserId};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to submit an application.
///
/// `student_id` defaults to the caller; only staff may submit on behalf of
/// another student.
#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub student_id: Option<Uuid>,
    pub semester: String,
}

/// Request to review a pending application.
#[derive(Debug, Deserialize)]
pub struct ReviewApplicationRequest {
    pub decision: ReviewDecision,
}

/// Query parameters for listing applications.
#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<ApplicationStatus>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit an application for a semester.
pub async fn submit_application<S: DocumentStore>(
    State(state): State<AppState<S>>,
    AuthUser(principal): AuthUser,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<(StatusCode, Json<Application>)> {
    if req.semester.trim().is_empty() {
        return Err(AllocationError::Validation(
            "semester must not be empty".to_string(),
        ));
    }

    let student_id = match req.student_id {
        Some(id) => {
            let id = UserId::from_uuid(id);
            if id != principal.id && !principal.is_staff() {
                return Err(AllocationError::Forbidden(
                    "cannot submit an application for another student".to_string(),
                ));
            }
            id
        }
        None => principal.id,
    };

    let application = state
        .applications
        .submit(student_id, req.semester)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// List applications. Staff see everything (optionally filtered by status);
/// students see only their own.
pub async fn list_applications<S: DocumentStore>(
    State(state): State<AppState<S>>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<Vec<Application>>> {
    let applications = if principal.is_staff() {
        state.applications.list(query.status).await?
    } else {
        let mut own = state.applications.list_for_student(&principal.id).await?;
        if let Some(status) = query.status {
            own.retain(|app| app.status == status);
        }
        own
    };
    Ok(Json(applications))
}

/// Get one application. Owner or staff.
pub async fn get_application<S: DocumentStore>(
    State(state): State<AppState<S>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>> {
    let application = state
        .applications
        .get(&ApplicationId::from_uuid(id))
        .await?;
    if application.student_id != principal.id && !principal.is_staff() {
        return Err(AllocationError::Forbidden(
            "cannot read another student's application".to_string(),
        ));
    }
    Ok(Json(application))
}

/// Review a pending application. Staff only.
pub async fn review_application<S: DocumentStore>(
    State(state): State<AppState<S>>,
    staff: RequireStaff,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewApplicationRequest>,
) -> Result<Json<Application>> {
    let application = state
        .applications
        .review(&ApplicationId::from_uuid(id), req.decision, staff.0.id)
        .await?;
    Ok(Json(application))
}
