//! Error taxonomy for allocation operations and its HTTP mapping.
//!
//! Pre-transaction validation errors map to 4xx responses; failures the
//! client cannot resolve (an aborted transaction, a store fault) surface as
//! 5xx and are logged.

use crate::store::StoreError;
use crate::types::{GenderPolicy, RoomId};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for allocation operations.
pub type Result<T> = std::result::Result<T, AllocationError>;

/// Failure modes of the allocation protocol and the surrounding API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// A referenced entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity kind, e.g. "student" or "room"
        entity: &'static str,
        /// The id that failed to resolve
        id: String,
    },

    /// The student has no approved application to consume.
    #[error("student is not eligible: {reason}")]
    IneligibleStudent {
        /// Why the student is ineligible
        reason: String,
    },

    /// The student already holds an active allocation for the semester.
    #[error("active allocation already exists for semester {semester}")]
    ActiveAllocationExists {
        /// The contested semester
        semester: String,
    },

    /// The room has no free beds left.
    #[error("room {room_id} is fully occupied")]
    Capacity {
        /// The full room
        room_id: RoomId,
    },

    /// The hostel's gender policy excludes the student.
    #[error("gender mismatch: this hostel is for {policy} students only")]
    PolicyViolation {
        /// The hostel's policy
        policy: GenderPolicy,
    },

    /// Missing or invalid bearer credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller's role does not permit this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request payload failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The store could not commit the transaction within the retry budget.
    /// The caller should retry the whole operation.
    #[error("transaction aborted after {attempts} attempts")]
    TransactionAborted {
        /// How many commit attempts were made
        attempts: u32,
    },

    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AllocationError {
    /// Shorthand for a [`AllocationError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::IneligibleStudent { .. } | Self::PolicyViolation { .. } | Self::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::ActiveAllocationExists { .. } | Self::Capacity { .. } => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::TransactionAborted { .. } | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code for clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::IneligibleStudent { .. } => "INELIGIBLE_STUDENT",
            Self::ActiveAllocationExists { .. } => "ALLOCATION_CONFLICT",
            Self::Capacity { .. } => "ROOM_FULL",
            Self::PolicyViolation { .. } => "POLICY_VIOLATION",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::TransactionAborted { .. } => "TRANSACTION_ABORTED",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

/// Free-function shorthand for [`AllocationError::not_found`], convenient in
/// `ok_or_else` closures.
pub fn not_found(entity: &'static str, id: impl ToString) -> AllocationError {
    AllocationError::not_found(entity, id)
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AllocationError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                code = self.code(),
                error = %self,
                "request failed with server error"
            );
        }

        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = AllocationError::not_found("room", "123");
        assert_eq!(err.to_string(), "room with id 123 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn conflict_errors_map_to_409() {
        let err = AllocationError::ActiveAllocationExists {
            semester: "2026-S1".to_string(),
        };
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = AllocationError::Capacity {
            room_id: RoomId::new(),
        };
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "ROOM_FULL");
    }

    #[test]
    fn policy_violation_names_the_policy() {
        let err = AllocationError::PolicyViolation {
            policy: GenderPolicy::Male,
        };
        assert_eq!(
            err.to_string(),
            "gender mismatch: this hostel is for male students only"
        );
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn aborted_transaction_is_a_server_error() {
        let err = AllocationError::TransactionAborted { attempts: 5 };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
