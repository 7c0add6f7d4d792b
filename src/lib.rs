//! Hostel Allocation Service - room allocation backend for student housing
//!
//! A REST backend managing the full student housing lifecycle:
//!
//! - **Users**: students, wardens, admins
//! - **Hostels and rooms**: buildings with gender policies, rooms with
//!   capacity and a live occupancy counter
//! - **Applications**: students apply per semester; staff approve or reject
//! - **Allocations**: staff assign approved students to beds
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum)
//!   │  extractors: AuthUser / RequireStaff / RequireAdmin
//!   ▼
//! Services
//!   ├── AllocationCoordinator  — allocate / cancel / occupancy
//!   └── ApplicationService     — submit / review
//!   ▼
//! DocumentStore (trait)
//!   └── MemoryStore            — versioned documents, optimistic transactions
//! ```
//!
//! # Allocation atomicity
//!
//! Granting a bed touches three documents at once: the new allocation record,
//! the room's `occupied` counter, and the consumed application. The
//! coordinator performs all three inside a store transaction whose read set
//! is validated at commit, so two racing requests for the last bed cannot
//! both succeed — one commits, the other conflicts and retries against the
//! new state, where the capacity check fails cleanly.
//!
//! Invariants the transaction upholds:
//!
//! - `room.occupied <= room.capacity`, always
//! - one active allocation per student per semester
//! - a hostel's gender policy admits every student housed in it

#![forbid(unsafe_code)]

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use error::{AllocationError, Result};
pub use server::{build_router, AppState};
