//! HTTP API handlers, grouped by resource.

pub mod allocations;
pub mod applications;
pub mod hostels;
pub mod rooms;
pub mod users;
