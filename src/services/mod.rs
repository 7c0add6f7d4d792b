//! Service layer: the allocation coordinator and its sibling services.
//!
//! Services own the business rules; HTTP handlers stay thin. Every service
//! takes its store and clock at construction (no global handles) and takes
//! the caller's [`crate::types::Principal`] explicitly where authorization
//! matters.

pub mod allocation;
pub mod applications;
pub mod occupancy;

pub use allocation::{AllocateCommand, AllocationCoordinator};
pub use applications::{ApplicationService, ReviewDecision};
