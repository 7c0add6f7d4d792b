//! Domain types for the hostel accommodation system.
//!
//! This module contains all identifiers, enums, and entity types shared by
//! the stores, the allocation coordinator, and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a hostel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostelId(Uuid);

impl HostelId {
    /// Creates a new random `HostelId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `HostelId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HostelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HostelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a room
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(Uuid);

impl RoomId {
    /// Creates a new random `RoomId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RoomId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a housing application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(Uuid);

impl ApplicationId {
    /// Creates a new random `ApplicationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `ApplicationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an allocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocationId(Uuid);

impl AllocationId {
    /// Creates a new random `AllocationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `AllocationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AllocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Role claim attached to every authenticated principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Students may only read and act on their own resources
    Student,
    /// Wardens manage hostels, rooms, and allocations
    Warden,
    /// Admins additionally manage user accounts
    Admin,
}

impl Role {
    /// Whether this role may manage allocations, rooms, and hostels.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Warden | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Warden => write!(f, "warden"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Gender recorded on a user profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
        }
    }
}

/// Gender policy of a hostel. A hostel with no policy admits everyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderPolicy {
    /// Male students only
    Male,
    /// Female students only
    Female,
    /// No gender restriction
    Mixed,
}

impl GenderPolicy {
    /// Whether a student of the given gender may be allocated under this policy.
    #[must_use]
    pub const fn admits(self, gender: Gender) -> bool {
        match self {
            Self::Mixed => true,
            Self::Male => matches!(gender, Gender::Male),
            Self::Female => matches!(gender, Gender::Female),
        }
    }
}

impl fmt::Display for GenderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// Lifecycle status of a housing application.
///
/// An application transitions to `Allocated` exactly once, at the moment its
/// allocation is created; this prevents the same approved application from
/// being consumed by two allocations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Submitted, awaiting review
    Pending,
    /// Passed review, eligible for allocation
    Approved,
    /// Failed review
    Rejected,
    /// Consumed by an allocation
    Allocated,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Allocated => write!(f, "allocated"),
        }
    }
}

/// Lifecycle status of an allocation.
///
/// Allocations are never physically deleted by the core logic; cancellation
/// is the canonical termination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    /// Student currently holds the bed
    Active,
    /// Terminated by a warden or admin
    Cancelled,
    /// Ended normally at the end of the semester
    Completed,
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A user account. Role and gender are read-only inputs to allocation logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Email address
    pub email: String,
    /// Full name
    pub full_name: String,
    /// Role claim
    pub role: Role,
    /// Gender, checked against hostel policies during allocation
    pub gender: Gender,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

/// A hostel building.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hostel {
    /// Hostel ID
    pub id: HostelId,
    /// Display name
    pub name: String,
    /// Gender policy; `None` means unset (admits everyone)
    pub gender_policy: Option<GenderPolicy>,
    /// Whether the hostel is accepting allocations
    pub active: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Hostel {
    /// Whether a student of the given gender may be allocated into this hostel.
    #[must_use]
    pub fn admits(&self, gender: Gender) -> bool {
        self.gender_policy.map_or(true, |policy| policy.admits(gender))
    }
}

/// A room within a hostel.
///
/// Invariant: `0 <= occupied <= capacity`. The occupancy count is mutated
/// only inside the allocation coordinator's transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Room ID
    pub id: RoomId,
    /// Hostel this room belongs to
    pub hostel_id: HostelId,
    /// Room number, e.g. "B-204"
    pub room_number: String,
    /// Number of beds
    pub capacity: u32,
    /// Number of currently active allocations against this room
    pub occupied: u32,
    /// Floor number
    pub floor: Option<i32>,
    /// Block label
    pub block: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Remaining free beds.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied)
    }

    /// Whether the room has no free beds left.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }
}

/// A student's housing application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Application ID
    pub id: ApplicationId,
    /// Applying student
    pub student_id: UserId,
    /// Semester the application is for, e.g. "2026-S1"
    pub semester: String,
    /// Current status
    pub status: ApplicationStatus,
    /// When the student submitted the application
    pub submitted_at: DateTime<Utc>,
    /// When a warden reviewed it (approved or rejected)
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Who reviewed it
    pub reviewed_by: Option<UserId>,
}

/// A room allocation.
///
/// Invariant: at most one `Active` allocation per (student, semester) pair.
/// Created only by the allocate transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Allocation ID
    pub id: AllocationId,
    /// Allocated student
    pub student_id: UserId,
    /// Application consumed by this allocation
    pub application_id: ApplicationId,
    /// Hostel the room belongs to
    pub hostel_id: HostelId,
    /// Allocated room
    pub room_id: RoomId,
    /// Bed label within the room, e.g. "A"
    pub bed_label: String,
    /// Semester this allocation covers
    pub semester: String,
    /// Warden or admin who performed the allocation
    pub allocated_by: UserId,
    /// Server-assigned allocation timestamp
    pub allocated_at: DateTime<Utc>,
    /// Current status
    pub status: AllocationStatus,
    /// Who cancelled the allocation, if cancelled
    pub cancelled_by: Option<UserId>,
    /// Server-assigned cancellation timestamp, if cancelled
    pub cancelled_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Principal
// ============================================================================

/// Authenticated caller identity, resolved from a bearer credential.
///
/// Passed explicitly into every coordinator call; never read from implicit
/// request context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Subject id from the identity provider
    pub id: UserId,
    /// Role claim
    pub role: Role,
}

impl Principal {
    /// Whether the caller may manage allocations, rooms, and hostels.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Whether the caller is an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Per-hostel occupancy statistics derived from room state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupancyReport {
    /// Hostel the report covers
    pub hostel_id: HostelId,
    /// Number of rooms in the hostel
    pub total_rooms: usize,
    /// Sum of room capacities
    pub total_capacity: u32,
    /// Sum of occupied counts
    pub total_occupied: u32,
    /// `total_capacity - total_occupied`
    pub total_available: u32,
    /// `total_occupied / total_capacity * 100`, rounded to 2 decimal places;
    /// 0.0 when capacity is 0
    pub occupancy_rate: f64,
}
