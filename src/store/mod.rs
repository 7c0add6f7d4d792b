//! Store traits for the document collections backing the system.
//!
//! Each entity gets its own repository trait; the backing document database
//! is an external collaborator, so everything the coordinator needs is
//! expressed here as an injected interface. The one contract beyond plain
//! CRUD is [`TransactionalStore`]: occupancy updates must be expressible as
//! a read-then-write inside an externally managed atomic unit, never as
//! isolated writes.

pub mod memory;

pub use memory::MemoryStore;

use crate::types::{
    Allocation, AllocationId, AllocationStatus, Application, ApplicationId, ApplicationStatus,
    GenderPolicy, Hostel, HostelId, Role, Room, RoomId, User, UserId,
};
use std::future::Future;
use thiserror::Error;

/// Store-level failure modes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A concurrently committed transaction invalidated one of this
    /// transaction's reads. The caller may retry the whole atomic unit.
    #[error("write conflict detected at commit")]
    Conflict,

    /// The backend could not serve the request.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Repositories
// ============================================================================

/// User collection.
pub trait UserStore: Send + Sync {
    /// Insert a new user document.
    fn create_user(&self, user: User) -> impl Future<Output = StoreResult<User>> + Send;

    /// Fetch a user by id.
    fn get_user(&self, id: &UserId) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// Fetch a user by email.
    fn get_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// List users, optionally filtered by role.
    fn list_users(&self, role: Option<Role>)
        -> impl Future<Output = StoreResult<Vec<User>>> + Send;

    /// Replace a user document. Returns `false` when the user does not exist.
    fn update_user(&self, user: User) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Delete a user document. Returns `false` when the user does not exist.
    fn delete_user(&self, id: &UserId) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Hostel collection.
pub trait HostelStore: Send + Sync {
    /// Insert a new hostel document.
    fn create_hostel(&self, hostel: Hostel) -> impl Future<Output = StoreResult<Hostel>> + Send;

    /// Fetch a hostel by id.
    fn get_hostel(&self, id: &HostelId)
        -> impl Future<Output = StoreResult<Option<Hostel>>> + Send;

    /// List hostels, optionally filtered by gender policy and active flag.
    fn list_hostels(
        &self,
        gender: Option<GenderPolicy>,
        active: Option<bool>,
    ) -> impl Future<Output = StoreResult<Vec<Hostel>>> + Send;

    /// Replace a hostel document. Returns `false` when it does not exist.
    fn update_hostel(&self, hostel: Hostel) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Delete a hostel document. Returns `false` when it does not exist.
    fn delete_hostel(&self, id: &HostelId) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Room collection.
///
/// `update_room` exists for metadata edits; the `occupied` counter is owned
/// by the allocation transaction and must never be written through here.
pub trait RoomStore: Send + Sync {
    /// Insert a new room document.
    fn create_room(&self, room: Room) -> impl Future<Output = StoreResult<Room>> + Send;

    /// Fetch a room by id.
    fn get_room(&self, id: &RoomId) -> impl Future<Output = StoreResult<Option<Room>>> + Send;

    /// List every room.
    fn list_rooms(&self) -> impl Future<Output = StoreResult<Vec<Room>>> + Send;

    /// List the rooms of one hostel.
    fn list_rooms_by_hostel(
        &self,
        hostel_id: &HostelId,
    ) -> impl Future<Output = StoreResult<Vec<Room>>> + Send;

    /// Replace a room document. Returns `false` when it does not exist.
    fn update_room(&self, room: Room) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Delete a room document. Returns `false` when it does not exist.
    fn delete_room(&self, id: &RoomId) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Application collection.
pub trait ApplicationStore: Send + Sync {
    /// Insert a new application document.
    fn create_application(
        &self,
        application: Application,
    ) -> impl Future<Output = StoreResult<Application>> + Send;

    /// Fetch an application by id.
    fn get_application(
        &self,
        id: &ApplicationId,
    ) -> impl Future<Output = StoreResult<Option<Application>>> + Send;

    /// List a student's applications.
    fn list_applications_by_student(
        &self,
        student_id: &UserId,
    ) -> impl Future<Output = StoreResult<Vec<Application>>> + Send;

    /// List applications, optionally filtered by status.
    fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> impl Future<Output = StoreResult<Vec<Application>>> + Send;

    /// Replace an application document. Returns `false` when it does not exist.
    fn update_application(
        &self,
        application: Application,
    ) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Filter for allocation queries. Empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocationFilter {
    /// Restrict to one student
    pub student_id: Option<UserId>,
    /// Restrict to one room
    pub room_id: Option<RoomId>,
    /// Restrict to one hostel
    pub hostel_id: Option<HostelId>,
    /// Restrict to one semester
    pub semester: Option<String>,
    /// Restrict to one status
    pub status: Option<AllocationStatus>,
}

impl AllocationFilter {
    /// Whether an allocation satisfies every set field.
    #[must_use]
    pub fn matches(&self, allocation: &Allocation) -> bool {
        self.student_id.map_or(true, |id| allocation.student_id == id)
            && self.room_id.map_or(true, |id| allocation.room_id == id)
            && self.hostel_id.map_or(true, |id| allocation.hostel_id == id)
            && self
                .semester
                .as_ref()
                .map_or(true, |semester| &allocation.semester == semester)
            && self.status.map_or(true, |status| allocation.status == status)
    }
}

/// Allocation collection.
///
/// There is no `create` here on purpose: allocation records come into
/// existence only through the coordinator's transaction.
pub trait AllocationStore: Send + Sync {
    /// Fetch an allocation by id.
    fn get_allocation(
        &self,
        id: &AllocationId,
    ) -> impl Future<Output = StoreResult<Option<Allocation>>> + Send;

    /// List allocations matching a filter.
    fn list_allocations(
        &self,
        filter: &AllocationFilter,
    ) -> impl Future<Output = StoreResult<Vec<Allocation>>> + Send;
}

// ============================================================================
// Transactions
// ============================================================================

/// Handle to an in-flight atomic unit.
///
/// Reads observe the last committed state and are recorded; buffered writes
/// become visible only at commit. Dropping the handle without committing
/// discards every buffered write — rollback is the default.
pub trait Transaction: Send {
    /// Read a room inside the transaction.
    fn get_room(&mut self, id: &RoomId) -> impl Future<Output = StoreResult<Option<Room>>> + Send;

    /// Read a hostel inside the transaction.
    fn get_hostel(
        &mut self,
        id: &HostelId,
    ) -> impl Future<Output = StoreResult<Option<Hostel>>> + Send;

    /// Read an application inside the transaction.
    fn get_application(
        &mut self,
        id: &ApplicationId,
    ) -> impl Future<Output = StoreResult<Option<Application>>> + Send;

    /// Read an allocation inside the transaction.
    fn get_allocation(
        &mut self,
        id: &AllocationId,
    ) -> impl Future<Output = StoreResult<Option<Allocation>>> + Send;

    /// Buffer a room write.
    fn put_room(&mut self, room: Room);

    /// Buffer an application write.
    fn put_application(&mut self, application: Application);

    /// Buffer an allocation write (insert or replace).
    fn put_allocation(&mut self, allocation: Allocation);
}

/// Atomic multi-document mutation contract.
///
/// `commit` validates every read the transaction performed against the
/// current committed state and applies the buffered writes all-or-nothing.
/// If any read document changed in the meantime, commit fails with
/// [`StoreError::Conflict`] and nothing is applied; the coordinator retries
/// the whole unit.
pub trait TransactionalStore: Send + Sync {
    /// The transaction handle type.
    type Txn: Transaction + Send;

    /// Open a new transaction.
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Txn>> + Send;

    /// Validate and apply a transaction.
    fn commit(&self, txn: Self::Txn) -> impl Future<Output = StoreResult<()>> + Send;
}

/// The full store interface the coordinator and the HTTP layer are built
/// against. Blanket-implemented for anything providing all the pieces;
/// [`MemoryStore`] is the in-process implementation.
pub trait DocumentStore:
    UserStore
    + HostelStore
    + RoomStore
    + ApplicationStore
    + AllocationStore
    + TransactionalStore
    + Send
    + Sync
    + 'static
{
}

impl<S> DocumentStore for S where
    S: UserStore
        + HostelStore
        + RoomStore
        + ApplicationStore
        + AllocationStore
        + TransactionalStore
        + Send
        + Sync
        + 'static
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AllocationStatus;
    use chrono::Utc;

    fn sample_allocation() -> Allocation {
        Allocation {
            id: AllocationId::new(),
            student_id: UserId::new(),
            application_id: ApplicationId::new(),
            hostel_id: HostelId::new(),
            room_id: RoomId::new(),
            bed_label: "A".to_string(),
            semester: "2026-S1".to_string(),
            allocated_by: UserId::new(),
            allocated_at: Utc::now(),
            status: AllocationStatus::Active,
            cancelled_by: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let allocation = sample_allocation();
        assert!(AllocationFilter::default().matches(&allocation));
    }

    #[test]
    fn filter_fields_are_conjunctive() {
        let allocation = sample_allocation();

        let matching = AllocationFilter {
            student_id: Some(allocation.student_id),
            semester: Some("2026-S1".to_string()),
            status: Some(AllocationStatus::Active),
            ..AllocationFilter::default()
        };
        assert!(matching.matches(&allocation));

        let wrong_semester = AllocationFilter {
            student_id: Some(allocation.student_id),
            semester: Some("2026-S2".to_string()),
            ..AllocationFilter::default()
        };
        assert!(!wrong_semester.matches(&allocation));
    }
}
