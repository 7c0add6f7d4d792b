//! In-memory document store with optimistic transactions.
//!
//! Collections are versioned `HashMap`s behind a single `RwLock`. Every
//! committed write bumps the document's version; a transaction records the
//! version of everything it reads and commit re-validates the whole read set
//! under the write lock, so two transactions racing for the same room cannot
//! both commit. This is the test double for the external document database
//! and the backing store of the demo server.

use super::{
    AllocationFilter, StoreError, StoreResult, Transaction, TransactionalStore,
};
use crate::types::{
    Allocation, AllocationId, Application, ApplicationId, ApplicationStatus, GenderPolicy, Hostel,
    HostelId, Role, Room, RoomId, User, UserId,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A document plus its commit version. Versions start at 1 and only grow;
/// version 0 is reserved for "absent".
#[derive(Clone, Debug)]
struct Versioned<T> {
    version: u64,
    doc: T,
}

#[derive(Default)]
struct Collections {
    users: HashMap<UserId, Versioned<User>>,
    hostels: HashMap<HostelId, Versioned<Hostel>>,
    rooms: HashMap<RoomId, Versioned<Room>>,
    applications: HashMap<ApplicationId, Versioned<Application>>,
    allocations: HashMap<AllocationId, Versioned<Allocation>>,
}

impl Collections {
    fn room_version(&self, id: &RoomId) -> u64 {
        self.rooms.get(id).map_or(0, |v| v.version)
    }

    fn hostel_version(&self, id: &HostelId) -> u64 {
        self.hostels.get(id).map_or(0, |v| v.version)
    }

    fn application_version(&self, id: &ApplicationId) -> u64 {
        self.applications.get(id).map_or(0, |v| v.version)
    }

    fn allocation_version(&self, id: &AllocationId) -> u64 {
        self.allocations.get(id).map_or(0, |v| v.version)
    }
}

/// In-memory implementation of every store trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Repositories
// ============================================================================

impl super::UserStore for MemoryStore {
    fn create_user(&self, user: User) -> impl Future<Output = StoreResult<User>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;
            guard.users.insert(
                user.id,
                Versioned {
                    version: 1,
                    doc: user.clone(),
                },
            );
            Ok(user)
        }
    }

    fn get_user(&self, id: &UserId) -> impl Future<Output = StoreResult<Option<User>>> + Send {
        let inner = Arc::clone(&self.inner);
        let id = *id;
        async move { Ok(inner.read().await.users.get(&id).map(|v| v.doc.clone())) }
    }

    fn get_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send {
        let inner = Arc::clone(&self.inner);
        let email = email.to_string();
        async move {
            Ok(inner
                .read()
                .await
                .users
                .values()
                .find(|v| v.doc.email == email)
                .map(|v| v.doc.clone()))
        }
    }

    fn list_users(
        &self,
        role: Option<Role>,
    ) -> impl Future<Output = StoreResult<Vec<User>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            Ok(inner
                .read()
                .await
                .users
                .values()
                .filter(|v| role.map_or(true, |role| v.doc.role == role))
                .map(|v| v.doc.clone())
                .collect())
        }
    }

    fn update_user(&self, user: User) -> impl Future<Output = StoreResult<bool>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;
            match guard.users.get_mut(&user.id) {
                Some(slot) => {
                    slot.version += 1;
                    slot.doc = user;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn delete_user(&self, id: &UserId) -> impl Future<Output = StoreResult<bool>> + Send {
        let inner = Arc::clone(&self.inner);
        let id = *id;
        async move { Ok(inner.write().await.users.remove(&id).is_some()) }
    }
}

impl super::HostelStore for MemoryStore {
    fn create_hostel(&self, hostel: Hostel) -> impl Future<Output = StoreResult<Hostel>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;
            guard.hostels.insert(
                hostel.id,
                Versioned {
                    version: 1,
                    doc: hostel.clone(),
                },
            );
            Ok(hostel)
        }
    }

    fn get_hostel(
        &self,
        id: &HostelId,
    ) -> impl Future<Output = StoreResult<Option<Hostel>>> + Send {
        let inner = Arc::clone(&self.inner);
        let id = *id;
        async move { Ok(inner.read().await.hostels.get(&id).map(|v| v.doc.clone())) }
    }

    fn list_hostels(
        &self,
        gender: Option<GenderPolicy>,
        active: Option<bool>,
    ) -> impl Future<Output = StoreResult<Vec<Hostel>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            Ok(inner
                .read()
                .await
                .hostels
                .values()
                .filter(|v| gender.map_or(true, |policy| v.doc.gender_policy == Some(policy)))
                .filter(|v| active.map_or(true, |active| v.doc.active == active))
                .map(|v| v.doc.clone())
                .collect())
        }
    }

    fn update_hostel(&self, hostel: Hostel) -> impl Future<Output = StoreResult<bool>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;
            match guard.hostels.get_mut(&hostel.id) {
                Some(slot) => {
                    slot.version += 1;
                    slot.doc = hostel;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn delete_hostel(&self, id: &HostelId) -> impl Future<Output = StoreResult<bool>> + Send {
        let inner = Arc::clone(&self.inner);
        let id = *id;
        async move { Ok(inner.write().await.hostels.remove(&id).is_some()) }
    }
}

impl super::RoomStore for MemoryStore {
    fn create_room(&self, room: Room) -> impl Future<Output = StoreResult<Room>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;
            guard.rooms.insert(
                room.id,
                Versioned {
                    version: 1,
                    doc: room.clone(),
                },
            );
            Ok(room)
        }
    }

    fn get_room(&self, id: &RoomId) -> impl Future<Output = StoreResult<Option<Room>>> + Send {
        let inner = Arc::clone(&self.inner);
        let id = *id;
        async move { Ok(inner.read().await.rooms.get(&id).map(|v| v.doc.clone())) }
    }

    fn list_rooms(&self) -> impl Future<Output = StoreResult<Vec<Room>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            Ok(inner
                .read()
                .await
                .rooms
                .values()
                .map(|v| v.doc.clone())
                .collect())
        }
    }

    fn list_rooms_by_hostel(
        &self,
        hostel_id: &HostelId,
    ) -> impl Future<Output = StoreResult<Vec<Room>>> + Send {
        let inner = Arc::clone(&self.inner);
        let hostel_id = *hostel_id;
        async move {
            Ok(inner
                .read()
                .await
                .rooms
                .values()
                .filter(|v| v.doc.hostel_id == hostel_id)
                .map(|v| v.doc.clone())
                .collect())
        }
    }

    fn update_room(&self, room: Room) -> impl Future<Output = StoreResult<bool>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;
            match guard.rooms.get_mut(&room.id) {
                Some(slot) => {
                    slot.version += 1;
                    slot.doc = room;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn delete_room(&self, id: &RoomId) -> impl Future<Output = StoreResult<bool>> + Send {
        let inner = Arc::clone(&self.inner);
        let id = *id;
        async move { Ok(inner.write().await.rooms.remove(&id).is_some()) }
    }
}

impl super::ApplicationStore for MemoryStore {
    fn create_application(
        &self,
        application: Application,
    ) -> impl Future<Output = StoreResult<Application>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;
            guard.applications.insert(
                application.id,
                Versioned {
                    version: 1,
                    doc: application.clone(),
                },
            );
            Ok(application)
        }
    }

    fn get_application(
        &self,
        id: &ApplicationId,
    ) -> impl Future<Output = StoreResult<Option<Application>>> + Send {
        let inner = Arc::clone(&self.inner);
        let id = *id;
        async move {
            Ok(inner
                .read()
                .await
                .applications
                .get(&id)
                .map(|v| v.doc.clone()))
        }
    }

    fn list_applications_by_student(
        &self,
        student_id: &UserId,
    ) -> impl Future<Output = StoreResult<Vec<Application>>> + Send {
        let inner = Arc::clone(&self.inner);
        let student_id = *student_id;
        async move {
            Ok(inner
                .read()
                .await
                .applications
                .values()
                .filter(|v| v.doc.student_id == student_id)
                .map(|v| v.doc.clone())
                .collect())
        }
    }

    fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> impl Future<Output = StoreResult<Vec<Application>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            Ok(inner
                .read()
                .await
                .applications
                .values()
                .filter(|v| status.map_or(true, |status| v.doc.status == status))
                .map(|v| v.doc.clone())
                .collect())
        }
    }

    fn update_application(
        &self,
        application: Application,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;
            match guard.applications.get_mut(&application.id) {
                Some(slot) => {
                    slot.version += 1;
                    slot.doc = application;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }
}

impl super::AllocationStore for MemoryStore {
    fn get_allocation(
        &self,
        id: &AllocationId,
    ) -> impl Future<Output = StoreResult<Option<Allocation>>> + Send {
        let inner = Arc::clone(&self.inner);
        let id = *id;
        async move {
            Ok(inner
                .read()
                .await
                .allocations
                .get(&id)
                .map(|v| v.doc.clone()))
        }
    }

    fn list_allocations(
        &self,
        filter: &AllocationFilter,
    ) -> impl Future<Output = StoreResult<Vec<Allocation>>> + Send {
        let inner = Arc::clone(&self.inner);
        let filter = filter.clone();
        async move {
            Ok(inner
                .read()
                .await
                .allocations
                .values()
                .filter(|v| filter.matches(&v.doc))
                .map(|v| v.doc.clone())
                .collect())
        }
    }
}

// ============================================================================
// Transactions
// ============================================================================

/// A recorded read: which document was observed at which version.
#[derive(Clone, Copy, Debug)]
enum ReadStamp {
    Room(RoomId, u64),
    Hostel(HostelId, u64),
    Application(ApplicationId, u64),
    Allocation(AllocationId, u64),
}

/// A buffered write, applied only at commit.
#[derive(Clone, Debug)]
enum WriteOp {
    Room(Room),
    Application(Application),
    Allocation(Allocation),
}

/// Optimistic transaction over [`MemoryStore`].
pub struct MemoryTransaction {
    inner: Arc<RwLock<Collections>>,
    reads: Vec<ReadStamp>,
    writes: Vec<WriteOp>,
}

impl Transaction for MemoryTransaction {
    fn get_room(&mut self, id: &RoomId) -> impl Future<Output = StoreResult<Option<Room>>> + Send {
        let id = *id;
        async move {
            let guard = self.inner.read().await;
            let found = guard.rooms.get(&id);
            self.reads
                .push(ReadStamp::Room(id, found.map_or(0, |v| v.version)));
            Ok(found.map(|v| v.doc.clone()))
        }
    }

    fn get_hostel(
        &mut self,
        id: &HostelId,
    ) -> impl Future<Output = StoreResult<Option<Hostel>>> + Send {
        let id = *id;
        async move {
            let guard = self.inner.read().await;
            let found = guard.hostels.get(&id);
            self.reads
                .push(ReadStamp::Hostel(id, found.map_or(0, |v| v.version)));
            Ok(found.map(|v| v.doc.clone()))
        }
    }

    fn get_application(
        &mut self,
        id: &ApplicationId,
    ) -> impl Future<Output = StoreResult<Option<Application>>> + Send {
        let id = *id;
        async move {
            let guard = self.inner.read().await;
            let found = guard.applications.get(&id);
            self.reads
                .push(ReadStamp::Application(id, found.map_or(0, |v| v.version)));
            Ok(found.map(|v| v.doc.clone()))
        }
    }

    fn get_allocation(
        &mut self,
        id: &AllocationId,
    ) -> impl Future<Output = StoreResult<Option<Allocation>>> + Send {
        let id = *id;
        async move {
            let guard = self.inner.read().await;
            let found = guard.allocations.get(&id);
            self.reads
                .push(ReadStamp::Allocation(id, found.map_or(0, |v| v.version)));
            Ok(found.map(|v| v.doc.clone()))
        }
    }

    fn put_room(&mut self, room: Room) {
        self.writes.push(WriteOp::Room(room));
    }

    fn put_application(&mut self, application: Application) {
        self.writes.push(WriteOp::Application(application));
    }

    fn put_allocation(&mut self, allocation: Allocation) {
        self.writes.push(WriteOp::Allocation(allocation));
    }
}

impl TransactionalStore for MemoryStore {
    type Txn = MemoryTransaction;

    fn begin(&self) -> impl Future<Output = StoreResult<MemoryTransaction>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            Ok(MemoryTransaction {
                inner,
                reads: Vec::new(),
                writes: Vec::new(),
            })
        }
    }

    fn commit(&self, txn: MemoryTransaction) -> impl Future<Output = StoreResult<()>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut guard = inner.write().await;

            // Validate the read set under the write lock. Any document that
            // moved since this transaction observed it invalidates the unit.
            for stamp in &txn.reads {
                let (observed, current) = match stamp {
                    ReadStamp::Room(id, observed) => (*observed, guard.room_version(id)),
                    ReadStamp::Hostel(id, observed) => (*observed, guard.hostel_version(id)),
                    ReadStamp::Application(id, observed) => {
                        (*observed, guard.application_version(id))
                    }
                    ReadStamp::Allocation(id, observed) => {
                        (*observed, guard.allocation_version(id))
                    }
                };
                if observed != current {
                    return Err(StoreError::Conflict);
                }
            }

            for write in txn.writes {
                match write {
                    WriteOp::Room(room) => {
                        let slot = guard.rooms.entry(room.id).or_insert_with(|| Versioned {
                            version: 0,
                            doc: room.clone(),
                        });
                        slot.version += 1;
                        slot.doc = room;
                    }
                    WriteOp::Application(application) => {
                        let slot = guard
                            .applications
                            .entry(application.id)
                            .or_insert_with(|| Versioned {
                                version: 0,
                                doc: application.clone(),
                            });
                        slot.version += 1;
                        slot.doc = application;
                    }
                    WriteOp::Allocation(allocation) => {
                        let slot = guard
                            .allocations
                            .entry(allocation.id)
                            .or_insert_with(|| Versioned {
                                version: 0,
                                doc: allocation.clone(),
                            });
                        slot.version += 1;
                        slot.doc = allocation;
                    }
                }
            }

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RoomStore, Transaction as _, TransactionalStore as _};
    use chrono::Utc;

    fn sample_room() -> Room {
        Room {
            id: RoomId::new(),
            hostel_id: HostelId::new(),
            room_number: "A-101".to_string(),
            capacity: 2,
            occupied: 0,
            floor: Some(1),
            block: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn room_crud_round_trip() {
        let store = MemoryStore::new();
        let room = sample_room();
        store.create_room(room.clone()).await.unwrap();

        let fetched = store.get_room(&room.id).await.unwrap().unwrap();
        assert_eq!(fetched, room);

        let mut updated = fetched;
        updated.room_number = "A-102".to_string();
        assert!(store.update_room(updated.clone()).await.unwrap());
        assert_eq!(
            store.get_room(&room.id).await.unwrap().unwrap().room_number,
            "A-102"
        );

        assert!(store.delete_room(&room.id).await.unwrap());
        assert!(store.get_room(&room.id).await.unwrap().is_none());
        assert!(!store.delete_room(&room.id).await.unwrap());
    }

    #[tokio::test]
    async fn conflicting_commits_are_rejected() {
        let store = MemoryStore::new();
        let room = sample_room();
        store.create_room(room.clone()).await.unwrap();

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        let mut seen_first = first.get_room(&room.id).await.unwrap().unwrap();
        let mut seen_second = second.get_room(&room.id).await.unwrap().unwrap();

        seen_first.occupied += 1;
        first.put_room(seen_first);
        store.commit(first).await.unwrap();

        // The second transaction read the room before the first committed,
        // so its commit must be rejected wholesale.
        seen_second.occupied += 1;
        second.put_room(seen_second);
        assert_eq!(store.commit(second).await, Err(StoreError::Conflict));

        assert_eq!(store.get_room(&room.id).await.unwrap().unwrap().occupied, 1);
    }

    #[tokio::test]
    async fn non_transactional_update_invalidates_open_transaction() {
        let store = MemoryStore::new();
        let room = sample_room();
        store.create_room(room.clone()).await.unwrap();

        let mut txn = store.begin().await.unwrap();
        let seen = txn.get_room(&room.id).await.unwrap().unwrap();

        let mut renamed = room.clone();
        renamed.room_number = "B-200".to_string();
        store.update_room(renamed).await.unwrap();

        txn.put_room(seen);
        assert_eq!(store.commit(txn).await, Err(StoreError::Conflict));
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = MemoryStore::new();
        let room = sample_room();
        store.create_room(room.clone()).await.unwrap();

        {
            let mut txn = store.begin().await.unwrap();
            let mut seen = txn.get_room(&room.id).await.unwrap().unwrap();
            seen.occupied = 2;
            txn.put_room(seen);
            // dropped without commit
        }

        assert_eq!(store.get_room(&room.id).await.unwrap().unwrap().occupied, 0);
    }
}
