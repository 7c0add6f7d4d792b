//! Allocation coordinator: the one place where beds are granted and taken back.
//!
//! # Allocation protocol
//!
//! Assigning a student to a room is a multi-document write (allocation record,
//! room occupancy, application status) with invariants that span documents:
//!
//! - A room's `occupied` never exceeds its `capacity`.
//! - A student holds at most one active allocation per semester.
//! - A hostel's gender policy admits every student allocated into it.
//!
//! The coordinator runs pre-checks outside a transaction (cheap rejection of
//! hopeless requests), then performs all reads and writes inside a store
//! transaction. The transaction's read set is validated at commit; a conflict
//! means another writer touched one of our documents, and the whole attempt is
//! retried from a fresh read of the world. After [`MAX_TXN_ATTEMPTS`] failed
//! attempts the request is rejected with [`AllocationError::TransactionAborted`]
//! rather than blocking the caller.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{not_found, AllocationError, Result};
use crate::store::{AllocationFilter, DocumentStore, StoreError, Transaction, TransactionalStore};
use crate::types::{
    Allocation, AllocationId, AllocationStatus, Application, ApplicationStatus, HostelId, RoomId,
    User, UserId,
};

/// Retry budget for optimistic transaction conflicts.
pub const MAX_TXN_ATTEMPTS: u32 = 5;

// ============================================================================
// Commands
// ============================================================================

/// Everything needed to allocate one bed.
#[derive(Debug, Clone)]
pub struct AllocateCommand {
    pub student_id: UserId,
    pub hostel_id: HostelId,
    pub room_id: RoomId,
    pub bed_label: String,
    pub semester: String,
    pub allocated_by: UserId,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Orchestrates allocation and cancellation against an injected store.
pub struct AllocationCoordinator<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for AllocationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: DocumentStore> AllocationCoordinator<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    // ------------------------------------------------------------------
    // Allocate
    // ------------------------------------------------------------------

    /// Allocates a bed to a student, atomically.
    ///
    /// Pre-checks reject requests that cannot possibly succeed (no such
    /// student, no approved application, already housed this semester). The
    /// decisive checks run again inside the transaction against versioned
    /// reads, so two racing requests cannot both slip through.
    pub async fn allocate(&self, cmd: AllocateCommand) -> Result<Allocation> {
        let student = self
            .store
            .get_user(&cmd.student_id)
            .await?
            .ok_or_else(|| not_found("student", cmd.student_id))?;

        let application = self.approved_application(&cmd.student_id).await?;

        let active = self
            .store
            .list_allocations(&AllocationFilter {
                student_id: Some(cmd.student_id),
                semester: Some(cmd.semester.clone()),
                status: Some(AllocationStatus::Active),
                ..AllocationFilter::default()
            })
            .await?;
        if !active.is_empty() {
            return Err(AllocationError::ActiveAllocationExists {
                semester: cmd.semester.clone(),
            });
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut txn = self.store.begin().await?;
            let allocation = self
                .allocate_in_txn(&mut txn, &cmd, &student, &application)
                .await?;
            match self.store.commit(txn).await {
                Ok(()) => {
                    tracing::info!(
                        allocation_id = %allocation.id,
                        student_id = %cmd.student_id,
                        room_id = %cmd.room_id,
                        semester = %cmd.semester,
                        attempts,
                        "bed allocated"
                    );
                    return Ok(allocation);
                }
                Err(StoreError::Conflict) if attempts < MAX_TXN_ATTEMPTS => {
                    tracing::debug!(
                        student_id = %cmd.student_id,
                        room_id = %cmd.room_id,
                        attempts,
                        "allocation commit conflicted, retrying"
                    );
                }
                Err(StoreError::Conflict) => {
                    return Err(AllocationError::TransactionAborted { attempts });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// The transactional body of [`allocate`](Self::allocate).
    ///
    /// All reads here are version-stamped into the transaction, so the checks
    /// below hold at commit time, not merely at read time.
    async fn allocate_in_txn(
        &self,
        txn: &mut <S as TransactionalStore>::Txn,
        cmd: &AllocateCommand,
        student: &User,
        application: &Application,
    ) -> Result<Allocation> {
        let mut room = txn
            .get_room(&cmd.room_id)
            .await?
            .ok_or_else(|| not_found("room", cmd.room_id))?;
        if room.hostel_id != cmd.hostel_id {
            return Err(AllocationError::Validation(format!(
                "room {} does not belong to hostel {}",
                cmd.room_id, cmd.hostel_id
            )));
        }
        if room.is_full() {
            return Err(AllocationError::Capacity {
                room_id: cmd.room_id,
            });
        }

        let hostel = txn
            .get_hostel(&cmd.hostel_id)
            .await?
            .ok_or_else(|| not_found("hostel", cmd.hostel_id))?;
        if !hostel.active {
            return Err(AllocationError::Validation(format!(
                "hostel {} is not accepting allocations",
                hostel.id
            )));
        }
        if let Some(policy) = hostel.gender_policy {
            if !policy.admits(student.gender) {
                return Err(AllocationError::PolicyViolation { policy });
            }
        }

        // Re-read the application inside the transaction: a concurrent
        // allocation for the same student flips it to `Allocated`, and the
        // version stamp makes that visible at commit.
        let mut application = txn
            .get_application(&application.id)
            .await?
            .ok_or_else(|| not_found("application", application.id))?;
        match application.status {
            ApplicationStatus::Approved => {}
            ApplicationStatus::Allocated => {
                return Err(AllocationError::ActiveAllocationExists {
                    semester: cmd.semester.clone(),
                });
            }
            other => {
                return Err(AllocationError::IneligibleStudent {
                    reason: format!("application is {other}, not approved"),
                });
            }
        }

        let now = self.clock.now();
        let allocation = Allocation {
            id: AllocationId::new(),
            student_id: cmd.student_id,
            hostel_id: cmd.hostel_id,
            room_id: cmd.room_id,
            application_id: application.id,
            bed_label: cmd.bed_label.clone(),
            semester: cmd.semester.clone(),
            status: AllocationStatus::Active,
            allocated_by: cmd.allocated_by,
            allocated_at: now,
            cancelled_by: None,
            cancelled_at: None,
        };
        txn.put_allocation(allocation.clone());

        room.occupied += 1;
        room.updated_at = now;
        txn.put_room(room);

        application.status = ApplicationStatus::Allocated;
        txn.put_application(application);

        Ok(allocation)
    }

    /// Picks the application the allocation will consume: the approved one
    /// reviewed most recently (falling back to submission time when a review
    /// timestamp is missing).
    async fn approved_application(&self, student_id: &UserId) -> Result<Application> {
        let mut approved: Vec<Application> = self
            .store
            .list_applications_by_student(student_id)
            .await?
            .into_iter()
            .filter(|app| app.status == ApplicationStatus::Approved)
            .collect();
        approved.sort_by_key(|app| app.reviewed_at.unwrap_or(app.submitted_at));
        approved
            .pop()
            .ok_or_else(|| AllocationError::IneligibleStudent {
                reason: "no approved accommodation application on file".to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Cancel
    // ------------------------------------------------------------------

    /// Ends an allocation and releases its bed.
    ///
    /// Cancelling an already-cancelled allocation is a no-op returning the
    /// record as-is, so retried cancel requests never double-decrement a
    /// room's occupancy.
    pub async fn cancel(
        &self,
        allocation_id: &AllocationId,
        cancelled_by: UserId,
    ) -> Result<Allocation> {
        // Existence check up front so missing ids report 404 rather than
        // burning transaction attempts.
        self.store
            .get_allocation(allocation_id)
            .await?
            .ok_or_else(|| not_found("allocation", allocation_id))?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut txn = self.store.begin().await?;
            let (allocation, changed) = self
                .cancel_in_txn(&mut txn, allocation_id, cancelled_by)
                .await?;
            if !changed {
                return Ok(allocation);
            }
            match self.store.commit(txn).await {
                Ok(()) => {
                    tracing::info!(
                        allocation_id = %allocation.id,
                        room_id = %allocation.room_id,
                        attempts,
                        "allocation cancelled"
                    );
                    return Ok(allocation);
                }
                Err(StoreError::Conflict) if attempts < MAX_TXN_ATTEMPTS => {}
                Err(StoreError::Conflict) => {
                    return Err(AllocationError::TransactionAborted { attempts });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn cancel_in_txn(
        &self,
        txn: &mut <S as TransactionalStore>::Txn,
        allocation_id: &AllocationId,
        cancelled_by: UserId,
    ) -> Result<(Allocation, bool)> {
        let mut allocation = txn
            .get_allocation(allocation_id)
            .await?
            .ok_or_else(|| not_found("allocation", allocation_id))?;
        if allocation.status == AllocationStatus::Cancelled {
            return Ok((allocation, false));
        }

        let now = self.clock.now();
        allocation.status = AllocationStatus::Cancelled;
        allocation.cancelled_by = Some(cancelled_by);
        allocation.cancelled_at = Some(now);
        txn.put_allocation(allocation.clone());

        // The room may have been deleted since allocation; releasing the bed
        // then has nothing to update.
        if let Some(mut room) = txn.get_room(&allocation.room_id).await? {
            room.occupied = room.occupied.saturating_sub(1);
            room.updated_at = now;
            txn.put_room(room);
        }

        Ok((allocation, true))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn get_allocation(&self, id: &AllocationId) -> Result<Allocation> {
        self.store
            .get_allocation(id)
            .await?
            .ok_or_else(|| not_found("allocation", id))
    }

    pub async fn list_allocations(&self, filter: AllocationFilter) -> Result<Vec<Allocation>> {
        let mut allocations = self.store.list_allocations(&filter).await?;
        allocations.sort_by_key(|a| std::cmp::Reverse(a.allocated_at));
        Ok(allocations)
    }

    pub async fn allocations_for_student(&self, student_id: UserId) -> Result<Vec<Allocation>> {
        self.list_allocations(AllocationFilter {
            student_id: Some(student_id),
            ..AllocationFilter::default()
        })
        .await
    }

    pub async fn allocations_for_room(&self, room_id: RoomId) -> Result<Vec<Allocation>> {
        self.list_allocations(AllocationFilter {
            room_id: Some(room_id),
            ..AllocationFilter::default()
        })
        .await
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }
}

// ============================================================================
// Tests
// ============================================================================
