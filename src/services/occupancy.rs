//! Occupancy aggregation across a hostel's rooms.

use crate::error::{not_found, Result};
use crate::store::DocumentStore;
use crate::types::{HostelId, OccupancyReport};

use super::allocation::AllocationCoordinator;

impl<S: DocumentStore> AllocationCoordinator<S> {
    /// Aggregates a hostel's rooms into a single occupancy report.
    ///
    /// The rate is `occupied / capacity` as a percentage rounded to two
    /// decimal places, `0.0` when total capacity is zero. A hostel with no
    /// rooms reports `NotFound` rather than an empty report.
    pub async fn hostel_occupancy(&self, hostel_id: &HostelId) -> Result<OccupancyReport> {
        let store = self.store();
        store
            .get_hostel(hostel_id)
            .await?
            .ok_or_else(|| not_found("hostel", hostel_id))?;

        let rooms = store.list_rooms_by_hostel(hostel_id).await?;
        if rooms.is_empty() {
            return Err(not_found("hostel rooms", hostel_id));
        }
        let total_capacity: u32 = rooms.iter().map(|r| r.capacity).sum();
        let total_occupied: u32 = rooms.iter().map(|r| r.occupied).sum();
        let total_available = total_capacity.saturating_sub(total_occupied);

        let occupancy_rate = if total_capacity == 0 {
            0.0
        } else {
            let rate = f64::from(total_occupied) / f64::from(total_capacity) * 100.0;
            (rate * 100.0).round() / 100.0
        };

        Ok(OccupancyReport {
            hostel_id: *hostel_id,
            total_rooms: rooms.len(),
            total_capacity,
            total_occupied,
            total_available,
            occupancy_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use crate::clock::SystemClock;
    use crate::store::memory::MemoryStore;
    use crate::store::{HostelStore, RoomStore};
    use crate::types::{Hostel, HostelId, Room, RoomId};

    use super::AllocationCoordinator;

    fn hostel() -> Hostel {
        let now = Utc::now();
        Hostel {
            id: HostelId::new(),
            name: "East Wing".to_string(),
            gender_policy: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn room(hostel_id: HostelId, number: &str, capacity: u32, occupied: u32) -> Room {
        let now = Utc::now();
        Room {
            id: RoomId::new(),
            hostel_id,
            room_number: number.to_string(),
            capacity,
            occupied,
            floor: None,
            block: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn report_sums_rooms_and_rounds_rate() {
        let store = Arc::new(MemoryStore::new());
        let coordinator =
            AllocationCoordinator::new(Arc::clone(&store), Arc::new(SystemClock));

        let hostel = hostel();
        store.create_hostel(hostel.clone()).await.unwrap();
        store.create_room(room(hostel.id, "101", 4, 1)).await.unwrap();
        store.create_room(room(hostel.id, "102", 2, 1)).await.unwrap();

        let report = coordinator.hostel_occupancy(&hostel.id).await.unwrap();
        assert_eq!(report.total_rooms, 2);
        assert_eq!(report.total_capacity, 6);
        assert_eq!(report.total_occupied, 2);
        assert_eq!(report.total_available, 4);
        // 2/6 = 33.333..%, rounded to two decimals.
        assert!((report.occupancy_rate - 33.33).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn roomless_hostel_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let coordinator =
            AllocationCoordinator::new(Arc::clone(&store), Arc::new(SystemClock));

        let hostel = hostel();
        store.create_hostel(hostel.clone()).await.unwrap();

        let err = coordinator.hostel_occupancy(&hostel.id).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::AllocationError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn unknown_hostel_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let coordinator =
            AllocationCoordinator::new(Arc::clone(&store), Arc::new(SystemClock));

        let err = coordinator
            .hostel_occupancy(&HostelId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::AllocationError::NotFound { entity: "hostel", .. }
        ));
    }
}
