//! Races for the last bed.
//!
//! Fires many allocation requests at once and asserts the transactional
//! invariants hold: never more occupants than capacity, never a student
//! housed twice.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;

use hostel_allocation::clock::SystemClock;
use hostel_allocation::services::{AllocateCommand, AllocationCoordinator};
use hostel_allocation::store::memory::MemoryStore;
use hostel_allocation::store::{
    AllocationFilter, ApplicationStore, HostelStore, RoomStore, UserStore,
};
use hostel_allocation::types::{
    AllocationStatus, Application, ApplicationId, ApplicationStatus, Gender, Hostel, HostelId,
    Role, Room, RoomId, User, UserId,
};
use hostel_allocation::AllocationError;

async fn seed_student_with_approval(store: &MemoryStore, n: usize) -> User {
    let now = Utc::now();
    let student = User {
        id: UserId::new(),
        email: format!("student-{n}@campus.test"),
        full_name: format!("Student {n}"),
        role: Role::Student,
        gender: Gender::Female,
        created_at: now,
        updated_at: now,
    };
    store.create_user(student.clone()).await.unwrap();
    store
        .create_application(Application {
            id: ApplicationId::new(),
            student_id: student.id,
            semester: "2026-spring".to_string(),
            status: ApplicationStatus::Approved,
            submitted_at: now,
            reviewed_at: Some(now),
            reviewed_by: Some(UserId::new()),
        })
        .await
        .unwrap();
    student
}

#[tokio::test]
async fn capacity_two_room_admits_exactly_two_of_eight() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = AllocationCoordinator::new(Arc::clone(&store), Arc::new(SystemClock));

    let now = Utc::now();
    let hostel = Hostel {
        id: HostelId::new(),
        name: "Contested Wing".to_string(),
        gender_policy: None,
        active: true,
        created_at: now,
        updated_at: now,
    };
    store.create_hostel(hostel.clone()).await.unwrap();
    let room = Room {
        id: RoomId::new(),
        hostel_id: hostel.id,
        room_number: "101".to_string(),
        capacity: 2,
        occupied: 0,
        floor: None,
        block: None,
        created_at: now,
        updated_at: now,
    };
    store.create_room(room.clone()).await.unwrap();

    let mut students = Vec::new();
    for n in 0..8 {
        students.push(seed_student_with_approval(&store, n).await);
    }

    let warden = UserId::new();
    let tasks = students.iter().map(|student| {
        let coordinator = coordinator.clone();
        let cmd = AllocateCommand {
            student_id: student.id,
            hostel_id: hostel.id,
            room_id: room.id,
            bed_label: "A".to_string(),
            semester: "2026-spring".to_string(),
            allocated_by: warden,
        };
        tokio::spawn(async move { coordinator.allocate(cmd).await })
    });

    let results: Vec<_> = join_all(tasks).await;

    let mut granted = 0;
    for result in results {
        match result.unwrap() {
            Ok(allocation) => {
                assert_eq!(allocation.status, AllocationStatus::Active);
                granted += 1;
            }
            Err(AllocationError::Capacity { .. }) => {}
            Err(other) => panic!("unexpected allocation failure: {other}"),
        }
    }
    assert_eq!(granted, 2, "exactly capacity-many requests may win");

    let room_after = store.get_room(&room.id).await.unwrap().unwrap();
    assert_eq!(room_after.occupied, 2);
}

#[tokio::test]
async fn one_student_racing_for_many_rooms_gets_one_bed() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = AllocationCoordinator::new(Arc::clone(&store), Arc::new(SystemClock));

    let now = Utc::now();
    let hostel = Hostel {
        id: HostelId::new(),
        name: "Contested Wing".to_string(),
        gender_policy: None,
        active: true,
        created_at: now,
        updated_at: now,
    };
    store.create_hostel(hostel.clone()).await.unwrap();

    let mut rooms = Vec::new();
    for n in 0..4 {
        let room = Room {
            id: RoomId::new(),
            hostel_id: hostel.id,
            room_number: format!("10{n}"),
            capacity: 2,
            occupied: 0,
            floor: None,
            block: None,
            created_at: now,
            updated_at: now,
        };
        store.create_room(room.clone()).await.unwrap();
        rooms.push(room);
    }

    let student = seed_student_with_approval(&store, 0).await;
    let warden = UserId::new();

    let tasks = rooms.iter().map(|room| {
        let coordinator = coordinator.clone();
        let cmd = AllocateCommand {
            student_id: student.id,
            hostel_id: hostel.id,
            room_id: room.id,
            bed_label: "A".to_string(),
            semester: "2026-spring".to_string(),
            allocated_by: warden,
        };
        tokio::spawn(async move { coordinator.allocate(cmd).await })
    });

    let results: Vec<_> = join_all(tasks).await;
    let granted = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(granted, 1, "a student holds at most one active allocation");

    let active = coordinator
        .list_allocations(AllocationFilter {
            student_id: Some(student.id),
            status: Some(AllocationStatus::Active),
            ..AllocationFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
}
