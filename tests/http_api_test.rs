//! Full-stack HTTP tests: real listener, real client, bearer tokens.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use hostel_allocation::auth::StaticTokenVerifier;
use hostel_allocation::clock::{Clock, SystemClock};
use hostel_allocation::server::{build_router, AppState};
use hostel_allocation::store::memory::MemoryStore;
use hostel_allocation::store::UserStore;
use hostel_allocation::types::{Gender, Principal, Role, User, UserId};

const ADMIN_TOKEN: &str = "test-admin-token";
const WARDEN_TOKEN: &str = "test-warden-token";
const STUDENT_TOKEN: &str = "test-student-token";

struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    student_id: UserId,
}

impl TestServer {
    /// Boots the full router on an ephemeral port with one admin, one warden,
    /// and one student provisioned.
    async fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(SystemClock);

        let now = clock.now();
        let admin = User {
            id: UserId::new(),
            email: "admin@campus.test".to_string(),
            full_name: "Admin".to_string(),
            role: Role::Admin,
            gender: Gender::Female,
            created_at: now,
            updated_at: now,
        };
        let warden = User {
            id: UserId::new(),
            email: "warden@campus.test".to_string(),
            full_name: "Warden".to_string(),
            role: Role::Warden,
            gender: Gender::Female,
            created_at: now,
            updated_at: now,
        };
        let student = User {
            id: UserId::new(),
            email: "student@campus.test".to_string(),
            full_name: "Student".to_string(),
            role: Role::Student,
            gender: Gender::Female,
            created_at: now,
            updated_at: now,
        };
        for user in [&admin, &warden, &student] {
            store.create_user(user.clone()).await.unwrap();
        }

        let verifier = StaticTokenVerifier::new()
            .with_token(
                ADMIN_TOKEN,
                Principal {
                    id: admin.id,
                    role: Role::Admin,
                },
            )
            .with_token(
                WARDEN_TOKEN,
                Principal {
                    id: warden.id,
                    role: Role::Warden,
                },
            )
            .with_token(
                STUDENT_TOKEN,
                Principal {
                    id: student.id,
                    role: Role::Student,
                },
            );

        let state = AppState::new(store, Arc::new(verifier), clock);
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: reqwest::Client::new(),
            student_id: student.id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn patch(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// Creates a hostel and a room, returning their ids.
    async fn seed_housing(&self, capacity: u32) -> (String, String) {
        let hostel: Value = self
            .post(
                WARDEN_TOKEN,
                "/api/hostels",
                json!({ "name": "North Wing", "gender_policy": "female" }),
            )
            .await
            .json()
            .await
            .unwrap();
        let hostel_id = hostel["id"].as_str().unwrap().to_string();

        let room: Value = self
            .post(
                WARDEN_TOKEN,
                "/api/rooms",
                json!({ "hostel_id": hostel_id, "room_number": "101", "capacity": capacity }),
            )
            .await
            .json()
            .await
            .unwrap();
        let room_id = room["id"].as_str().unwrap().to_string();
        (hostel_id, room_id)
    }

    /// Walks the student through submit and approval, returning the
    /// application id.
    async fn approved_application(&self) -> String {
        let response = self
            .post(
                STUDENT_TOKEN,
                "/api/applications",
                json!({ "semester": "2026-spring" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let application: Value = response.json().await.unwrap();
        let id = application["id"].as_str().unwrap().to_string();

        let response = self
            .patch(
                WARDEN_TOKEN,
                &format!("/api/applications/{id}/review"),
                json!({ "decision": "approved" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        id
    }
}

#[tokio::test]
async fn health_needs_no_token() {
    let server = TestServer::start().await;
    let response = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_rejects_missing_and_unknown_tokens() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/api/hostels")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server.get("bogus-token", "/api/hostels").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn students_cannot_reach_staff_endpoints() {
    let server = TestServer::start().await;

    let response = server
        .post(STUDENT_TOKEN, "/api/hostels", json!({ "name": "Rogue Wing" }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server
        .post(
            STUDENT_TOKEN,
            "/api/users",
            json!({
                "email": "x@y.z", "full_name": "X", "role": "student", "gender": "male"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_creation_is_admin_only() {
    let server = TestServer::start().await;

    let body = json!({
        "email": "new@campus.test",
        "full_name": "New Student",
        "role": "student",
        "gender": "male"
    });
    let response = server.post(WARDEN_TOKEN, "/api/users", body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server.post(ADMIN_TOKEN, "/api/users", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Duplicate email is refused.
    let response = server.post(ADMIN_TOKEN, "/api/users", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn allocate_and_cancel_over_http() {
    let server = TestServer::start().await;
    let (hostel_id, room_id) = server.seed_housing(2).await;
    server.approved_application().await;

    let response = server
        .post(
            WARDEN_TOKEN,
            "/api/allocations",
            json!({
                "student_id": server.student_id.as_uuid(),
                "hostel_id": hostel_id,
                "room_id": room_id,
                "bed_label": "A",
                "semester": "2026-spring"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let allocation: Value = response.json().await.unwrap();
    assert_eq!(allocation["status"], "active");
    let allocation_id = allocation["id"].as_str().unwrap().to_string();

    // The student sees it under /mine.
    let response = server.get(STUDENT_TOKEN, "/api/allocations/mine").await;
    let mine: Value = response.json().await.unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // Occupancy reflects the grant.
    let response = server
        .get(WARDEN_TOKEN, &format!("/api/hostels/{hostel_id}/occupancy"))
        .await;
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["total_occupied"], 1);

    // Cancel releases the bed.
    let response = server
        .patch(
            WARDEN_TOKEN,
            &format!("/api/allocations/{allocation_id}/end"),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled: Value = response.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");

    let response = server
        .get(WARDEN_TOKEN, &format!("/api/hostels/{hostel_id}/occupancy"))
        .await;
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["total_occupied"], 0);
}

#[tokio::test]
async fn capacity_and_policy_violations_map_to_conflict_codes() {
    let server = TestServer::start().await;
    let (hostel_id, room_id) = server.seed_housing(1).await;
    server.approved_application().await;

    // Fill the room with another student.
    let other: Value = server
        .post(
            ADMIN_TOKEN,
            "/api/users",
            json!({
                "email": "other@campus.test",
                "full_name": "Other Student",
                "role": "student",
                "gender": "female"
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    let other_id = other["id"].as_str().unwrap().to_string();
    let application: Value = server
        .post(
            WARDEN_TOKEN,
            "/api/applications",
            json!({ "student_id": other_id, "semester": "2026-spring" }),
        )
        .await
        .json()
        .await
        .unwrap();
    server
        .patch(
            WARDEN_TOKEN,
            &format!("/api/applications/{}/review", application["id"].as_str().unwrap()),
            json!({ "decision": "approved" }),
        )
        .await;
    let response = server
        .post(
            WARDEN_TOKEN,
            "/api/allocations",
            json!({
                "student_id": other_id,
                "hostel_id": hostel_id,
                "room_id": room_id,
                "bed_label": "A",
                "semester": "2026-spring"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // The room is full now: 409 with a capacity code.
    let response = server
        .post(
            WARDEN_TOKEN,
            "/api/allocations",
            json!({
                "student_id": server.student_id.as_uuid(),
                "hostel_id": hostel_id,
                "room_id": room_id,
                "bed_label": "A",
                "semester": "2026-spring"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ROOM_FULL");
}

#[tokio::test]
async fn students_cannot_read_each_others_records() {
    let server = TestServer::start().await;
    server.approved_application().await;

    // A second student with their own token.
    let other: Value = server
        .post(
            ADMIN_TOKEN,
            "/api/users",
            json!({
                "email": "peer@campus.test",
                "full_name": "Peer",
                "role": "student",
                "gender": "male"
            }),
        )
        .await
        .json()
        .await
        .unwrap();

    // The first student cannot read the peer's profile.
    let response = server
        .get(
            STUDENT_TOKEN,
            &format!("/api/users/{}", other["id"].as_str().unwrap()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Listing applications as the student yields only their own.
    let response = server.get(STUDENT_TOKEN, "/api/applications").await;
    let applications: Value = response.json().await.unwrap();
    for application in applications.as_array().unwrap() {
        assert_eq!(
            application["student_id"].as_str().unwrap(),
            server.student_id.to_string()
        );
    }
}
