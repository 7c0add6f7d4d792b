//! Hostel allocation service binary.
//!
//! Boots the in-memory store, seeds the bootstrap admin account, and serves
//! the HTTP API until SIGINT/SIGTERM.

use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostel_allocation::auth::StaticTokenVerifier;
use hostel_allocation::clock::{Clock, SystemClock};
use hostel_allocation::config::Config;
use hostel_allocation::server::{build_router, AppState};
use hostel_allocation::store::memory::MemoryStore;
use hostel_allocation::store::UserStore;
use hostel_allocation::types::{Gender, Principal, Role, User, UserId};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostel_allocation=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hostel Allocation Service");

    let config = Config::from_env();
    info!(addr = %config.server.addr(), "Configuration loaded");

    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(SystemClock);

    // Bootstrap admin: without one, no caller is authorized to create users.
    let now = clock.now();
    let admin = User {
        id: UserId::new(),
        email: config.auth.admin_email.clone(),
        full_name: "Bootstrap Admin".to_string(),
        role: Role::Admin,
        gender: Gender::Female,
        created_at: now,
        updated_at: now,
    };
    store.create_user(admin.clone()).await?;
    let verifier = StaticTokenVerifier::new().with_token(
        config.auth.admin_token.clone(),
        Principal {
            id: admin.id,
            role: Role::Admin,
        },
    );
    info!(admin_id = %admin.id, email = %admin.email, "Bootstrap admin seeded");

    let state = AppState::new(store, Arc::new(verifier), clock);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.addr()).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
