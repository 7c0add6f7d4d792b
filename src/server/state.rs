//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::clock::Clock;
use crate::services::{AllocationCoordinator, ApplicationService};
use crate::store::DocumentStore;

/// Application state: store handle, services, and the token verifier.
///
/// Generic over the store so tests can run the full router against
/// [`crate::store::memory::MemoryStore`] without any server changes.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub coordinator: AllocationCoordinator<S>,
    pub applications: ApplicationService<S>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub clock: Arc<dyn Clock>,
}

// Derived Clone would demand S: Clone; every field is already shared.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            coordinator: self.coordinator.clone(),
            applications: self.applications.clone(),
            verifier: Arc::clone(&self.verifier),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    pub fn new(store: Arc<S>, verifier: Arc<dyn TokenVerifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            coordinator: AllocationCoordinator::new(Arc::clone(&store), Arc::clone(&clock)),
            applications: ApplicationService::new(Arc::clone(&store), Arc::clone(&clock)),
            store,
            verifier,
            clock,
        }
    }
}
