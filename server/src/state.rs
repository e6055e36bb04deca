//! # Application State
//!
//! Shared state passed to all route handlers. Cloning is cheap: everything
//! behind it is reference counted and read-only apart from the store.

use std::sync::Arc;

use crate::service::CredentialService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CredentialService>,
}

impl AppState {
    pub fn new(service: CredentialService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
