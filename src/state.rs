/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Built once at startup; cheap to Clone (everything behind Arc)
 */
use std::sync::Arc;

use crate::repos::UserStore;
use crate::services::{auth::AuthzGate, credential::CredentialHasher};

#[derive(Clone)]
pub struct AppState {
    /// Realm every user operation is scoped to.
    pub realm: Arc<str>,
    pub users: Arc<dyn UserStore>,
    pub gate: Arc<AuthzGate>,
    pub credentials: Arc<CredentialHasher>,
}

impl AppState {
    pub fn new(
        realm: impl Into<Arc<str>>,
        users: Arc<dyn UserStore>,
        gate: Arc<AuthzGate>,
        credentials: Arc<CredentialHasher>,
    ) -> Self {
        Self {
            realm: realm.into(),
            users,
            gate,
            credentials,
        }
    }
}
