//! Shared harness for the integration tests: an in-memory identity store
//! and RSA key fixtures, wired into the same app configuration the
//! production binary uses.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use authgate::auth::TokenKeys;
use authgate::configuration::AuthSettings;
use authgate::error::StoreError;
use authgate::store::{Identity, IdentityStore, NewIdentity, Role};

pub fn fixture_settings(access_minutes: i64, refresh_minutes: i64) -> AuthSettings {
    AuthSettings {
        access_private_key: include_str!("../fixtures/access_private.b64").to_string(),
        access_public_key: include_str!("../fixtures/access_public.b64").to_string(),
        refresh_private_key: include_str!("../fixtures/refresh_private.b64").to_string(),
        refresh_public_key: include_str!("../fixtures/refresh_public.b64").to_string(),
        access_token_expiry_minutes: access_minutes,
        refresh_token_expiry_minutes: refresh_minutes,
    }
}

pub fn test_keys() -> TokenKeys {
    TokenKeys::from_settings(&fixture_settings(15, 60)).expect("fixture keys should load")
}

/// Keys whose tokens are already expired when issued (same key material).
pub fn expired_keys() -> TokenKeys {
    TokenKeys::from_settings(&fixture_settings(-5, -5)).expect("fixture keys should load")
}

/// In-memory `IdentityStore` used in place of PostgreSQL.
pub struct MemoryStore {
    identities: Mutex<HashMap<Uuid, Identity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            identities: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Identity> {
        self.identities.lock().unwrap().get(&id).cloned()
    }

    pub fn get_by_email(&self, email: &str) -> Option<Identity> {
        self.identities
            .lock()
            .unwrap()
            .values()
            .find(|i| i.email == email)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.identities.lock().unwrap().len()
    }

    pub fn remove(&self, id: Uuid) {
        self.identities.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .values()
            .find(|i| i.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .values()
            .find(|i| i.username == username)
            .cloned())
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let identity = Identity {
            id: Uuid::new_v4(),
            username: identity.username,
            email: identity.email,
            password_hash: identity.password_hash,
            role: identity.role,
            refresh_token_hash: identity.refresh_token_hash,
            created_at: Utc::now(),
        };
        self.identities
            .lock()
            .unwrap()
            .insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        if let Some(identity) = self.identities.lock().unwrap().get_mut(&id) {
            identity.role = role;
        }
        Ok(())
    }

    async fn set_refresh_hash(&self, id: Uuid, hash: Option<String>) -> Result<(), StoreError> {
        if let Some(identity) = self.identities.lock().unwrap().get_mut(&id) {
            identity.refresh_token_hash = hash;
        }
        Ok(())
    }

    async fn swap_refresh_hash(
        &self,
        id: Uuid,
        current: Option<&str>,
        next: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut identities = self.identities.lock().unwrap();
        match identities.get_mut(&id) {
            Some(identity) if identity.refresh_token_hash.as_deref() == current => {
                identity.refresh_token_hash = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// App data handle over a shared `MemoryStore`.
pub fn store_data(store: &Arc<MemoryStore>) -> web::Data<dyn IdentityStore> {
    web::Data::from(Arc::clone(store) as Arc<dyn IdentityStore>)
}
