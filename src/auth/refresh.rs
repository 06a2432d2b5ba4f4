/// Refresh-token rotation protocol.
///
/// One refresh attempt runs a fixed chain: verify the presented token's
/// signature, resolve the identity it names, compare the plaintext against
/// the stored bcrypt hash, then rotate. Rotation persists the new hash
/// with a compare-and-swap against the hash that was read, so of two
/// concurrent attempts exactly one wins; the loser is rejected like any
/// stale token. Every failure collapses to the uniform invalid-credential
/// outcome with only the internal cause differing for logs.
///
/// Rotating on every use limits a leaked refresh token to a single use: a
/// replayed token still carries a valid signature but no longer matches
/// the stored hash.

use crate::auth::jwt::{issue_token_pair, verify_token, TokenPair};
use crate::auth::keys::{TokenKeys, TokenKind};
use crate::auth::password::{hash_token_secret, verify_token_secret};
use crate::error::{AppError, AuthError, CredentialFailure};
use crate::store::IdentityStore;

/// Run one refresh attempt with the presented plaintext token.
///
/// Returns the freshly rotated pair, or the uniform credential rejection.
pub async fn rotate_refresh_token(
    presented: Option<String>,
    store: &dyn IdentityStore,
    keys: &TokenKeys,
) -> Result<TokenPair, AppError> {
    let presented = presented
        .ok_or_else(|| AuthError::invalid(CredentialFailure::MissingToken))?;

    let claims = verify_token(keys, TokenKind::Refresh, &presented)
        .ok_or_else(|| AuthError::invalid(CredentialFailure::BadToken))?;
    let subject = claims.subject()?;

    let identity = store
        .find_by_id(subject)
        .await?
        .ok_or_else(|| AuthError::invalid(CredentialFailure::UnknownIdentity))?;

    // Freshness: the presented plaintext must match the hash on record.
    // A signed-out identity (null hash) fails here too.
    let stored_hash = identity
        .refresh_token_hash
        .as_deref()
        .ok_or_else(|| AuthError::invalid(CredentialFailure::StaleRefresh))?;

    if !verify_token_secret(&presented, stored_hash) {
        return Err(AuthError::invalid(CredentialFailure::StaleRefresh).into());
    }

    let pair = issue_token_pair(keys, identity.id).ok_or(AuthError::IssuanceFailed)?;
    let new_hash = hash_token_secret(&pair.refresh_token)?;

    let swapped = store
        .swap_refresh_hash(identity.id, Some(stored_hash), Some(new_hash))
        .await?;

    if !swapped {
        // A concurrent rotation landed between our read and our write.
        return Err(AuthError::invalid(CredentialFailure::StaleRefresh).into());
    }

    tracing::info!(identity_id = %identity.id, "Refresh token rotated");

    Ok(pair)
}

/// Issue a pair for an existing identity and persist the hash of its
/// refresh token, replacing whatever was stored. Used at sign-in.
pub async fn start_session(
    store: &dyn IdentityStore,
    keys: &TokenKeys,
    subject: uuid::Uuid,
) -> Result<TokenPair, AppError> {
    let pair = issue_token_pair(keys, subject).ok_or(AuthError::IssuanceFailed)?;
    let hash = hash_token_secret(&pair.refresh_token)?;

    store.set_refresh_hash(subject, Some(hash)).await?;

    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::test_keys;
    use crate::error::StoreError;
    use crate::store::{Identity, NewIdentity, Role};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Minimal in-process store for protocol tests.
    struct MemoryStore {
        identities: Mutex<HashMap<Uuid, Identity>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                identities: Mutex::new(HashMap::new()),
            }
        }

        fn seed(&self, refresh_hash: Option<String>) -> Uuid {
            let id = Uuid::new_v4();
            let identity = Identity {
                id,
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
                password_hash: "$2b$10$invalid".to_string(),
                role: Role::Member,
                refresh_token_hash: refresh_hash,
                created_at: chrono::Utc::now(),
            };
            self.identities.lock().unwrap().insert(id, identity);
            id
        }

        fn stored_hash(&self, id: Uuid) -> Option<String> {
            self.identities
                .lock()
                .unwrap()
                .get(&id)
                .and_then(|i| i.refresh_token_hash.clone())
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
                created_at: chrono::Utc::now(),
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

        async fn set_refresh_hash(
            &self,
            id: Uuid,
            hash: Option<String>,
        ) -> Result<(), StoreError> {
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

    fn assert_invalid_credential(result: Result<TokenPair, AppError>, expected: CredentialFailure) {
        match result {
            Err(AppError::Auth(AuthError::InvalidCredential { cause })) => {
                assert_eq!(cause, expected)
            }
            other => panic!("expected credential rejection, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let store = MemoryStore::new();
        let keys = test_keys();

        let result = rotate_refresh_token(None, &store, &keys).await;
        assert_invalid_credential(result, CredentialFailure::MissingToken);
    }

    #[tokio::test]
    async fn unsigned_token_is_rejected() {
        let store = MemoryStore::new();
        let keys = test_keys();

        let result =
            rotate_refresh_token(Some("garbage.token.here".to_string()), &store, &keys).await;
        assert_invalid_credential(result, CredentialFailure::BadToken);
    }

    #[tokio::test]
    async fn token_for_unknown_identity_is_rejected() {
        let store = MemoryStore::new();
        let keys = test_keys();

        // Valid signature, but the subject does not exist in the store.
        let pair = issue_token_pair(&keys, Uuid::new_v4()).unwrap();
        let result = rotate_refresh_token(Some(pair.refresh_token), &store, &keys).await;
        assert_invalid_credential(result, CredentialFailure::UnknownIdentity);
    }

    #[tokio::test]
    async fn signed_out_identity_is_rejected() {
        let store = MemoryStore::new();
        let keys = test_keys();

        let id = store.seed(None);
        let pair = issue_token_pair(&keys, id).unwrap();

        let result = rotate_refresh_token(Some(pair.refresh_token), &store, &keys).await;
        assert_invalid_credential(result, CredentialFailure::StaleRefresh);
    }

    #[tokio::test]
    async fn valid_token_rotates_and_updates_stored_hash() {
        let store = MemoryStore::new();
        let keys = test_keys();

        let id = store.seed(None);
        let pair = start_session(&store, &keys, id).await.unwrap();
        let hash_before = store.stored_hash(id).unwrap();

        let rotated = rotate_refresh_token(Some(pair.refresh_token.clone()), &store, &keys)
            .await
            .expect("rotation should succeed");

        assert_ne!(rotated.refresh_token, pair.refresh_token);
        let hash_after = store.stored_hash(id).unwrap();
        assert_ne!(hash_before, hash_after);
        assert!(verify_token_secret(&rotated.refresh_token, &hash_after));
        assert!(!verify_token_secret(&pair.refresh_token, &hash_after));
    }

    #[test]
    fn stored_hash_distinguishes_tokens_for_the_same_subject() {
        let keys = test_keys();
        let subject = Uuid::new_v4();

        let first = issue_token_pair(&keys, subject).unwrap().refresh_token;
        let second = issue_token_pair(&keys, subject).unwrap().refresh_token;

        // Full-length JWTs for one subject share their leading bytes
        // (identical header, payload opening with the same sub claim),
        // so a hash that only covered a prefix could not tell them apart.
        assert_eq!(&first[..72], &second[..72]);
        assert_ne!(first, second);

        let hash = hash_token_secret(&second).unwrap();
        assert!(verify_token_secret(&second, &hash));
        assert!(!verify_token_secret(&first, &hash));
    }

    #[tokio::test]
    async fn replayed_token_is_rejected_after_rotation() {
        let store = MemoryStore::new();
        let keys = test_keys();

        let id = store.seed(None);
        let pair = start_session(&store, &keys, id).await.unwrap();

        rotate_refresh_token(Some(pair.refresh_token.clone()), &store, &keys)
            .await
            .expect("first use should succeed");

        // The signature is still valid; the hash no longer matches.
        let replay = rotate_refresh_token(Some(pair.refresh_token), &store, &keys).await;
        assert_invalid_credential(replay, CredentialFailure::StaleRefresh);
    }

    #[tokio::test]
    async fn lost_swap_is_rejected() {
        let store = MemoryStore::new();
        let keys = test_keys();

        let id = store.seed(None);
        let pair = start_session(&store, &keys, id).await.unwrap();

        // Simulate a concurrent rotation landing first.
        let other_hash = hash_token_secret("competing-rotation").unwrap();
        store.set_refresh_hash(id, Some(other_hash)).await.unwrap();

        let result = rotate_refresh_token(Some(pair.refresh_token), &store, &keys).await;
        assert_invalid_credential(result, CredentialFailure::StaleRefresh);
    }
}
