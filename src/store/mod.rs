/// Identity persistence.
///
/// The token protocol only ever touches the store through the
/// `IdentityStore` trait: point lookups, one insert, and point updates of
/// the role and refresh-hash fields. Rotation goes through
/// `swap_refresh_hash`, a conditional update, so two concurrent refresh
/// attempts cannot both win (the loser sees a failed swap and is rejected).

mod postgres;

pub use postgres::PgIdentityStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Identity role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "MEMBER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "MEMBER" => Some(Role::Member),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// A persisted user record.
///
/// `password_hash` and `refresh_token_hash` never leave the server; any
/// externally returned representation is built from the other fields.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a new identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub refresh_token_hash: Option<String>,
}

/// Operations the token protocol needs from its persistence collaborator.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError>;

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError>;

    /// Unconditional point update of the stored refresh hash.
    async fn set_refresh_hash(&self, id: Uuid, hash: Option<String>) -> Result<(), StoreError>;

    /// Writes `next` only if the stored hash still equals `current`.
    /// Returns whether the swap happened. A `false` result means a
    /// concurrent rotation won and the caller's token is stale.
    async fn swap_refresh_hash(
        &self,
        id: Uuid,
        current: Option<&str>,
        next: Option<String>,
    ) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!(Role::parse(Role::Member.as_str()), Some(Role::Member));
        assert_eq!(Role::parse(Role::Admin.as_str()), Some(Role::Admin));
        assert_eq!(Role::parse("OWNER"), None);
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"MEMBER\"");
    }
}
