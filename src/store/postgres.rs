use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{Identity, IdentityStore, NewIdentity, Role};

type IdentityRow = (
    Uuid,
    String,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
);

const IDENTITY_COLUMNS: &str =
    "id, username, email, password_hash, role, refresh_token_hash, created_at";

/// PostgreSQL-backed identity store.
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_identity(row: IdentityRow) -> Result<Identity, StoreError> {
    let (id, username, email, password_hash, role, refresh_token_hash, created_at) = row;
    let role = Role::parse(&role)
        .ok_or_else(|| StoreError::UnexpectedError(format!("unknown role value: {}", role)))?;

    Ok(Identity {
        id,
        username,
        email,
        password_hash,
        role,
        refresh_token_hash,
        created_at,
    })
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {} FROM identities WHERE id = $1",
            IDENTITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_identity).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {} FROM identities WHERE email = $1",
            IDENTITY_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_identity).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {} FROM identities WHERE username = $1",
            IDENTITY_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_identity).transpose()
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO identities (id, username, email, password_hash, role, refresh_token_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(&identity.refresh_token_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Identity {
            id,
            username: identity.username,
            email: identity.email,
            password_hash: identity.password_hash,
            role: identity.role,
            refresh_token_hash: identity.refresh_token_hash,
            created_at,
        })
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        sqlx::query("UPDATE identities SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_refresh_hash(&self, id: Uuid, hash: Option<String>) -> Result<(), StoreError> {
        sqlx::query("UPDATE identities SET refresh_token_hash = $1 WHERE id = $2")
            .bind(hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn swap_refresh_hash(
        &self,
        id: Uuid,
        current: Option<&str>,
        next: Option<String>,
    ) -> Result<bool, StoreError> {
        // IS NOT DISTINCT FROM makes the guard work for the NULL case too.
        let result = sqlx::query(
            r#"
            UPDATE identities
            SET refresh_token_hash = $1
            WHERE id = $2 AND refresh_token_hash IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(next)
        .bind(id)
        .bind(current)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
