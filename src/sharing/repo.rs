use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::sharing::repo_types::AccessGrant;

/// Grant store contract. `find_valid` checks code equality and expiry in a
/// single read: `expires_at` must be strictly after `now`, so a grant read
/// exactly at its expiry instant is already expired. Grants are never
/// deleted; stale rows just stop matching.
#[async_trait]
pub trait AccessGrantStore: Send + Sync {
    async fn insert(
        &self,
        record_id: &str,
        code: &str,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<AccessGrant>;
    async fn find_valid(
        &self,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<AccessGrant>>;
}

pub struct PgAccessGrantStore {
    db: PgPool,
}

impl PgAccessGrantStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccessGrantStore for PgAccessGrantStore {
    async fn insert(
        &self,
        record_id: &str,
        code: &str,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<AccessGrant> {
        let grant = sqlx::query_as::<_, AccessGrant>(
            r#"
            INSERT INTO access_grants (id, record_id, code, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, record_id, code, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record_id)
        .bind(code)
        .bind(expires_at)
        .bind(created_at)
        .fetch_one(&self.db)
        .await?;
        Ok(grant)
    }

    async fn find_valid(
        &self,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<AccessGrant>> {
        let grant = sqlx::query_as::<_, AccessGrant>(
            r#"
            SELECT id, record_id, code, expires_at, created_at
            FROM access_grants
            WHERE code = $1 AND expires_at > $2
            LIMIT 1
            "#,
        )
        .bind(code)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;
        Ok(grant)
    }
}

/// HashMap-backed store for tests and local runs without Postgres,
/// keyed by code like the persisted table's lookup index.
#[derive(Default)]
pub struct MemoryAccessGrantStore {
    grants: Mutex<HashMap<String, AccessGrant>>,
}

impl MemoryAccessGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessGrantStore for MemoryAccessGrantStore {
    async fn insert(
        &self,
        record_id: &str,
        code: &str,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<AccessGrant> {
        let mut grants = self
            .grants
            .lock()
            .map_err(|e| anyhow::anyhow!("grant store lock poisoned: {e}"))?;
        let grant = AccessGrant {
            id: Uuid::new_v4(),
            record_id: record_id.to_string(),
            code: code.to_string(),
            expires_at,
            created_at,
        };
        grants.insert(grant.code.clone(), grant.clone());
        Ok(grant)
    }

    async fn find_valid(
        &self,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<AccessGrant>> {
        let grants = self
            .grants
            .lock()
            .map_err(|e| anyhow::anyhow!("grant store lock poisoned: {e}"))?;
        Ok(grants.get(code).filter(|g| g.expires_at > now).cloned())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use time::Duration;

    use super::*;

    #[tokio::test]
    async fn find_valid_respects_the_expiry_boundary() {
        let store = MemoryAccessGrantStore::new();
        let created = datetime!(2026-01-01 00:00 UTC);
        let expires = created + Duration::hours(1);
        store
            .insert("some-record", "abc123xy", created, expires)
            .await
            .expect("insert");

        assert!(store
            .find_valid("abc123xy", created)
            .await
            .expect("query")
            .is_some());
        // Strictly-greater comparison: exactly at expiry is expired.
        assert!(store
            .find_valid("abc123xy", expires)
            .await
            .expect("query")
            .is_none());
        assert!(store
            .find_valid("abc123xy", expires + Duration::seconds(1))
            .await
            .expect("query")
            .is_none());
    }

    #[tokio::test]
    async fn unknown_code_is_none() {
        let store = MemoryAccessGrantStore::new();
        assert!(store
            .find_valid("neverseen", datetime!(2026-01-01 00:00 UTC))
            .await
            .expect("query")
            .is_none());
    }
}
