use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::records::repo_types::HealthRecord;

/// Health record store contract. `find_by_id` takes the id as a string
/// because share grants carry free-form record ids; anything that does not
/// parse is simply not found.
#[async_trait]
pub trait HealthRecordStore: Send + Sync {
    async fn list_by_owner(&self, owner_id: &str) -> anyhow::Result<Vec<HealthRecord>>;
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<HealthRecord>>;
    async fn create(
        &self,
        owner_id: &str,
        category: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<HealthRecord>;
    async fn update(
        &self,
        id: Uuid,
        category: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<bool>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

pub struct PgHealthRecordStore {
    db: PgPool,
}

impl PgHealthRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HealthRecordStore for PgHealthRecordStore {
    async fn list_by_owner(&self, owner_id: &str) -> anyhow::Result<Vec<HealthRecord>> {
        let rows = sqlx::query_as::<_, HealthRecord>(
            r#"
            SELECT id, owner_id, category, data, created_at
            FROM health_records
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<HealthRecord>> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let record = sqlx::query_as::<_, HealthRecord>(
            r#"
            SELECT id, owner_id, category, data, created_at
            FROM health_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(record)
    }

    async fn create(
        &self,
        owner_id: &str,
        category: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<HealthRecord> {
        let record = sqlx::query_as::<_, HealthRecord>(
            r#"
            INSERT INTO health_records (id, owner_id, category, data)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, category, data, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(category)
        .bind(data)
        .fetch_one(&self.db)
        .await?;
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        category: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE health_records
            SET category = $2, data = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(category)
        .bind(data)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM health_records WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// HashMap-backed store for tests and local runs without Postgres.
#[derive(Default)]
pub struct MemoryHealthRecordStore {
    records: Mutex<HashMap<Uuid, HealthRecord>>,
}

impl MemoryHealthRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HealthRecordStore for MemoryHealthRecordStore {
    async fn list_by_owner(&self, owner_id: &str) -> anyhow::Result<Vec<HealthRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|e| anyhow::anyhow!("record store lock poisoned: {e}"))?;
        let mut rows: Vec<HealthRecord> = records
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<HealthRecord>> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let records = self
            .records
            .lock()
            .map_err(|e| anyhow::anyhow!("record store lock poisoned: {e}"))?;
        Ok(records.get(&id).cloned())
    }

    async fn create(
        &self,
        owner_id: &str,
        category: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<HealthRecord> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| anyhow::anyhow!("record store lock poisoned: {e}"))?;
        let record = HealthRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            category: category.to_string(),
            data,
            created_at: OffsetDateTime::now_utc(),
        };
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        category: &str,
        data: serde_json::Value,
    ) -> anyhow::Result<bool> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| anyhow::anyhow!("record store lock poisoned: {e}"))?;
        match records.get_mut(&id) {
            Some(record) => {
                record.category = category.to_string();
                record.data = data;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| anyhow::anyhow!("record store lock poisoned: {e}"))?;
        Ok(records.remove(&id).is_some())
    }
}
