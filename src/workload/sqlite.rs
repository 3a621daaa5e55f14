//! SQLite-backed [`WorkloadStore`].
//!
//! Conditional writes are single `UPDATE ... WHERE` statements; the affected
//! row count decides between [`UpdateOutcome::Applied`] and
//! [`UpdateOutcome::Stale`], so several manager processes can share one
//! database file safely.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::database::DatabaseManager;

use super::error::StoreError;
use super::status::WorkloadStatus;
use super::store::WorkloadStore;
use super::types::{UpdateOutcome, Workload, WorkloadFilter, WorkloadLabel};

const WORKLOAD_COLUMNS: &str =
    "id, dataplane_id, status, created_at_ns, updated_at_ns, last_heartbeat_at_ns";

#[derive(Debug, Clone)]
pub struct SqliteWorkloadStore {
    pool: SqlitePool,
}

impl SqliteWorkloadStore {
    pub fn new(database: &DatabaseManager) -> Self {
        Self::from_pool(database.pool().clone())
    }

    /// The pool must already carry the workload migrations.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_labels(&self, id: &str) -> Result<Vec<WorkloadLabel>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT label_key, label_value
            FROM workload_labels
            WHERE workload_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<WorkloadLabel, StoreError> {
                Ok(WorkloadLabel {
                    key: row.try_get("label_key")?,
                    value: row.try_get("label_value")?,
                })
            })
            .collect()
    }

    async fn hydrate(&self, row: SqliteRow) -> Result<Workload, StoreError> {
        let id: String = row.try_get("id")?;
        let status: String = row.try_get("status")?;
        let status = status.parse::<WorkloadStatus>().map_err(|e| StoreError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        let created_at = ns_to_dt(row.try_get("created_at_ns")?);
        let updated_at = ns_to_dt(row.try_get("updated_at_ns")?);
        let last_heartbeat_at = row
            .try_get::<Option<i64>, _>("last_heartbeat_at_ns")?
            .map(ns_to_dt);
        let labels = self.load_labels(&id).await?;

        Ok(Workload {
            dataplane_id: row.try_get("dataplane_id")?,
            id,
            status,
            created_at,
            updated_at,
            last_heartbeat_at,
            labels,
        })
    }

    /// Tell a failed condition apart from a missing row.
    async fn stale_or_missing(&self, id: &str) -> Result<UpdateOutcome, StoreError> {
        if self.exists(id).await? {
            Ok(UpdateOutcome::Stale)
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }
}

#[async_trait]
impl WorkloadStore for SqliteWorkloadStore {
    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM workloads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn get(&self, id: &str) -> Result<Option<Workload>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {WORKLOAD_COLUMNS} FROM workloads WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, mut workload: Workload) -> Result<Workload, StoreError> {
        let now = Utc::now();
        let now_ns = dt_to_ns(now)?;
        let last_heartbeat_ns = workload.last_heartbeat_at.map(dt_to_ns).transpose()?;

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO workloads
                (id, dataplane_id, status, created_at_ns, updated_at_ns, last_heartbeat_at_ns)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&workload.id)
        .bind(workload.dataplane_id.as_deref())
        .bind(workload.status.as_str())
        .bind(now_ns)
        .bind(now_ns)
        .bind(last_heartbeat_ns)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(StoreError::Conflict(workload.id));
            }
            Err(e) => return Err(e.into()),
        }

        for (position, label) in workload.labels.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO workload_labels (workload_id, position, label_key, label_value)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&workload.id)
            .bind(position as i64)
            .bind(&label.key)
            .bind(&label.value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        workload.created_at = now;
        workload.updated_at = now;
        debug!(workload_id = %workload.id, labels = workload.labels.len(), "Inserted workload row");
        Ok(workload)
    }

    async fn search(&self, filter: &WorkloadFilter) -> Result<Vec<Workload>, StoreError> {
        if filter.matches_nothing() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {WORKLOAD_COLUMNS} FROM workloads WHERE 1 = 1"
        ));

        if let Some(dataplane_ids) = &filter.dataplane_ids {
            query.push(" AND dataplane_id IN (");
            {
                let mut separated = query.separated(", ");
                for dataplane_id in dataplane_ids {
                    separated.push_bind(dataplane_id.clone());
                }
            }
            query.push(")");
        }

        if let Some(statuses) = &filter.statuses {
            query.push(" AND status IN (");
            {
                let mut separated = query.separated(", ");
                for status in statuses {
                    separated.push_bind(status.as_str());
                }
            }
            query.push(")");
        }

        if let Some(cutoff) = filter.updated_before {
            query.push(" AND updated_at_ns < ");
            query.push_bind(cutoff_to_ns(cutoff));
        }

        query.push(" ORDER BY created_at_ns ASC, id ASC");

        let rows = query.build().fetch_all(&self.pool).await?;
        let mut workloads = Vec::with_capacity(rows.len());
        for row in rows {
            workloads.push(self.hydrate(row).await?);
        }
        Ok(workloads)
    }

    async fn update_status(&self, id: &str, status: WorkloadStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE workloads SET status = ?, updated_at_ns = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(dt_to_ns(Utc::now())?)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn update_status_and_dataplane(
        &self,
        id: &str,
        expected: WorkloadStatus,
        status: WorkloadStatus,
        dataplane_id: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE workloads
            SET status = ?, dataplane_id = ?, updated_at_ns = ?
            WHERE id = ? AND status = ? AND (dataplane_id IS NULL OR dataplane_id = ?)
            "#,
        )
        .bind(status.as_str())
        .bind(dataplane_id)
        .bind(dt_to_ns(Utc::now())?)
        .bind(id)
        .bind(expected.as_str())
        .bind(dataplane_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return self.stale_or_missing(id).await;
        }
        Ok(UpdateOutcome::Applied)
    }

    async fn update_status_and_heartbeat(
        &self,
        id: &str,
        expected: WorkloadStatus,
        status: WorkloadStatus,
        heartbeat_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE workloads
            SET status = ?, last_heartbeat_at_ns = ?, updated_at_ns = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(status.as_str())
        .bind(dt_to_ns(heartbeat_at)?)
        .bind(dt_to_ns(Utc::now())?)
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return self.stale_or_missing(id).await;
        }
        Ok(UpdateOutcome::Applied)
    }
}

// Nanoseconds keep chrono's full precision, so stored times compare exactly
// against times taken in memory.
fn dt_to_ns(at: DateTime<Utc>) -> Result<i64, StoreError> {
    at.timestamp_nanos_opt()
        .ok_or(StoreError::TimestampOutOfRange { at })
}

fn ns_to_dt(ns: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(ns)
}

/// Cutoffs past either end of the storable range still filter correctly.
fn cutoff_to_ns(cutoff: DateTime<Utc>) -> i64 {
    cutoff.timestamp_nanos_opt().unwrap_or(if cutoff.timestamp() > 0 {
        i64::MAX
    } else {
        i64::MIN
    })
}
