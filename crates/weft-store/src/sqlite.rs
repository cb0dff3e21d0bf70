use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use weft_flow::FlowDefinition;

use crate::types::{ExecutionLogEntry, ExecutionPatch, ExecutionRecord, ExecutionStatus};
use crate::{FlowStore, LogSink, StoreError};

/// SQLite-backed store implementing both collaborator traits.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a store on an existing connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if missing) a database file and run migrations.
  pub async fn connect(path: &std::path::Path) -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), StoreError> {
    sqlx::migrate!("../../migrations")
      .run(&self.pool)
      .await
      .map_err(|e| StoreError::Database(e.into()))
  }

  /// Insert or replace a flow definition.
  pub async fn upsert_flow(&self, flow: &FlowDefinition) -> Result<(), StoreError> {
    let definition = serde_json::to_string(flow)?;
    sqlx::query(
      r#"
      INSERT INTO flows (id, definition) VALUES (?, ?)
      ON CONFLICT (id) DO UPDATE SET definition = excluded.definition
      "#,
    )
    .bind(&flow.id)
    .bind(&definition)
    .execute(&self.pool)
    .await?;

    Ok(())
  }
}

#[async_trait]
impl FlowStore for SqliteStore {
  async fn get_flow_with_details(
    &self,
    flow_id: &str,
  ) -> Result<Option<FlowDefinition>, StoreError> {
    let row: Option<(String,)> = sqlx::query_as(
      r#"
      SELECT definition FROM flows WHERE id = ?
      "#,
    )
    .bind(flow_id)
    .fetch_optional(&self.pool)
    .await?;

    match row {
      Some((definition,)) => Ok(Some(serde_json::from_str(&definition)?)),
      None => Ok(None),
    }
  }
}

#[async_trait]
impl LogSink for SqliteStore {
  async fn create_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO flow_executions
        (id, flow_id, status, "trigger", triggered_by, chain, error, started_at, finished_at)
      VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
      "#,
    )
    .bind(&record.id)
    .bind(&record.flow_id)
    .bind(record.status)
    .bind(&record.trigger)
    .bind(&record.triggered_by)
    .bind(&record.chain)
    .bind(&record.error)
    .bind(record.started_at)
    .bind(record.finished_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn update_execution_status(
    &self,
    execution_id: &str,
    status: ExecutionStatus,
    patch: ExecutionPatch,
  ) -> Result<(), StoreError> {
    let result = sqlx::query(
      r#"
      UPDATE flow_executions
      SET status = ?,
          chain = COALESCE(?, chain),
          error = COALESCE(?, error),
          finished_at = COALESCE(?, finished_at)
      WHERE id = ?
      "#,
    )
    .bind(status)
    .bind(patch.chain.map(sqlx::types::Json))
    .bind(patch.error.map(sqlx::types::Json))
    .bind(patch.finished_at)
    .bind(execution_id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound(format!("execution '{execution_id}'")));
    }
    Ok(())
  }

  async fn add_execution_log(&self, entry: &ExecutionLogEntry) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO flow_execution_logs
        (id, execution_id, operation_id, operation_key, status, input, output, error,
         duration_ms, created_at)
      VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
      "#,
    )
    .bind(&entry.id)
    .bind(&entry.execution_id)
    .bind(&entry.operation_id)
    .bind(&entry.operation_key)
    .bind(entry.status)
    .bind(&entry.input)
    .bind(&entry.output)
    .bind(&entry.error)
    .bind(entry.duration_ms)
    .bind(entry.created_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError> {
    sqlx::query_as(
      r#"
      SELECT id, flow_id, status, "trigger", triggered_by, chain, error, started_at, finished_at
      FROM flow_executions
      WHERE id = ?
      "#,
    )
    .bind(execution_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("execution '{execution_id}'")))
  }

  async fn list_executions(&self, flow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError> {
    sqlx::query_as(
      r#"
      SELECT id, flow_id, status, "trigger", triggered_by, chain, error, started_at, finished_at
      FROM flow_executions
      WHERE flow_id = ?
      ORDER BY started_at DESC
      "#,
    )
    .bind(flow_id)
    .fetch_all(&self.pool)
    .await
    .map_err(StoreError::Database)
  }

  async fn list_execution_logs(
    &self,
    execution_id: &str,
  ) -> Result<Vec<ExecutionLogEntry>, StoreError> {
    sqlx::query_as(
      r#"
      SELECT id, execution_id, operation_id, operation_key, status, input, output, error,
             duration_ms, created_at
      FROM flow_execution_logs
      WHERE execution_id = ?
      ORDER BY created_at ASC, id ASC
      "#,
    )
    .bind(execution_id)
    .fetch_all(&self.pool)
    .await
    .map_err(StoreError::Database)
  }
}
