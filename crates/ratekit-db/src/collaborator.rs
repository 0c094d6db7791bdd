//! [`Collaborator`] backed by Postgres.
//!
//! Rows cross the boundary as JSON objects: inserts go through
//! `jsonb_populate_record` and reads come back as `to_jsonb(t)`, so one set
//! of statements serves every table.

use async_trait::async_trait;
use ratekit_core::{Account, SessionToken};
use ratekit_store::{
    check_insert, check_patch, Collaborator, CollaboratorError, OrderBy, Row, RowFilter, Table,
};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::accounts::find_session_account;
use crate::DbError;

#[derive(Clone)]
pub struct PgCollaborator {
    pool: PgPool,
    token_hash_salt: String,
}

impl std::fmt::Debug for PgCollaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCollaborator")
            .field("pool_size", &self.pool.size())
            .field("token_hash_salt", &"[redacted]")
            .finish()
    }
}

impl PgCollaborator {
    #[must_use]
    pub fn new(pool: PgPool, token_hash_salt: impl Into<String>) -> Self {
        Self {
            pool,
            token_hash_salt: token_hash_salt.into(),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx(err: sqlx::Error) -> CollaboratorError {
    match err {
        sqlx::Error::RowNotFound => CollaboratorError::NotFound,
        sqlx::Error::Database(db) => CollaboratorError::Rejected(db.message().to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => CollaboratorError::Malformed {
            table: "unknown".to_string(),
            reason: err.to_string(),
        },
        other => CollaboratorError::Unavailable(other.to_string()),
    }
}

fn map_db(err: DbError) -> CollaboratorError {
    match err {
        DbError::Sqlx(e) => map_sqlx(e),
        DbError::NotFound => CollaboratorError::NotFound,
        other => CollaboratorError::Unavailable(other.to_string()),
    }
}

fn expect_object(table: Table, value: Value) -> Result<Row, CollaboratorError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(CollaboratorError::Malformed {
            table: table.to_string(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

fn order_clause(order: OrderBy) -> &'static str {
    match order {
        OrderBy::CreatedAtDesc => "t.created_at DESC, t.id DESC",
        OrderBy::CreatedAtAsc => "t.created_at ASC, t.id ASC",
    }
}

#[async_trait]
impl Collaborator for PgCollaborator {
    async fn authenticate(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Account>, CollaboratorError> {
        find_session_account(&self.pool, &self.token_hash_salt, token)
            .await
            .map_err(map_db)
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, CollaboratorError> {
        check_insert(table, &row)?;
        let columns = table.insert_columns().join(", ");
        // Table and column names come from static lists, never from input.
        let sql = format!(
            "INSERT INTO {table} AS t ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING to_jsonb(t)"
        );
        let stored: Value = sqlx::query_scalar(&sql)
            .bind(Value::Object(row))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        expect_object(table, stored)
    }

    async fn select(
        &self,
        table: Table,
        filter: &RowFilter,
        order: OrderBy,
        limit: Option<i64>,
    ) -> Result<Vec<Row>, CollaboratorError> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {table} t \
             WHERE ($1::uuid IS NULL OR t.id = $1) \
               AND ($2::uuid IS NULL OR t.user_id = $2) \
               AND ($3::text IS NULL OR t.platform = $3) \
             ORDER BY {order} \
             LIMIT $4",
            order = order_clause(order),
        );
        let rows: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(filter.id)
            .bind(filter.user_id)
            .bind(filter.platform.as_deref())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.into_iter()
            .map(|value| expect_object(table, value))
            .collect()
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> Result<Row, CollaboratorError> {
        check_patch(table, &patch)?;
        let columns = patch.keys().cloned().collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE {table} AS t SET ({columns}) = \
               (SELECT {columns} FROM jsonb_populate_record(t, $2)) \
             WHERE t.id = $1 \
             RETURNING to_jsonb(t)"
        );
        let stored: Option<Value> = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(Value::Object(patch))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        expect_object(table, stored.ok_or(CollaboratorError::NotFound)?)
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), CollaboratorError> {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(CollaboratorError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CollaboratorError> {
        crate::ping(&self.pool).await.map_err(map_sqlx)
    }
}
