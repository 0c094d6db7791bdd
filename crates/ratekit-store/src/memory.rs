//! In-process collaborator backed by hash maps.
//!
//! Mirrors the Postgres collaborator's observable behavior (generated ids,
//! ordering, append-only tables) closely enough for tests and offline CLI
//! runs. State lives only as long as the value.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ratekit_core::{Account, SessionToken};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::collaborator::{
    check_insert, check_patch, Collaborator, CollaboratorError, OrderBy, Row, RowFilter, Table,
};

#[derive(Debug, Default)]
struct MemoryState {
    sessions: HashMap<String, Account>,
    tables: HashMap<Table, Vec<Row>>,
    last_created_at: Option<DateTime<Utc>>,
    unavailable: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryCollaborator {
    state: Mutex<MemoryState>,
}

impl InMemoryCollaborator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as a live session for `account`.
    pub async fn add_session(&self, token: &str, account: Account) {
        self.state
            .lock()
            .await
            .sessions
            .insert(token.to_string(), account);
    }

    /// Simulate an outage: every call fails with `Unavailable` while set.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    pub async fn row_count(&self, table: Table) -> usize {
        self.state
            .lock()
            .await
            .tables
            .get(&table)
            .map_or(0, Vec::len)
    }
}

impl MemoryState {
    fn ensure_available(&self) -> Result<(), CollaboratorError> {
        if self.unavailable {
            Err(CollaboratorError::Unavailable(
                "in-memory collaborator marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    /// Timestamps are strictly increasing so ordering is deterministic even
    /// when inserts land within the same clock tick.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_created_at {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(next);
        next
    }
}

fn matches(row: &Row, filter: &RowFilter) -> bool {
    let field_is = |key: &str, expected: &str| row.get(key).and_then(Value::as_str) == Some(expected);

    filter.id.is_none_or(|id| field_is("id", &id.to_string()))
        && filter
            .user_id
            .is_none_or(|user| field_is("user_id", &user.to_string()))
        && filter
            .platform
            .as_deref()
            .is_none_or(|platform| field_is("platform", platform))
}

fn sort_key(row: &Row) -> (String, String) {
    let text = |key: &str| {
        row.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    (text("created_at"), text("id"))
}

#[async_trait]
impl Collaborator for InMemoryCollaborator {
    async fn authenticate(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Account>, CollaboratorError> {
        let state = self.state.lock().await;
        state.ensure_available()?;
        Ok(state.sessions.get(token.as_str()).copied())
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, CollaboratorError> {
        let mut state = self.state.lock().await;
        state.ensure_available()?;
        check_insert(table, &row)?;

        let created_at = state.next_created_at();
        row.insert("id".to_string(), Value::from(Uuid::new_v4().to_string()));
        row.insert(
            "created_at".to_string(),
            Value::from(created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        state.tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn select(
        &self,
        table: Table,
        filter: &RowFilter,
        order: OrderBy,
        limit: Option<i64>,
    ) -> Result<Vec<Row>, CollaboratorError> {
        let state = self.state.lock().await;
        state.ensure_available()?;

        let limit = match limit {
            Some(n) => usize::try_from(n).map_err(|_| {
                CollaboratorError::Rejected(format!("limit must be non-negative, got {n}"))
            })?,
            None => usize::MAX,
        };

        let mut rows: Vec<Row> = state
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| matches(r, filter)).cloned().collect())
            .unwrap_or_default();

        rows.sort_by_cached_key(sort_key);
        if order == OrderBy::CreatedAtDesc {
            rows.reverse();
        }
        rows.truncate(limit);
        Ok(rows)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> Result<Row, CollaboratorError> {
        let mut state = self.state.lock().await;
        state.ensure_available()?;
        check_patch(table, &patch)?;

        let row = state
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| matches(r, &RowFilter::by_id(id))))
            .ok_or(CollaboratorError::NotFound)?;
        row.extend(patch);
        Ok(row.clone())
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock().await;
        state.ensure_available()?;

        let rows = state.tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| !matches(r, &RowFilter::by_id(id)));
        if rows.len() == before {
            return Err(CollaboratorError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CollaboratorError> {
        self.state.lock().await.ensure_available()
    }
}
