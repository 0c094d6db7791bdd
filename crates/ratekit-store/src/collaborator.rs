//! The account and persistence service the store delegates all I/O to.

use async_trait::async_trait;
use ratekit_core::{Account, SessionToken};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// A row as exchanged with the collaborator: a JSON object keyed by column.
pub type Row = Map<String, Value>;

/// Tables the store reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Flat per-estimate log.
    Calculations,
    /// Named calculation snapshots shown in history.
    SavedCalculations,
}

impl Table {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Calculations => "calculations",
            Table::SavedCalculations => "saved_calculations",
        }
    }

    /// Columns a caller may supply on insert. `id` and `created_at` are
    /// always assigned by the collaborator.
    #[must_use]
    pub fn insert_columns(self) -> &'static [&'static str] {
        match self {
            Table::Calculations => &[
                "user_id",
                "platform",
                "followers",
                "views",
                "likes",
                "comments",
                "subscribers",
                "engagement",
                "content_type",
                "has_discount",
                "estimated_value",
            ],
            Table::SavedCalculations => &[
                "user_id",
                "platform",
                "name",
                "formula_version",
                "data",
                "result",
            ],
        }
    }

    /// Columns that may be changed after insert. Both tables are append-only.
    #[must_use]
    pub fn patchable_columns(self) -> &'static [&'static str] {
        match self {
            Table::Calculations | Table::SavedCalculations => &[],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filters, AND-ed together. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub platform: Option<String>,
}

impl RowFilter {
    #[must_use]
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Option<&str>) -> Self {
        self.platform = platform.map(ToOwned::to_owned);
        self
    }
}

/// Sort order for `select`. Ties on `created_at` are broken by `id` in the
/// same direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    CreatedAtDesc,
    CreatedAtAsc,
}

#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The service could not be reached or timed out.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The service refused the operation (constraint violation, append-only table, ...).
    #[error("collaborator rejected the request: {0}")]
    Rejected(String),

    #[error("row not found")]
    NotFound,

    /// A stored row could not be decoded into the expected shape.
    #[error("malformed row in {table}: {reason}")]
    Malformed { table: String, reason: String },
}

/// Hosted account + persistence service.
///
/// Constructed once per process and shared by reference; implementations
/// must be safe to call from concurrent requests.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Resolve a session token to its account, or `None` when the token is
    /// unknown or expired.
    async fn authenticate(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Account>, CollaboratorError>;

    /// Insert one row and return it as stored, including `id` and `created_at`.
    async fn insert(&self, table: Table, row: Row) -> Result<Row, CollaboratorError>;

    async fn select(
        &self,
        table: Table,
        filter: &RowFilter,
        order: OrderBy,
        limit: Option<i64>,
    ) -> Result<Vec<Row>, CollaboratorError>;

    /// Apply `patch` to the row with `id`. Only [`Table::patchable_columns`]
    /// may appear in the patch.
    async fn update(&self, table: Table, id: Uuid, patch: Row) -> Result<Row, CollaboratorError>;

    /// Delete the row with `id`, failing with [`CollaboratorError::NotFound`]
    /// when it does not exist.
    async fn delete(&self, table: Table, id: Uuid) -> Result<(), CollaboratorError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Reject rows carrying columns outside [`Table::insert_columns`].
///
/// # Errors
///
/// Returns [`CollaboratorError::Rejected`] naming the first unknown column.
pub fn check_insert(table: Table, row: &Row) -> Result<(), CollaboratorError> {
    let allowed = table.insert_columns();
    if let Some(column) = row.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(CollaboratorError::Rejected(format!(
            "column '{column}' cannot be written to {table}"
        )));
    }
    Ok(())
}

/// Reject patches that touch columns outside [`Table::patchable_columns`].
///
/// # Errors
///
/// Returns [`CollaboratorError::Rejected`] naming the first disallowed column.
pub fn check_patch(table: Table, patch: &Row) -> Result<(), CollaboratorError> {
    let allowed = table.patchable_columns();
    if allowed.is_empty() {
        return Err(CollaboratorError::Rejected(format!(
            "{table} is append-only"
        )));
    }
    if let Some(column) = patch.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(CollaboratorError::Rejected(format!(
            "column '{column}' of {table} cannot be updated"
        )));
    }
    Ok(())
}
