//! Read side of calculation history.

use ratekit_core::{CalculationRecord, HistoryOrder, HistoryQuery, Platform, SessionToken};
use uuid::Uuid;

use crate::collaborator::{Collaborator, OrderBy, Row, RowFilter, Table};
use crate::error::{AuthorizationError, ServiceError};
use crate::record_store::{fetch_saved, require_account};
use crate::rows;

pub struct HistoryReader<'a, C: Collaborator + ?Sized> {
    collaborator: &'a C,
}

impl<'a, C: Collaborator + ?Sized> HistoryReader<'a, C> {
    pub fn new(collaborator: &'a C) -> Self {
        Self { collaborator }
    }

    /// Saved calculations belonging to the caller.
    ///
    /// # Errors
    ///
    /// `Authorization` without a live session, `Persistence` when the
    /// collaborator fails or returns an undecodable row.
    pub async fn list(
        &self,
        token: &SessionToken,
        query: &HistoryQuery,
    ) -> Result<Vec<CalculationRecord>, ServiceError> {
        let account = require_account(self.collaborator, token).await?;
        let filter = RowFilter::by_user(account.id);
        let records = self.fetch(filter, query).await?;
        tracing::debug!(account_id = %account.id, count = records.len(), "history listed");
        Ok(records)
    }

    /// Saved calculations across every account. Administrators only.
    ///
    /// # Errors
    ///
    /// As [`Self::list`], plus `Authorization(NotPermitted)` for members.
    pub async fn list_all(
        &self,
        token: &SessionToken,
        query: &HistoryQuery,
    ) -> Result<Vec<CalculationRecord>, ServiceError> {
        let account = require_account(self.collaborator, token).await?;
        if !account.is_admin() {
            return Err(AuthorizationError::NotPermitted.into());
        }
        self.fetch(RowFilter::default(), query).await
    }

    /// One saved calculation, visible to its owner and administrators.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Authorization(NotPermitted)` for
    /// anyone else's record.
    pub async fn get(
        &self,
        token: &SessionToken,
        id: Uuid,
    ) -> Result<CalculationRecord, ServiceError> {
        let account = require_account(self.collaborator, token).await?;
        let record = fetch_saved(self.collaborator, id).await?;
        if !account.can_access(record.account_id) {
            return Err(AuthorizationError::NotPermitted.into());
        }
        warn_if_stale(&record);
        Ok(record)
    }

    async fn fetch(
        &self,
        filter: RowFilter,
        query: &HistoryQuery,
    ) -> Result<Vec<CalculationRecord>, ServiceError> {
        let filter = filter.with_platform(query.platform.map(Platform::as_str));
        let order = match query.order {
            HistoryOrder::NewestFirst => OrderBy::CreatedAtDesc,
            HistoryOrder::OldestFirst => OrderBy::CreatedAtAsc,
        };
        let found: Vec<Row> = self
            .collaborator
            .select(
                Table::SavedCalculations,
                &filter,
                order,
                query.limit.map(i64::from),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "history temporarily unavailable"))?;

        found
            .into_iter()
            .map(|row| -> Result<CalculationRecord, ServiceError> {
                let record = rows::decode_saved(row)?;
                warn_if_stale(&record);
                Ok(record)
            })
            .collect()
    }
}

/// Records are immutable; a mismatch means the formula changed since save.
fn warn_if_stale(record: &CalculationRecord) {
    if !record.reproduces() {
        tracing::warn!(
            record_id = %record.id,
            platform = %record.platform,
            formula_version = %record.formula_version,
            "stored result no longer reproduces under the current engine"
        );
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
