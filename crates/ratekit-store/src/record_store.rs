//! Saving, logging, and deleting calculations on behalf of a session.

use ratekit_core::{
    estimate, resolve_record_name, Account, CalculationLogEntry, CalculationRecord,
    FormulaVersion, MetricInput, NewCalculation, SessionToken,
};
use uuid::Uuid;

use crate::collaborator::{Collaborator, CollaboratorError, OrderBy, RowFilter, Table};
use crate::error::{AuthorizationError, ServiceError};
use crate::rows;

/// Resolve `token` to an account or fail with `NotLoggedIn`.
pub(crate) async fn require_account<C: Collaborator + ?Sized>(
    collaborator: &C,
    token: &SessionToken,
) -> Result<Account, ServiceError> {
    collaborator
        .authenticate(token)
        .await?
        .ok_or(ServiceError::Authorization(AuthorizationError::NotLoggedIn))
}

/// Load one saved calculation by id, without any access check.
pub(crate) async fn fetch_saved<C: Collaborator + ?Sized>(
    collaborator: &C,
    id: Uuid,
) -> Result<CalculationRecord, ServiceError> {
    let row = collaborator
        .select(
            Table::SavedCalculations,
            &RowFilter::by_id(id),
            OrderBy::default(),
            Some(1),
        )
        .await?
        .into_iter()
        .next()
        .ok_or(ServiceError::NotFound)?;
    Ok(rows::decode_saved(row)?)
}

/// Write side of calculation history.
///
/// Every operation authenticates first; an unresolvable session never
/// reaches the collaborator's write path.
pub struct CalculationRecordStore<'a, C: Collaborator + ?Sized> {
    collaborator: &'a C,
    youtube_formula: FormulaVersion,
}

impl<'a, C: Collaborator + ?Sized> CalculationRecordStore<'a, C> {
    pub fn new(collaborator: &'a C, youtube_formula: FormulaVersion) -> Self {
        Self {
            collaborator,
            youtube_formula,
        }
    }

    /// Compute and persist a named snapshot of `calculation`.
    ///
    /// # Errors
    ///
    /// `Authorization` without a live session, `Validation` for bad input or
    /// an overlong name, `Persistence` when the collaborator fails.
    pub async fn save(
        &self,
        token: &SessionToken,
        calculation: NewCalculation,
    ) -> Result<CalculationRecord, ServiceError> {
        let account = require_account(self.collaborator, token).await?;

        calculation.input.validate()?;
        let platform = calculation.input.platform();
        let name = resolve_record_name(platform, calculation.name.as_deref())?;
        let result = estimate(&calculation.input, self.youtube_formula);

        let row = rows::encode_saved(
            account.id,
            &name,
            self.youtube_formula,
            &calculation.input,
            &result,
        )?;
        let stored = self
            .collaborator
            .insert(Table::SavedCalculations, row)
            .await
            .inspect_err(|e| {
                tracing::error!(account_id = %account.id, %platform, error = %e, "failed to save calculation");
            })?;
        let written = rows::decode_written(Table::SavedCalculations, stored)?;
        let record = CalculationRecord {
            id: written.id,
            account_id: account.id,
            platform,
            name,
            formula_version: self.youtube_formula,
            input: calculation.input,
            result,
            created_at: written.created_at,
        };

        tracing::info!(
            record_id = %record.id,
            account_id = %account.id,
            %platform,
            post_value = record.result.post_value,
            "calculation saved"
        );
        Ok(record)
    }

    /// Append one row to the flat per-estimate log.
    ///
    /// # Errors
    ///
    /// Same as [`Self::save`].
    pub async fn log(
        &self,
        token: &SessionToken,
        input: &MetricInput,
    ) -> Result<CalculationLogEntry, ServiceError> {
        let account = require_account(self.collaborator, token).await?;
        input.validate()?;

        let result = estimate(input, self.youtube_formula);
        let mut entry = CalculationLogEntry::from_estimate(account.id, input, &result);
        let stored = self
            .collaborator
            .insert(Table::Calculations, rows::encode_log(&entry)?)
            .await?;
        let written = rows::decode_written(Table::Calculations, stored)?;
        entry.id = Some(written.id);
        entry.created_at = Some(written.created_at);

        tracing::debug!(
            account_id = %account.id,
            platform = %entry.platform,
            estimated_value = entry.estimated_value,
            "calculation logged"
        );
        Ok(entry)
    }

    /// Delete a saved calculation. Owners and administrators only.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Authorization(NotPermitted)` when the
    /// caller neither owns the record nor is an administrator.
    pub async fn delete(&self, token: &SessionToken, id: Uuid) -> Result<(), ServiceError> {
        let account = require_account(self.collaborator, token).await?;
        let record = fetch_saved(self.collaborator, id).await?;
        if !account.can_access(record.account_id) {
            tracing::warn!(record_id = %id, account_id = %account.id, "delete refused");
            return Err(AuthorizationError::NotPermitted.into());
        }

        match self.collaborator.delete(Table::SavedCalculations, id).await {
            Ok(()) => {}
            Err(CollaboratorError::NotFound) => return Err(ServiceError::NotFound),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(record_id = %id, account_id = %account.id, "calculation deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "record_store_test.rs"]
mod tests;
