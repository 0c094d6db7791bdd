//! Conversions between domain types and collaborator rows.

use chrono::{DateTime, Utc};
use ratekit_core::{
    CalculationLogEntry, CalculationRecord, EstimateResult, FormulaVersion, MetricInput, Platform,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::collaborator::{CollaboratorError, Row, Table};

/// Shape of a `saved_calculations` row as written.
#[derive(Debug, Serialize)]
struct SavedInsert<'a> {
    user_id: Uuid,
    platform: Platform,
    name: &'a str,
    formula_version: FormulaVersion,
    data: &'a MetricInput,
    result: &'a EstimateResult,
}

/// Shape of a `saved_calculations` row as read back.
#[derive(Debug, Deserialize)]
struct SavedRow {
    id: Uuid,
    user_id: Uuid,
    platform: Platform,
    name: String,
    formula_version: FormulaVersion,
    data: MetricInput,
    result: EstimateResult,
    created_at: DateTime<Utc>,
}

pub(crate) fn encode_saved(
    user_id: Uuid,
    name: &str,
    formula_version: FormulaVersion,
    input: &MetricInput,
    result: &EstimateResult,
) -> Result<Row, CollaboratorError> {
    to_row(
        Table::SavedCalculations,
        &SavedInsert {
            user_id,
            platform: input.platform(),
            name,
            formula_version,
            data: input,
            result,
        },
    )
}

pub(crate) fn decode_saved(row: Row) -> Result<CalculationRecord, CollaboratorError> {
    let saved: SavedRow = from_row(Table::SavedCalculations, row)?;
    if saved.data.platform() != saved.platform {
        return Err(CollaboratorError::Malformed {
            table: Table::SavedCalculations.to_string(),
            reason: format!(
                "platform column '{}' disagrees with input '{}'",
                saved.platform,
                saved.data.platform()
            ),
        });
    }
    Ok(CalculationRecord {
        id: saved.id,
        account_id: saved.user_id,
        platform: saved.platform,
        name: saved.name,
        formula_version: saved.formula_version,
        input: saved.data,
        result: saved.result,
        created_at: saved.created_at,
    })
}

/// Identity the collaborator assigned to a row it just wrote.
#[derive(Debug, Deserialize)]
pub(crate) struct Written {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Read only the assigned identity; the rest of the row is already known to
/// the writer.
pub(crate) fn decode_written(table: Table, row: Row) -> Result<Written, CollaboratorError> {
    let row_id = row.get("id").cloned();
    from_row(table, row).inspect_err(|e| {
        tracing::error!(%table, ?row_id, error = %e, "written row returned without a usable identity");
    })
}

pub(crate) fn encode_log(entry: &CalculationLogEntry) -> Result<Row, CollaboratorError> {
    to_row(Table::Calculations, entry)
}

fn to_row<T: Serialize>(table: Table, value: &T) -> Result<Row, CollaboratorError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(malformed(table, format!("expected an object, got {other}"))),
        Err(e) => Err(malformed(table, e.to_string())),
    }
}

fn from_row<T: DeserializeOwned>(table: Table, row: Row) -> Result<T, CollaboratorError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| malformed(table, e.to_string()))
}

fn malformed(table: Table, reason: String) -> CollaboratorError {
    CollaboratorError::Malformed {
        table: table.to_string(),
        reason,
    }
}
