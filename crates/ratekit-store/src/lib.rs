//! Calculation persistence over an injected account/persistence collaborator.
//!
//! [`CalculationRecordStore`] writes, [`HistoryReader`] reads. Both borrow a
//! [`Collaborator`] for the lifetime of a request and hold no other state.

pub mod collaborator;
pub mod error;
pub mod history;
pub mod memory;
pub mod record_store;
mod rows;

#[cfg(test)]
mod test_support;

pub use collaborator::{
    check_insert, check_patch, Collaborator, CollaboratorError, OrderBy, Row, RowFilter, Table,
};
pub use error::{AuthorizationError, ServiceError};
pub use history::HistoryReader;
pub use memory::InMemoryCollaborator;
pub use record_store::CalculationRecordStore;
