//! Ledger selection, duplicate detection and rate-limited writing.
//!
//! A ledger is one spreadsheet document per operating company and year, with
//! one worksheet per month (`Nov/2025`). Rows are only ever appended; an
//! installment is recognised as already recorded by its number and due date.

mod dedup;
mod memory;
mod row;
mod selector;
mod session;
mod store;

pub use dedup::{contains_installment, is_entry_row};
pub use memory::{MemoryLedger, StoreCall};
pub use row::{COLUMN_COUNT, DUE_DATE_COLUMN, LedgerRow, NUMBER_COLUMN, header_row};
pub use selector::{LedgerSelector, LedgerTarget, worksheet_name};
pub use session::LedgerSession;
pub use store::LedgerStore;
