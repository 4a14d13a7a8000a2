use crate::core::ProviderError;

use super::row::COLUMN_COUNT;

/// The spreadsheet provider holding the ledgers.
///
/// Every call is blocking. Implementations signal throttling with
/// [`ProviderError::RateLimited`]; the caller decides whether to retry.
pub trait LedgerStore {
    /// Make sure the ledger document is reachable.
    fn open_ledger(&self, document_id: &str) -> Result<(), ProviderError>;

    /// Whether the document has a worksheet titled `title`.
    fn worksheet_exists(&self, document_id: &str, title: &str) -> Result<bool, ProviderError>;

    /// Create a worksheet whose first row is `header`.
    ///
    /// Returns [`ProviderError::AlreadyExists`] when another writer created it
    /// first.
    fn create_worksheet(
        &self,
        document_id: &str,
        title: &str,
        header: &[String; COLUMN_COUNT],
    ) -> Result<(), ProviderError>;

    /// Every row of the worksheet, header included.
    fn list_rows(&self, document_id: &str, title: &str) -> Result<Vec<Vec<String>>, ProviderError>;

    /// Append one row after the last one.
    fn append_row(
        &self,
        document_id: &str,
        title: &str,
        cells: &[String; COLUMN_COUNT],
    ) -> Result<(), ProviderError>;
}
