use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::core::ProviderError;

use super::row::COLUMN_COUNT;
use super::store::LedgerStore;

/// The [`LedgerStore`] operations, for scripting failures and counting calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCall {
    Open,
    Exists,
    Create,
    List,
    Append,
}

type Worksheets = BTreeMap<String, Vec<Vec<String>>>;

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<String, Worksheets>,
    created_elsewhere: BTreeMap<(String, String), Vec<Vec<String>>>,
    failures: HashMap<StoreCall, VecDeque<ProviderError>>,
    calls: HashMap<StoreCall, usize>,
}

impl State {
    /// Count the call and hand out the next scripted failure, if any.
    fn enter(&mut self, call: StoreCall) -> Result<(), ProviderError> {
        *self.calls.entry(call).or_default() += 1;
        match self.failures.get_mut(&call).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn document(&mut self, document_id: &str) -> Result<&mut Worksheets, ProviderError> {
        self.documents
            .get_mut(document_id)
            .ok_or_else(|| ProviderError::NotFound(format!("ledger document {document_id}")))
    }
}

/// In-memory ledger store.
///
/// Failures can be scripted per operation, and a worksheet can be marked as
/// being created by another writer at the same time.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    /// An empty store without any ledger document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty ledger document.
    pub fn with_document(self, document_id: &str) -> Self {
        self.add_document(document_id);
        self
    }

    /// Add an empty ledger document.
    pub fn add_document(&self, document_id: &str) {
        self.state()
            .documents
            .entry(document_id.to_string())
            .or_default();
    }

    /// Make the next call of `call` fail with `error`. Repeated calls queue up.
    pub fn fail_next(&self, call: StoreCall, error: ProviderError) {
        self.state()
            .failures
            .entry(call)
            .or_default()
            .push_back(error);
    }

    /// Pretend another writer is creating `title` right now: the worksheet is
    /// invisible to [`LedgerStore::worksheet_exists`] until someone tries to
    /// create it, and that attempt fails with `AlreadyExists`.
    pub fn worksheet_created_elsewhere(&self, document_id: &str, title: &str, rows: Vec<Vec<String>>) {
        self.state()
            .created_elsewhere
            .insert((document_id.to_string(), title.to_string()), rows);
    }

    /// Pre-populate a worksheet.
    pub fn insert_worksheet(&self, document_id: &str, title: &str, rows: Vec<Vec<String>>) {
        self.state()
            .documents
            .entry(document_id.to_string())
            .or_default()
            .insert(title.to_string(), rows);
    }

    /// Rows of a worksheet, header included.
    pub fn rows(&self, document_id: &str, title: &str) -> Option<Vec<Vec<String>>> {
        self.state()
            .documents
            .get(document_id)
            .and_then(|ws| ws.get(title))
            .cloned()
    }

    /// Worksheet titles of a document, sorted.
    pub fn worksheets(&self, document_id: &str) -> Vec<String> {
        self.state()
            .documents
            .get(document_id)
            .map(|ws| ws.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// How many times `call` was made, failed attempts included.
    pub fn calls(&self, call: StoreCall) -> usize {
        self.state().calls.get(&call).copied().unwrap_or(0)
    }

    /// Create and append calls made so far.
    pub fn write_calls(&self) -> usize {
        self.calls(StoreCall::Create) + self.calls(StoreCall::Append)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LedgerStore for MemoryLedger {
    fn open_ledger(&self, document_id: &str) -> Result<(), ProviderError> {
        let mut state = self.state();
        state.enter(StoreCall::Open)?;
        state.document(document_id).map(|_| ())
    }

    fn worksheet_exists(&self, document_id: &str, title: &str) -> Result<bool, ProviderError> {
        let mut state = self.state();
        state.enter(StoreCall::Exists)?;
        Ok(state.document(document_id)?.contains_key(title))
    }

    fn create_worksheet(
        &self,
        document_id: &str,
        title: &str,
        header: &[String; COLUMN_COUNT],
    ) -> Result<(), ProviderError> {
        let mut state = self.state();
        state.enter(StoreCall::Create)?;
        let key = (document_id.to_string(), title.to_string());
        if let Some(rows) = state.created_elsewhere.remove(&key) {
            state.document(document_id)?.insert(key.1, rows);
            return Err(ProviderError::AlreadyExists(format!("worksheet {title}")));
        }
        let doc = state.document(document_id)?;
        if doc.contains_key(title) {
            return Err(ProviderError::AlreadyExists(format!("worksheet {title}")));
        }
        doc.insert(title.to_string(), vec![header.to_vec()]);
        Ok(())
    }

    fn list_rows(&self, document_id: &str, title: &str) -> Result<Vec<Vec<String>>, ProviderError> {
        let mut state = self.state();
        state.enter(StoreCall::List)?;
        state
            .document(document_id)?
            .get(title)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("worksheet {title}")))
    }

    fn append_row(
        &self,
        document_id: &str,
        title: &str,
        cells: &[String; COLUMN_COUNT],
    ) -> Result<(), ProviderError> {
        let mut state = self.state();
        state.enter(StoreCall::Append)?;
        state
            .document(document_id)?
            .get_mut(title)
            .ok_or_else(|| ProviderError::NotFound(format!("worksheet {title}")))?
            .push(cells.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> [String; COLUMN_COUNT] {
        std::array::from_fn(|i| format!("h{i}"))
    }

    #[test]
    fn create_list_append() {
        let store = MemoryLedger::new().with_document("doc");
        assert!(!store.worksheet_exists("doc", "Nov/2025").unwrap());
        store.create_worksheet("doc", "Nov/2025", &header()).unwrap();
        let cells: [String; COLUMN_COUNT] = std::array::from_fn(|i| i.to_string());
        store.append_row("doc", "Nov/2025", &cells).unwrap();
        let rows = store.list_rows("doc", "Nov/2025").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][2], "2");
        assert_eq!(store.write_calls(), 2);
    }

    #[test]
    fn unknown_document() {
        let store = MemoryLedger::new();
        assert!(matches!(store.open_ledger("x"), Err(ProviderError::NotFound(_))));
    }

    #[test]
    fn scripted_failures_are_consumed_in_order() {
        let store = MemoryLedger::new().with_document("doc");
        store.fail_next(StoreCall::Open, ProviderError::RateLimited("429".into()));
        store.fail_next(StoreCall::Open, ProviderError::Fatal("403".into()));
        assert!(matches!(store.open_ledger("doc"), Err(ProviderError::RateLimited(_))));
        assert!(matches!(store.open_ledger("doc"), Err(ProviderError::Fatal(_))));
        assert!(store.open_ledger("doc").is_ok());
        assert_eq!(store.calls(StoreCall::Open), 3);
    }

    #[test]
    fn concurrent_creation_surfaces_as_already_exists() {
        let store = MemoryLedger::new().with_document("doc");
        store.worksheet_created_elsewhere("doc", "Dez/2025", vec![vec!["x".into()]]);
        assert!(!store.worksheet_exists("doc", "Dez/2025").unwrap());
        assert!(matches!(
            store.create_worksheet("doc", "Dez/2025", &header()),
            Err(ProviderError::AlreadyExists(_))
        ));
        assert_eq!(store.rows("doc", "Dez/2025").unwrap(), vec![vec!["x".to_string()]]);
    }
}
