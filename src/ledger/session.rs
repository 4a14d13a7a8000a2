use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::core::{
    Cooldown, DocumentKind, LedgerError, ProviderError, RetryError, RetryPolicy, with_retry,
};

use super::dedup::contains_installment;
use super::row::{LedgerRow, header_row};
use super::selector::LedgerTarget;
use super::store::LedgerStore;

/// Rate-limit aware access to a [`LedgerStore`] for the duration of one
/// document.
///
/// Every provider call goes through the retry policy. Opened documents and
/// worksheet contents are cached, and appended rows are added to the cache so
/// later installments of the same document see them.
pub struct LedgerSession<'a> {
    store: &'a dyn LedgerStore,
    policy: RetryPolicy,
    cooldown: &'a dyn Cooldown,
    opened: HashSet<String>,
    rows: HashMap<(String, String), Vec<Vec<String>>>,
}

impl<'a> LedgerSession<'a> {
    pub fn new(store: &'a dyn LedgerStore, policy: RetryPolicy, cooldown: &'a dyn Cooldown) -> Self {
        Self {
            store,
            policy,
            cooldown,
            opened: HashSet::new(),
            rows: HashMap::new(),
        }
    }

    fn call<T>(
        &self,
        operation: &str,
        op: impl FnMut() -> Result<T, ProviderError>,
    ) -> Result<T, LedgerError> {
        with_retry(
            &self.policy,
            self.cooldown,
            operation,
            ProviderError::is_rate_limited,
            op,
        )
        .map_err(|e| match e {
            RetryError::Exhausted { attempts, .. } => LedgerError::RetriesExhausted {
                operation: operation.to_string(),
                attempts,
            },
            RetryError::Permanent(e) => LedgerError::Provider(e),
        })
    }

    /// Open the ledger document once per session.
    pub fn open(&mut self, target: &LedgerTarget) -> Result<(), LedgerError> {
        if self.opened.contains(&target.document_id) {
            return Ok(());
        }
        let store = self.store;
        self.call("open_ledger", || store.open_ledger(&target.document_id))?;
        debug!(ledger = %target.key, document_id = %target.document_id, "opened ledger");
        self.opened.insert(target.document_id.clone());
        Ok(())
    }

    /// Rows of `title`, creating the worksheet with the header for `kind`
    /// when it does not exist yet.
    ///
    /// A worksheet created concurrently by another writer is used as is.
    pub fn worksheet_rows(
        &mut self,
        target: &LedgerTarget,
        title: &str,
        kind: DocumentKind,
    ) -> Result<&[Vec<String>], LedgerError> {
        let key = (target.document_id.clone(), title.to_string());
        if !self.rows.contains_key(&key) {
            self.open(target)?;
            let store = self.store;
            let document_id = target.document_id.as_str();

            let exists = self.call("worksheet_exists", || store.worksheet_exists(document_id, title))?;
            if !exists {
                let header = header_row(kind);
                match self.call("create_worksheet", || {
                    store.create_worksheet(document_id, title, &header)
                }) {
                    Ok(()) => info!(ledger = %target.key, worksheet = title, "created worksheet"),
                    Err(LedgerError::Provider(ProviderError::AlreadyExists(_))) => {
                        debug!(ledger = %target.key, worksheet = title, "worksheet created concurrently, reusing it")
                    }
                    Err(e) => return Err(e),
                }
            }

            let rows = self.call("list_rows", || store.list_rows(document_id, title))?;
            self.rows.insert(key.clone(), rows);
        }
        Ok(self.rows.get(&key).map(Vec::as_slice).unwrap_or_default())
    }

    /// Whether the worksheet already records `number` due on `due_date`.
    pub fn is_duplicate(
        &mut self,
        target: &LedgerTarget,
        title: &str,
        kind: DocumentKind,
        number: &str,
        due_date: NaiveDate,
    ) -> Result<bool, LedgerError> {
        let rows = self.worksheet_rows(target, title, kind)?;
        Ok(contains_installment(rows, number, due_date))
    }

    /// Append `row` to the worksheet.
    pub fn append(
        &mut self,
        target: &LedgerTarget,
        title: &str,
        kind: DocumentKind,
        row: &LedgerRow,
    ) -> Result<(), LedgerError> {
        self.worksheet_rows(target, title, kind)?;
        let cells = row.to_cells();
        let store = self.store;
        self.call("append_row", || {
            store.append_row(&target.document_id, title, &cells)
        })?;
        if let Some(rows) = self.rows.get_mut(&(target.document_id.clone(), title.to_string())) {
            rows.push(cells.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LedgerKey;
    use crate::ledger::{MemoryLedger, StoreCall};
    use rust_decimal_macros::dec;
    use std::cell::Cell;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingCooldown {
        waits: Cell<u32>,
    }

    impl Cooldown for CountingCooldown {
        fn wait(&self, _duration: Duration) {
            self.waits.set(self.waits.get() + 1);
        }
    }

    fn target() -> LedgerTarget {
        LedgerTarget {
            key: LedgerKey {
                company: "EH".into(),
                year: 2025,
            },
            document_id: "eh-2025".into(),
        }
    }

    fn row(number: &str, day: u32) -> LedgerRow {
        LedgerRow {
            due_date: NaiveDate::from_ymd_opt(2025, 11, day).unwrap(),
            description: "ACME (Bot)".into(),
            document_number: number.into(),
            total_amount: dec!(100),
            installment_count: 1,
            installment_index: 1,
            installment_amount: dec!(100),
            paid_amount: None,
            status: None,
        }
    }

    #[test]
    fn creates_worksheet_with_header() {
        let store = MemoryLedger::new().with_document("eh-2025");
        let cd = CountingCooldown::default();
        let mut session = LedgerSession::new(&store, RetryPolicy::default(), &cd);
        let rows = session
            .worksheet_rows(&target(), "Nov/2025", DocumentKind::Waybill)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], "CT-e");
        assert_eq!(store.calls(StoreCall::Create), 1);
    }

    #[test]
    fn appended_rows_are_seen_by_later_checks() {
        let store = MemoryLedger::new().with_document("eh-2025");
        let cd = CountingCooldown::default();
        let mut session = LedgerSession::new(&store, RetryPolicy::default(), &cd);
        let t = target();
        let r = row("4411", 5);
        assert!(!session
            .is_duplicate(&t, "Nov/2025", DocumentKind::Invoice, "4411", r.due_date)
            .unwrap());
        session.append(&t, "Nov/2025", DocumentKind::Invoice, &r).unwrap();
        assert!(session
            .is_duplicate(&t, "Nov/2025", DocumentKind::Invoice, "4411", r.due_date)
            .unwrap());
        // The worksheet was listed once and the document opened once.
        assert_eq!(store.calls(StoreCall::List), 1);
        assert_eq!(store.calls(StoreCall::Open), 1);
        assert_eq!(store.rows("eh-2025", "Nov/2025").unwrap().len(), 2);
    }

    #[test]
    fn concurrent_creation_is_tolerated() {
        let store = MemoryLedger::new().with_document("eh-2025");
        let existing = row("9", 1).to_cells().to_vec();
        store.worksheet_created_elsewhere("eh-2025", "Nov/2025", vec![existing]);
        let cd = CountingCooldown::default();
        let mut session = LedgerSession::new(&store, RetryPolicy::default(), &cd);
        let rows = session
            .worksheet_rows(&target(), "Nov/2025", DocumentKind::Invoice)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], "9");
    }

    #[test]
    fn rate_limits_are_retried() {
        let store = MemoryLedger::new().with_document("eh-2025");
        store.fail_next(StoreCall::Append, ProviderError::RateLimited("429".into()));
        store.fail_next(StoreCall::Append, ProviderError::RateLimited("429".into()));
        let cd = CountingCooldown::default();
        let mut session = LedgerSession::new(&store, RetryPolicy::default(), &cd);
        session
            .append(&target(), "Nov/2025", DocumentKind::Invoice, &row("1", 3))
            .unwrap();
        assert_eq!(cd.waits.get(), 2);
        assert_eq!(store.calls(StoreCall::Append), 3);
        assert_eq!(store.rows("eh-2025", "Nov/2025").unwrap().len(), 2);
    }

    #[test]
    fn exhausted_retries_surface_operation() {
        let store = MemoryLedger::new().with_document("eh-2025");
        for _ in 0..3 {
            store.fail_next(StoreCall::List, ProviderError::RateLimited("429".into()));
        }
        let cd = CountingCooldown::default();
        let mut session = LedgerSession::new(&store, RetryPolicy::default(), &cd);
        let err = session
            .worksheet_rows(&target(), "Nov/2025", DocumentKind::Invoice)
            .unwrap_err();
        match err {
            LedgerError::RetriesExhausted { operation, attempts } => {
                assert_eq!(operation, "list_rows");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fatal_errors_are_not_retried() {
        let store = MemoryLedger::new();
        let cd = CountingCooldown::default();
        let mut session = LedgerSession::new(&store, RetryPolicy::default(), &cd);
        let err = session.open(&target()).unwrap_err();
        assert!(matches!(err, LedgerError::Provider(ProviderError::NotFound(_))));
        assert_eq!(cd.waits.get(), 0);
    }
}
