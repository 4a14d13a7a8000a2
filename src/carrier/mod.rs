//! Designated-carrier reconciliation.
//!
//! Waybills from the designated carrier carry no usable due date. The
//! carrier's billing portal lists open invoices; the one whose amount matches
//! the waybill total supplies the due date and the invoice number the ledger
//! row is keyed by.

mod matching;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, warn};

use crate::core::*;
pub use matching::{AMOUNT_TOLERANCE, CarrierMatch, ReconcileOutcome, amounts_match, match_by_amount};

/// Source of the carrier's open invoices.
///
/// `Ok(vec![])` means the portal answered with nothing to offer. Any `Err` is
/// a failure of the portal itself and is reported as such.
pub trait CarrierPortal {
    /// Open invoices billed to `tax_id`, in the order the portal lists them.
    fn fetch_invoices(&self, tax_id: &str) -> Result<Vec<CarrierInvoice>, CarrierError>;
}

impl CarrierInvoice {
    /// Build an invoice from the cells of the portal's invoice table:
    /// number, due date (`dd/mm/yyyy` or `yyyy-mm-dd`) and amount
    /// (`R$ 1.234,56`).
    pub fn from_portal_row(number: &str, due_date: &str, amount: &str) -> Result<Self, CarrierError> {
        let invoice_number = number.trim();
        if invoice_number.is_empty() {
            return Err(CarrierError::InvalidRow("empty invoice number".into()));
        }
        let due = parse_flexible_date(due_date).ok_or_else(|| {
            CarrierError::InvalidRow(format!("invoice {invoice_number}: bad due date '{due_date}'"))
        })?;
        let value = money::parse_brl(amount).ok_or_else(|| {
            CarrierError::InvalidRow(format!("invoice {invoice_number}: bad amount '{amount}'"))
        })?;
        Ok(Self {
            invoice_number: invoice_number.to_string(),
            due_date: due,
            amount: value,
        })
    }
}

/// Query the portal for `recipient_tax_id` and match `total` against the
/// returned invoices.
pub fn reconcile(
    portal: &dyn CarrierPortal,
    recipient_tax_id: &str,
    total: rust_decimal::Decimal,
) -> Result<ReconcileOutcome, CarrierError> {
    debug!(recipient = recipient_tax_id, %total, "fetching carrier invoices");
    let invoices = portal.fetch_invoices(recipient_tax_id)?;
    info!(
        recipient = recipient_tax_id,
        count = invoices.len(),
        "carrier invoices fetched"
    );

    let outcome = match_by_amount(total, &invoices);
    match &outcome {
        ReconcileOutcome::Matched(m) if m.is_ambiguous() => warn!(
            %total,
            candidates = m.candidates,
            chosen = %m.invoice.invoice_number,
            "multiple carrier invoices with identical amount, using the first"
        ),
        ReconcileOutcome::Matched(m) => info!(
            %total,
            invoice = %m.invoice.invoice_number,
            due = %m.invoice.due_date,
            "carrier invoice matched"
        ),
        ReconcileOutcome::NoInvoices => warn!(recipient = recipient_tax_id, "no carrier invoices available"),
        ReconcileOutcome::NoMatchingAmount => warn!(%total, "no carrier invoice with matching amount"),
    }
    Ok(outcome)
}

/// A portal backed by a fixed list of invoices per recipient.
///
/// Counts calls so callers can assert how often the portal was consulted.
#[derive(Debug, Default)]
pub struct StaticPortal {
    invoices: HashMap<String, Vec<CarrierInvoice>>,
    calls: AtomicUsize,
}

impl StaticPortal {
    /// An empty portal: every recipient gets an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the invoices listed for `tax_id`.
    pub fn with_invoices(mut self, tax_id: &str, invoices: Vec<CarrierInvoice>) -> Self {
        self.invoices
            .entry(normalize_tax_id(tax_id))
            .or_default()
            .extend(invoices);
        self
    }

    /// Number of `fetch_invoices` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CarrierPortal for StaticPortal {
    fn fetch_invoices(&self, tax_id: &str) -> Result<Vec<CarrierInvoice>, CarrierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .invoices
            .get(&normalize_tax_id(tax_id))
            .cloned()
            .unwrap_or_default())
    }
}
