use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::{CarrierInvoice, money};

/// Largest difference (exclusive) between a waybill total and a carrier
/// invoice amount that still counts as the same charge.
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.05);

/// The carrier invoice chosen for a waybill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierMatch {
    /// First matching invoice in portal order.
    pub invoice: CarrierInvoice,
    /// How many invoices were within tolerance.
    pub candidates: usize,
}

impl CarrierMatch {
    /// More than one invoice matched; the first was taken.
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

/// Result of reconciling one waybill against the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A usable invoice was found.
    Matched(CarrierMatch),
    /// The portal returned no open invoices.
    NoInvoices,
    /// None of the invoices is within tolerance of the waybill total.
    NoMatchingAmount,
}

/// Whether `amount` is within [`AMOUNT_TOLERANCE`] of `total` (rounded to cents).
///
/// Amounts whose difference does not fit a `Decimal` never match.
pub fn amounts_match(total: Decimal, amount: Decimal) -> bool {
    amount
        .checked_sub(money::round_cents(total))
        .is_some_and(|diff| diff.abs() < AMOUNT_TOLERANCE)
}

/// Pick the carrier invoice for a waybill total.
///
/// Every invoice within tolerance is a candidate; the first one in the order
/// the portal returned them wins. No attempt is made to prefer an earlier due
/// date or a closer amount.
pub fn match_by_amount(total: Decimal, invoices: &[CarrierInvoice]) -> ReconcileOutcome {
    if invoices.is_empty() {
        return ReconcileOutcome::NoInvoices;
    }
    let mut candidates = invoices.iter().filter(|inv| amounts_match(total, inv.amount));
    let Some(first) = candidates.next() else {
        return ReconcileOutcome::NoMatchingAmount;
    };
    ReconcileOutcome::Matched(CarrierMatch {
        invoice: first.clone(),
        candidates: 1 + candidates.count(),
    })
}
