#![cfg(feature = "core")]

use chrono::NaiveDate;
use nfe_ledger::carrier::*;
use nfe_ledger::core::*;
use rust_decimal_macros::dec;

fn portal_rows() -> Vec<CarrierInvoice> {
    [
        ("000123", "05/11/2025", "R$ 980,00"),
        ("000124", "20/11/2025", "R$ 1.500,04"),
        ("000125", "2025-12-01", "R$ 12.345,67"),
    ]
    .iter()
    .map(|(n, d, a)| CarrierInvoice::from_portal_row(n, d, a).unwrap())
    .collect()
}

#[test]
fn portal_rows_are_normalized() {
    let rows = portal_rows();
    assert_eq!(rows[1].amount, dec!(1500.04));
    assert_eq!(rows[2].amount, dec!(12345.67));
    assert_eq!(rows[2].due_date, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
}

#[test]
fn tolerance_is_strictly_below_five_cents() {
    assert!(amounts_match(dec!(1500.00), dec!(1500.04)));
    assert!(amounts_match(dec!(1500.00), dec!(1499.96)));
    assert!(!amounts_match(dec!(1500.00), dec!(1500.05)));
    assert!(!amounts_match(dec!(1500.00), dec!(1500.06)));
    // The document total is rounded to cents before comparing.
    assert!(amounts_match(dec!(1500.004), dec!(1500.04)));
}

#[test]
fn reconcile_picks_the_matching_invoice() {
    let portal = StaticPortal::new().with_invoices("11111111000111", portal_rows());
    let outcome = reconcile(&portal, "11.111.111/0001-11", dec!(1500.00)).unwrap();
    match outcome {
        ReconcileOutcome::Matched(m) => {
            assert_eq!(m.invoice.invoice_number, "000124");
            assert!(!m.is_ambiguous());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        reconcile(&portal, "11111111000111", dec!(1500.06)).unwrap(),
        ReconcileOutcome::NoMatchingAmount
    );
}

#[test]
fn ties_keep_portal_order() {
    let due = |d| NaiveDate::from_ymd_opt(2025, 11, d).unwrap();
    let invoices = vec![
        CarrierInvoice { invoice_number: "B".into(), due_date: due(30), amount: dec!(99.99) },
        CarrierInvoice { invoice_number: "A".into(), due_date: due(1), amount: dec!(100.00) },
        CarrierInvoice { invoice_number: "C".into(), due_date: due(15), amount: dec!(100.03) },
    ];
    match match_by_amount(dec!(100.00), &invoices) {
        ReconcileOutcome::Matched(m) => {
            assert_eq!(m.invoice.invoice_number, "B");
            assert_eq!(m.candidates, 3);
            assert!(m.is_ambiguous());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn invalid_portal_rows_are_rejected() {
    let err = CarrierInvoice::from_portal_row("9", "31/02/2025", "R$ 1,00").unwrap_err();
    assert!(matches!(err, CarrierError::InvalidRow(_)));
    assert_eq!(
        CarrierInvoice::from_portal_row("9", "01/02/2025", "R$ abc").unwrap_err().to_string(),
        "invalid carrier invoice row: invoice 9: bad amount 'R$ abc'"
    );
}
