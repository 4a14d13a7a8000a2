use rust_decimal::Decimal;
use tracing::warn;

use crate::core::{
    CarrierInvoice, Document, Installment, RawInstallment, Warning, money, parse_flexible_date,
    parse_iso_date,
};
use crate::ledger::LedgerRow;

/// Installments of one document plus the warnings raised while deriving them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derivation {
    pub installments: Vec<Installment>,
    pub warnings: Vec<Warning>,
}

impl Derivation {
    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }
}

/// One installment per `<dup>` node of an invoice.
///
/// Index and count follow the issuer's numbering: a node left out for an
/// invalid date or amount still counts, so the remaining labels are unchanged.
pub fn invoice_installments(document: &Document, raw: &[RawInstallment]) -> Derivation {
    let total_installments = raw.len();
    let mut derivation = Derivation::default();

    for dup in raw {
        let Some(due_date) = dup.due_date.as_deref().and_then(parse_iso_date) else {
            let raw_date = dup.due_date.clone().unwrap_or_default();
            warn!(
                document = %document.number,
                position = dup.position,
                due_date = %raw_date,
                "installment with invalid due date ignored"
            );
            derivation.warnings.push(Warning::InvalidDueDate {
                position: dup.position,
                raw: raw_date,
            });
            continue;
        };

        let amount = dup
            .amount
            .as_deref()
            .and_then(money::parse_xml_amount)
            .filter(|a| *a >= Decimal::ZERO);
        let Some(amount) = amount else {
            let raw_amount = dup.amount.clone().unwrap_or_default();
            warn!(
                document = %document.number,
                position = dup.position,
                amount = %raw_amount,
                "installment with invalid amount ignored"
            );
            derivation.warnings.push(Warning::InvalidInstallmentAmount {
                position: dup.position,
                raw: raw_amount,
            });
            continue;
        };

        derivation.installments.push(Installment {
            document_number: document.number.clone(),
            sequence_index: dup.position,
            total_installments,
            due_date,
            amount,
        });
    }

    derivation
}

/// The single installment of a waybill, dated by its delivery forecast.
///
/// `None` without a usable forecast or when the total is negative.
pub fn waybill_installment(document: &Document, delivery_forecast: Option<&str>) -> Option<Installment> {
    if document.total_amount < Decimal::ZERO {
        return None;
    }
    let due_date = delivery_forecast.and_then(parse_flexible_date)?;
    Some(Installment {
        document_number: document.number.clone(),
        sequence_index: 1,
        total_installments: 1,
        due_date,
        amount: document.total_amount,
    })
}

/// [`waybill_installment`] with a warning when the forecast or the total
/// cannot be used.
pub fn waybill_installments(document: &Document, delivery_forecast: Option<&str>) -> Derivation {
    let mut derivation = Derivation::default();
    if document.total_amount < Decimal::ZERO {
        let raw = document.total_amount.to_string();
        warn!(document = %document.number, amount = %raw, "waybill with negative total ignored");
        derivation
            .warnings
            .push(Warning::InvalidInstallmentAmount { position: 1, raw });
        return derivation;
    }
    match waybill_installment(document, delivery_forecast) {
        Some(installment) => derivation.installments.push(installment),
        None => {
            if let Some(raw) = delivery_forecast {
                warn!(document = %document.number, due_date = %raw, "waybill with invalid delivery forecast");
                derivation.warnings.push(Warning::InvalidDueDate {
                    position: 1,
                    raw: raw.to_string(),
                });
            }
        }
    }
    derivation
}

/// The single installment of a designated-carrier waybill: dated and numbered
/// by the matched carrier invoice.
pub fn carrier_installment(document: &Document, invoice: &CarrierInvoice) -> Installment {
    Installment {
        document_number: invoice.invoice_number.clone(),
        sequence_index: 1,
        total_installments: 1,
        due_date: invoice.due_date,
        amount: document.total_amount,
    }
}

/// The ledger row recording `installment`.
pub fn ledger_row(document: &Document, installment: &Installment, description_suffix: &str) -> LedgerRow {
    LedgerRow {
        due_date: installment.due_date,
        description: format!("{}{}", document.emitter_name.trim(), description_suffix),
        document_number: installment.document_number.clone(),
        total_amount: document.total_amount,
        installment_count: installment.total_installments,
        installment_index: installment.sequence_index,
        installment_amount: installment.amount,
        paid_amount: None,
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DocumentKind;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn document(kind: DocumentKind) -> Document {
        Document {
            kind,
            emitter_tax_id: "33333333000133".into(),
            emitter_name: "ACME PECAS LTDA".into(),
            recipient_tax_id: "11111111000111".into(),
            number: "4411".into(),
            total_amount: dec!(3000.00),
            source_path: "nfe.xml".into(),
        }
    }

    fn dup(position: usize, due: &str, amount: &str) -> RawInstallment {
        RawInstallment {
            position,
            number: Some(format!("{position:03}")),
            due_date: Some(due.into()),
            amount: Some(amount.into()),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn one_installment_per_dup() {
        let raw = vec![
            dup(1, "2025-11-05", "1000.00"),
            dup(2, "2025-12-05", "1000.00"),
            dup(3, "2026-01-05", "1000.00"),
        ];
        let d = invoice_installments(&document(DocumentKind::Invoice), &raw);
        assert!(d.warnings.is_empty());
        assert_eq!(d.installments.len(), 3);
        for (i, inst) in d.installments.iter().enumerate() {
            assert_eq!(inst.sequence_index, i + 1);
            assert_eq!(inst.total_installments, 3);
            assert_eq!(inst.document_number, "4411");
        }
        assert_eq!(d.installments[2].due_date, date(2026, 1, 5));
    }

    #[test]
    fn invalid_nodes_are_left_out_with_warnings() {
        let raw = vec![
            dup(1, "05/11/2025x", "1000.00"),
            dup(2, "2025-12-05", "-3"),
            dup(3, "2026-01-05", "1000.00"),
            RawInstallment {
                position: 4,
                ..Default::default()
            },
        ];
        let d = invoice_installments(&document(DocumentKind::Invoice), &raw);
        assert_eq!(d.installments.len(), 1);
        assert_eq!(d.installments[0].sequence_index, 3);
        assert_eq!(d.installments[0].total_installments, 4);
        assert_eq!(
            d.warnings,
            vec![
                Warning::InvalidDueDate {
                    position: 1,
                    raw: "05/11/2025x".into()
                },
                Warning::InvalidInstallmentAmount {
                    position: 2,
                    raw: "-3".into()
                },
                Warning::InvalidDueDate {
                    position: 4,
                    raw: String::new()
                },
            ]
        );
    }

    #[test]
    fn no_dups_means_nothing_to_record() {
        assert!(invoice_installments(&document(DocumentKind::Invoice), &[]).is_empty());
    }

    #[test]
    fn waybill_dates() {
        let doc = document(DocumentKind::Waybill);
        let inst = waybill_installment(&doc, Some("2025-11-20")).unwrap();
        assert_eq!(inst.due_date, date(2025, 11, 20));
        assert_eq!((inst.sequence_index, inst.total_installments), (1, 1));
        assert_eq!(inst.amount, dec!(3000.00));
        assert_eq!(
            waybill_installment(&doc, Some("20/11/2025")).unwrap().due_date,
            date(2025, 11, 20)
        );
        assert!(waybill_installment(&doc, Some("amanha")).is_none());
        assert!(waybill_installment(&doc, None).is_none());
    }

    #[test]
    fn unusable_waybill_forecast_is_reported() {
        let doc = document(DocumentKind::Waybill);
        let d = waybill_installments(&doc, Some("amanha"));
        assert!(d.is_empty());
        assert_eq!(
            d.warnings,
            vec![Warning::InvalidDueDate {
                position: 1,
                raw: "amanha".into()
            }]
        );
        let d = waybill_installments(&doc, None);
        assert!(d.is_empty());
        assert!(d.warnings.is_empty());
        assert_eq!(waybill_installments(&doc, Some("2025-11-20")).installments.len(), 1);
    }

    #[test]
    fn negative_waybill_total_is_never_an_installment() {
        let mut doc = document(DocumentKind::Waybill);
        doc.total_amount = dec!(-5.00);
        assert!(waybill_installment(&doc, Some("2025-11-20")).is_none());
        let d = waybill_installments(&doc, Some("2025-11-20"));
        assert!(d.is_empty());
        assert_eq!(
            d.warnings,
            vec![Warning::InvalidInstallmentAmount {
                position: 1,
                raw: "-5.00".into()
            }]
        );
    }

    #[test]
    fn carrier_invoice_replaces_number_and_date() {
        let doc = document(DocumentKind::Waybill);
        let invoice = CarrierInvoice {
            invoice_number: "778899".into(),
            due_date: date(2025, 12, 10),
            amount: dec!(3000.03),
        };
        let inst = carrier_installment(&doc, &invoice);
        assert_eq!(inst.document_number, "778899");
        assert_eq!(inst.due_date, date(2025, 12, 10));
        assert_eq!(inst.amount, dec!(3000.00));
    }

    #[test]
    fn row_description_and_counts() {
        let doc = document(DocumentKind::Invoice);
        let d = invoice_installments(&doc, &[dup(1, "2025-11-05", "1500"), dup(2, "2025-12-05", "1500")]);
        let row = ledger_row(&doc, &d.installments[1], " (Bot)");
        assert_eq!(row.description, "ACME PECAS LTDA (Bot)");
        assert_eq!(row.installment_index, 2);
        assert_eq!(row.installment_count, 2);
        assert_eq!(row.total_amount, dec!(3000.00));
        assert_eq!(row.installment_amount, dec!(1500));
    }
}
