use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{DocumentKind, format_br_date, money};

/// Number of columns of every ledger worksheet.
pub const COLUMN_COUNT: usize = 9;

/// Index of the due-date column.
pub const DUE_DATE_COLUMN: usize = 0;

/// Index of the document/invoice-number column.
pub const NUMBER_COLUMN: usize = 2;

/// Header row written when a worksheet is created.
pub fn header_row(kind: DocumentKind) -> [String; COLUMN_COUNT] {
    [
        "Vencimento",
        "Descrição",
        kind.number_column(),
        "Valor Total",
        "Qtd Parcelas",
        "Parcela",
        "Valor Parcela",
        "Valor Pago",
        "Status",
    ]
    .map(String::from)
}

/// One payable entry. Rows are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub due_date: NaiveDate,
    pub description: String,
    pub document_number: String,
    pub total_amount: Decimal,
    pub installment_count: usize,
    /// 1-based; rendered as "Nª Parcela".
    pub installment_index: usize,
    pub installment_amount: Decimal,
    /// Filled in by hand once paid; always blank when appended.
    pub paid_amount: Option<Decimal>,
    /// Filled in by hand; always blank when appended.
    pub status: Option<String>,
}

impl LedgerRow {
    /// Cells in the provider's column order.
    pub fn to_cells(&self) -> [String; COLUMN_COUNT] {
        [
            format_br_date(self.due_date),
            self.description.clone(),
            self.document_number.clone(),
            money::format_brl(self.total_amount),
            self.installment_count.to_string(),
            format!("{}ª Parcela", self.installment_index),
            money::format_brl(self.installment_amount),
            self.paid_amount.map(money::format_brl).unwrap_or_default(),
            self.status.clone().unwrap_or_default(),
        ]
    }
}
