use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two supported fiscal document schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// NF-e: electronic sales invoice (`nfeProc`).
    Invoice,
    /// CT-e: electronic freight waybill (`cteProc`).
    Waybill,
}

impl DocumentKind {
    /// Short human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "NF-e",
            Self::Waybill => "CT-e",
        }
    }

    /// Header of the document-number column in a freshly created worksheet.
    pub fn number_column(&self) -> &'static str {
        match self {
            Self::Invoice => "NF",
            Self::Waybill => "CT-e",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed fiscal document. Immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Invoice or waybill.
    pub kind: DocumentKind,
    /// Emitter CNPJ/CPF, digits only.
    pub emitter_tax_id: String,
    /// Emitter legal name as written in the document.
    pub emitter_name: String,
    /// Recipient CNPJ/CPF, digits only.
    pub recipient_tax_id: String,
    /// Document number (`nNF` / `nCT`).
    pub number: String,
    /// Document total (`vNF` / `vTPrest`).
    pub total_amount: Decimal,
    /// File the document was read from.
    pub source_path: PathBuf,
}

/// One `<dup>` node exactly as found in the XML, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInstallment {
    /// 1-based position among the document's `<dup>` nodes.
    pub position: usize,
    /// `nDup`, the issuer's installment identifier.
    pub number: Option<String>,
    /// `dVenc` text.
    pub due_date: Option<String>,
    /// `vDup` text.
    pub amount: Option<String>,
}

/// One scheduled payment of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Number the ledger row is keyed by. For carrier waybills this is the
    /// carrier's own invoice number.
    pub document_number: String,
    /// 1-based index within the document.
    pub sequence_index: usize,
    /// Number of installments the document declares.
    pub total_installments: usize,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Installment amount, never negative.
    pub amount: Decimal,
}

impl Installment {
    /// Label written to the ledger, e.g. "2ª Parcela".
    pub fn label(&self) -> String {
        format!("{}ª Parcela", self.sequence_index)
    }
}

/// Identifies one ledger document: a company's payables for one year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    /// Company code from the configuration (e.g. "EH").
    pub company: String,
    /// Calendar year of the due dates recorded in it.
    pub year: i32,
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.company, self.year)
    }
}

/// An open invoice listed by the carrier's billing portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierInvoice {
    /// The carrier's invoice number.
    pub invoice_number: String,
    /// Due date of the carrier invoice.
    pub due_date: NaiveDate,
    /// Amount billed.
    pub amount: Decimal,
}

/// Strip everything but digits, so formatted and bare CNPJs compare equal.
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
