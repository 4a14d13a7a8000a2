use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::calendar::format_br_date;

/// Errors that can occur while turning a tax document into ledger rows.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// The source document could not be read or understood.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The ledger provider rejected a call with a non-retryable error.
    #[error("ledger provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A rate-limited ledger call kept failing until the retry budget ran out.
    #[error("{operation} still rate limited after {attempts} attempts")]
    RetriesExhausted {
        /// Name of the ledger operation that was retried.
        operation: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The carrier billing portal failed.
    #[error("carrier portal error: {0}")]
    Carrier(#[from] CarrierError),

    /// Invalid or inconsistent engine configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors produced by the document parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The file could not be read.
    #[error("cannot read document: {0}")]
    Io(String),

    /// The content is not well-formed XML.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The root element is neither an NF-e nor a CT-e proof.
    #[error("unknown document type <{0}>")]
    UnknownDocumentType(String),

    /// A field required to record the document is absent.
    #[error("missing required field {0}")]
    MissingField(&'static str),

    /// A monetary field does not hold a non-negative decimal number.
    #[error("invalid amount '{value}' in {field}")]
    InvalidAmount {
        /// Element path of the offending field.
        field: &'static str,
        /// Raw text found in the document.
        value: String,
    },
}

impl ParseError {
    /// Whether the error describes broken input (as opposed to a document
    /// that is readable but cannot be recorded).
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Malformed(_))
    }
}

/// Errors reported by a ledger store (the spreadsheet provider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The provider throttled the request; retrying later may succeed.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A worksheet with the requested title already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The ledger document or worksheet does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other failure (permissions, authentication, transport).
    #[error("{0}")]
    Fatal(String),
}

impl ProviderError {
    /// Whether the provider signalled throttling.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Errors reported by the carrier billing portal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CarrierError {
    /// The portal could not be reached or refused the session.
    #[error("carrier portal unavailable: {0}")]
    Unavailable(String),

    /// A row of the portal's invoice table could not be interpreted.
    #[error("invalid carrier invoice row: {0}")]
    InvalidRow(String),
}

/// A non-fatal observation recorded while processing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    /// A `<dup>` node without a usable due date was left out.
    InvalidDueDate { position: usize, raw: String },
    /// A `<dup>` node with a missing, negative or unparsable amount was left out.
    InvalidInstallmentAmount { position: usize, raw: String },
    /// More than one carrier invoice matched the document total.
    AmbiguousCarrierMatch { amount: Decimal, candidates: usize },
    /// The installment is already present in the ledger.
    DuplicateInstallment { number: String, due_date: NaiveDate },
    /// The recipient has no ledger document for the installment's year.
    NoLedgerForYear { company: String, year: i32 },
    /// The run was cancelled before every installment was handled.
    Cancelled,
}

impl Warning {
    /// Whether this warning makes the outcome ambiguous for the inbox.
    pub fn is_ambiguity(&self) -> bool {
        matches!(self, Self::AmbiguousCarrierMatch { .. })
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDueDate { position, raw } => write!(
                f,
                "installment {position} with invalid due date '{raw}' ignored"
            ),
            Self::InvalidInstallmentAmount { position, raw } => write!(
                f,
                "installment {position} with invalid amount '{raw}' ignored"
            ),
            Self::AmbiguousCarrierMatch { amount, candidates } => write!(
                f,
                "multiple invoices with identical amount {amount} ({candidates} candidates), first one used"
            ),
            Self::DuplicateInstallment { number, due_date } => write!(
                f,
                "{number} due {} already recorded",
                format_br_date(*due_date)
            ),
            Self::NoLedgerForYear { company, year } => {
                write!(f, "no ledger configured for {company} in {year}")
            }
            Self::Cancelled => write!(f, "run cancelled before all installments were written"),
        }
    }
}
