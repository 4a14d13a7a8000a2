use std::fmt;
use std::path::PathBuf;

use crate::core::{LedgerError, ParseError, Warning};

/// How far a document got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Received,
    Parsed,
    Filtered,
    Derived,
    Reconciled,
    Routed,
    DedupChecked,
    Written,
}

/// Why a document was not recorded although nothing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    SelfIssued,
    ExcludedEmitter(String),
    UnknownDocumentType(String),
    MissingField(String),
    Unroutable,
    NoDueDate,
    NoCarrierInvoices,
    NoCarrierMatch,
    AllDuplicates,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfIssued => write!(f, "self-issued document"),
            Self::ExcludedEmitter(fragment) => write!(f, "excluded emitter ({fragment})"),
            Self::UnknownDocumentType(root) => write!(f, "unknown document type <{root}>"),
            Self::MissingField(detail) => write!(f, "{detail}"),
            Self::Unroutable => write!(f, "no ledger configured for this recipient"),
            Self::NoDueDate => write!(f, "no due date information; document not recorded"),
            Self::NoCarrierInvoices => write!(f, "no carrier invoices available"),
            Self::NoCarrierMatch => write!(f, "no invoice with matching amount"),
            Self::AllDuplicates => write!(f, "every installment is already recorded"),
        }
    }
}

impl IgnoreReason {
    /// The rejection a parse error stands for, or `None` when the error means
    /// the input itself is broken.
    pub fn from_parse_error(err: &ParseError) -> Option<Self> {
        match err {
            ParseError::UnknownDocumentType(root) => Some(Self::UnknownDocumentType(root.clone())),
            ParseError::MissingField(_) | ParseError::InvalidAmount { .. } => {
                Some(Self::MissingField(err.to_string()))
            }
            _ => None,
        }
    }
}

/// Final state of one document.
#[derive(Debug)]
pub enum Disposition {
    /// At least one installment was appended.
    Written,
    /// Rejected for a business reason.
    Ignored(IgnoreReason),
    /// Processing failed.
    Errored(LedgerError),
    /// The run was cancelled before anything was written for this document.
    Cancelled,
}

/// Label handed back to the inbox for the source message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxLabel {
    Accepted,
    Rejected,
    Ambiguous,
}

/// Everything the engine has to say about one document.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub source: PathBuf,
    pub disposition: Disposition,
    /// Last stage reached.
    pub stage: PipelineStage,
    /// Rows appended.
    pub written: usize,
    /// Installments skipped as already recorded.
    pub skipped: usize,
    pub warnings: Vec<Warning>,
}

impl DocumentOutcome {
    pub(crate) fn new(source: PathBuf) -> Self {
        Self {
            source,
            disposition: Disposition::Cancelled,
            stage: PipelineStage::Received,
            written: 0,
            skipped: 0,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn ignored(mut self, reason: IgnoreReason) -> Self {
        self.disposition = Disposition::Ignored(reason);
        self
    }

    pub(crate) fn errored(mut self, err: impl Into<LedgerError>) -> Self {
        self.disposition = Disposition::Errored(err.into());
        self
    }

    /// Whether at least one row was appended, whatever the disposition.
    pub fn any_written(&self) -> bool {
        self.written > 0
    }

    /// Whether the document ended as [`Disposition::Written`].
    ///
    /// A document that failed after a partial write is errored, not written:
    /// it goes back to the inbox and duplicate detection skips its recorded
    /// installments on the next run.
    pub fn is_written(&self) -> bool {
        matches!(self.disposition, Disposition::Written)
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self.disposition, Disposition::Ignored(_))
    }

    pub fn is_errored(&self) -> bool {
        matches!(self.disposition, Disposition::Errored(_))
    }

    /// The ignore reason, if the document was ignored.
    pub fn ignore_reason(&self) -> Option<&IgnoreReason> {
        match &self.disposition {
            Disposition::Ignored(reason) => Some(reason),
            _ => None,
        }
    }

    /// Ambiguous when the document was written on the strength of an
    /// ambiguous carrier match, accepted when it was written, rejected
    /// otherwise.
    pub fn inbox_label(&self) -> InboxLabel {
        if !self.is_written() {
            InboxLabel::Rejected
        } else if self.warnings.iter().any(Warning::is_ambiguity) {
            InboxLabel::Ambiguous
        } else {
            InboxLabel::Accepted
        }
    }
}

impl fmt::Display for DocumentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.source.to_string_lossy());
        match &self.disposition {
            Disposition::Written => write!(
                f,
                "{name}: {} row(s) written, {} skipped",
                self.written, self.skipped
            ),
            Disposition::Ignored(reason) => write!(f, "{name}: ignored, {reason}"),
            Disposition::Errored(err) => write!(f, "{name}: error, {err}"),
            Disposition::Cancelled => write!(f, "{name}: cancelled"),
        }
    }
}

/// Aggregate of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    /// Set when the run stopped before every path was handled.
    pub cancelled: bool,
}

impl BatchReport {
    /// Documents that ended written. Every outcome counts in at most one of
    /// [`processed`](Self::processed), [`ignored`](Self::ignored) and
    /// [`errored`](Self::errored).
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn ignored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ignored()).count()
    }

    pub fn errored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_errored()).count()
    }

    /// Rows appended across the batch.
    pub fn rows_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.written).sum()
    }

    /// One-line summary for the operator.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "{} processed, {} ignored, {} errors",
            self.processed(),
            self.ignored(),
            self.errored()
        );
        if self.cancelled {
            s.push_str(" (cancelled)");
        }
        s
    }
}
