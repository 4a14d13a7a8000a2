use chrono::{Datelike, NaiveDate};

use crate::core::{CompanyConfig, EngineConfig, LedgerKey, month_abbreviation};

/// A resolved ledger document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerTarget {
    pub key: LedgerKey,
    /// Provider id of the ledger document.
    pub document_id: String,
}

/// Maps recipients and due dates to ledger documents and worksheets.
#[derive(Debug, Clone, Copy)]
pub struct LedgerSelector<'a> {
    config: &'a EngineConfig,
}

impl<'a> LedgerSelector<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// The operating company a document is addressed to, if any.
    pub fn route(&self, recipient_tax_id: &str) -> Option<&'a CompanyConfig> {
        self.config.company_by_tax_id(recipient_tax_id)
    }

    /// The ledger document holding `company`'s payables for `year`.
    pub fn target(&self, company: &CompanyConfig, year: i32) -> Option<LedgerTarget> {
        company.ledgers.get(&year).map(|document_id| LedgerTarget {
            key: LedgerKey {
                company: company.code.clone(),
                year,
            },
            document_id: document_id.clone(),
        })
    }

    /// Ledger document for a recipient and due date in one step.
    pub fn select(&self, recipient_tax_id: &str, due_date: NaiveDate) -> Option<LedgerTarget> {
        self.route(recipient_tax_id)
            .and_then(|company| self.target(company, due_date.year()))
    }
}

/// Worksheet title for a due date: month abbreviation and year, e.g. "Nov/2025".
pub fn worksheet_name(due_date: NaiveDate) -> String {
    format!("{}/{:04}", month_abbreviation(due_date), due_date.year())
}
