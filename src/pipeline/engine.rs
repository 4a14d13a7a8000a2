use std::path::Path;

use chrono::Datelike;
use tracing::{debug, error, info, instrument, warn};

use crate::carrier::{self, CarrierPortal, ReconcileOutcome};
use crate::core::{
    Cooldown, DocumentKind, EngineConfig, Installment, LedgerError, ParseError, ThreadCooldown,
    Warning,
};
use crate::ledger::{LedgerSelector, LedgerSession, LedgerStore, worksheet_name};
use crate::xml;

use super::cancel::CancelToken;
use super::derive::{carrier_installment, invoice_installments, ledger_row, waybill_installments};
use super::filter::{FilterVerdict, screen_document, screen_supplier};
use super::outcome::{BatchReport, Disposition, DocumentOutcome, IgnoreReason, PipelineStage};

/// Turns tax documents into ledger rows, one document at a time.
///
/// An engine holds the caches of one run (opened ledgers, worksheet rows).
/// Use one engine per batch; engines never share state.
pub struct Engine<'a> {
    config: &'a EngineConfig,
    portal: &'a dyn CarrierPortal,
    session: LedgerSession<'a>,
}

impl<'a> Engine<'a> {
    /// An engine whose rate-limit cooldown blocks the current thread.
    pub fn new(
        config: &'a EngineConfig,
        store: &'a dyn LedgerStore,
        portal: &'a dyn CarrierPortal,
    ) -> Self {
        Self::with_cooldown(config, store, portal, &ThreadCooldown)
    }

    /// An engine with a custom cooldown.
    pub fn with_cooldown(
        config: &'a EngineConfig,
        store: &'a dyn LedgerStore,
        portal: &'a dyn CarrierPortal,
        cooldown: &'a dyn Cooldown,
    ) -> Self {
        Self {
            config,
            portal,
            session: LedgerSession::new(store, config.retry.policy(), cooldown),
        }
    }

    /// Process `paths` in order. Stops early when `cancel` is set; rows
    /// already written stay.
    pub fn run<I, P>(&mut self, paths: I, cancel: &CancelToken) -> BatchReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = BatchReport::default();
        for path in paths {
            if cancel.is_cancelled() {
                info!("run cancelled, remaining documents left untouched");
                break;
            }
            let outcome = self.process_file(path.as_ref(), cancel);
            match &outcome.disposition {
                Disposition::Written => info!(%outcome, "document recorded"),
                Disposition::Ignored(_) => info!(%outcome, "document ignored"),
                Disposition::Errored(_) => error!(%outcome, "document failed"),
                Disposition::Cancelled => info!(%outcome, "document cancelled"),
            }
            report.outcomes.push(outcome);
        }
        report.cancelled = cancel.is_cancelled();
        info!(summary = %report.summary(), "batch finished");
        report
    }

    /// Read and process one file.
    pub fn process_file(&mut self, path: &Path, cancel: &CancelToken) -> DocumentOutcome {
        match std::fs::read(path) {
            Ok(bytes) => self.process_source(path, &xml::decode(&bytes), cancel),
            Err(e) => DocumentOutcome::new(path.to_path_buf())
                .errored(ParseError::Io(format!("{}: {e}", path.display()))),
        }
    }

    /// Process one document whose content is already in memory.
    #[instrument(skip_all, fields(document = %source.display()))]
    pub fn process_source(&mut self, source: &Path, content: &str, cancel: &CancelToken) -> DocumentOutcome {
        let config = self.config;
        let mut outcome = DocumentOutcome::new(source.to_path_buf());

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let supplier = xml::supplier_name(content);
        if let Some(reason) = rejection(screen_supplier(config, supplier.as_deref(), &file_name)) {
            return outcome.ignored(reason);
        }

        let parsed = match xml::parse_document(content, source) {
            Ok(parsed) => parsed,
            Err(e) => {
                return match IgnoreReason::from_parse_error(&e) {
                    Some(reason) => {
                        warn!(error = %e, "document cannot be recorded");
                        outcome.ignored(reason)
                    }
                    None => outcome.errored(e),
                };
            }
        };
        outcome.stage = PipelineStage::Parsed;
        let document = &parsed.document;
        debug!(kind = %document.kind, number = %document.number, total = %document.total_amount, "parsed");

        if let Some(reason) = rejection(screen_document(config, document)) {
            return outcome.ignored(reason);
        }
        outcome.stage = PipelineStage::Filtered;

        let selector = LedgerSelector::new(config);
        let Some(company) = selector.route(&document.recipient_tax_id) else {
            info!(recipient = %document.recipient_tax_id, "recipient is not an operating company");
            return outcome.ignored(IgnoreReason::Unroutable);
        };

        let installments: Vec<Installment> = if document.kind == DocumentKind::Waybill
            && config.is_designated_carrier(&document.emitter_name, &document.emitter_tax_id)
        {
            outcome.stage = PipelineStage::Derived;
            match carrier::reconcile(self.portal, &document.recipient_tax_id, document.total_amount) {
                Err(e) => return outcome.errored(e),
                Ok(ReconcileOutcome::NoInvoices) => {
                    return outcome.ignored(IgnoreReason::NoCarrierInvoices);
                }
                Ok(ReconcileOutcome::NoMatchingAmount) => {
                    return outcome.ignored(IgnoreReason::NoCarrierMatch);
                }
                Ok(ReconcileOutcome::Matched(m)) => {
                    if m.is_ambiguous() {
                        outcome.warnings.push(Warning::AmbiguousCarrierMatch {
                            amount: document.total_amount,
                            candidates: m.candidates,
                        });
                    }
                    outcome.stage = PipelineStage::Reconciled;
                    vec![carrier_installment(document, &m.invoice)]
                }
            }
        } else {
            let derivation = match document.kind {
                DocumentKind::Invoice => invoice_installments(document, &parsed.installments),
                DocumentKind::Waybill => {
                    waybill_installments(document, parsed.delivery_forecast.as_deref())
                }
            };
            outcome.warnings.extend(derivation.warnings);
            if derivation.installments.is_empty() {
                info!("no usable due date");
                return outcome.ignored(IgnoreReason::NoDueDate);
            }
            outcome.stage = PipelineStage::Derived;
            derivation.installments
        };

        for installment in &installments {
            if cancel.is_cancelled() {
                outcome.warnings.push(Warning::Cancelled);
                break;
            }

            let year = installment.due_date.year();
            let Some(target) = selector.target(company, year) else {
                warn!(company = %company.code, year, "no ledger configured for year, installment left out");
                outcome.warnings.push(Warning::NoLedgerForYear {
                    company: company.code.clone(),
                    year,
                });
                continue;
            };
            outcome.stage = outcome.stage.max(PipelineStage::Routed);
            let title = worksheet_name(installment.due_date);

            let duplicate = match self.session.is_duplicate(
                &target,
                &title,
                document.kind,
                &installment.document_number,
                installment.due_date,
            ) {
                Ok(duplicate) => duplicate,
                Err(e) => return failed(outcome, e),
            };
            outcome.stage = outcome.stage.max(PipelineStage::DedupChecked);
            if duplicate {
                info!(
                    number = %installment.document_number,
                    worksheet = %title,
                    installment = %installment.label(),
                    "already recorded, skipping"
                );
                outcome.skipped += 1;
                outcome.warnings.push(Warning::DuplicateInstallment {
                    number: installment.document_number.clone(),
                    due_date: installment.due_date,
                });
                continue;
            }

            let row = ledger_row(document, installment, &config.description_suffix);
            if let Err(e) = self.session.append(&target, &title, document.kind, &row) {
                return failed(outcome, e);
            }
            outcome.written += 1;
            outcome.stage = PipelineStage::Written;
            info!(
                ledger = %target.key,
                worksheet = %title,
                number = %installment.document_number,
                installment = %installment.label(),
                amount = %installment.amount,
                "row appended"
            );
        }

        outcome.disposition = if outcome.written > 0 {
            Disposition::Written
        } else if cancel.is_cancelled() {
            Disposition::Cancelled
        } else if outcome.skipped > 0 {
            Disposition::Ignored(IgnoreReason::AllDuplicates)
        } else {
            Disposition::Ignored(IgnoreReason::Unroutable)
        };
        outcome
    }
}

fn rejection(verdict: FilterVerdict) -> Option<IgnoreReason> {
    match verdict {
        FilterVerdict::Accept => None,
        FilterVerdict::SelfIssued => Some(IgnoreReason::SelfIssued),
        FilterVerdict::Excluded(fragment) => Some(IgnoreReason::ExcludedEmitter(fragment)),
    }
}

fn failed(outcome: DocumentOutcome, err: LedgerError) -> DocumentOutcome {
    if outcome.written > 0 {
        warn!(written = outcome.written, error = %err, "ledger failure after partial write");
    }
    outcome.errored(err)
}
