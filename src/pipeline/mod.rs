//! Document-to-ledger pipeline.
//!
//! Each document goes through parse, own-company filter, installment
//! derivation (or carrier reconciliation for the designated carrier), ledger
//! routing, duplicate check and append. Any step may end the document early
//! with an [`IgnoreReason`] or an error; the batch always continues.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use nfe_ledger::carrier::StaticPortal;
//! use nfe_ledger::core::EngineConfigBuilder;
//! use nfe_ledger::ledger::MemoryLedger;
//! use nfe_ledger::pipeline::{CancelToken, Engine, InboxLabel};
//!
//! let config = EngineConfigBuilder::new()
//!     .company("EH", "ELETRONICA HORIZONTE LTDA", "11111111000111")
//!     .ledger("EH", 2025, "eh-2025")
//!     .build()
//!     .unwrap();
//! let store = MemoryLedger::new().with_document("eh-2025");
//! let portal = StaticPortal::new();
//!
//! let xml = r#"<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe"><NFe><infNFe>
//!   <ide><nNF>4411</nNF></ide>
//!   <emit><CNPJ>33333333000133</CNPJ><xNome>ACME PECAS LTDA</xNome></emit>
//!   <dest><CNPJ>11111111000111</CNPJ></dest>
//!   <total><ICMSTot><vNF>300.00</vNF></ICMSTot></total>
//!   <cobr><dup><nDup>001</nDup><dVenc>2025-11-05</dVenc><vDup>300.00</vDup></dup></cobr>
//! </infNFe></NFe></nfeProc>"#;
//!
//! let mut engine = Engine::new(&config, &store, &portal);
//! let outcome = engine.process_source(Path::new("nfe.xml"), xml, &CancelToken::new());
//! assert_eq!(outcome.written, 1);
//! assert_eq!(outcome.inbox_label(), InboxLabel::Accepted);
//! assert_eq!(store.rows("eh-2025", "Nov/2025").unwrap()[1][1], "ACME PECAS LTDA (Bot)");
//! ```

mod cancel;
mod derive;
mod engine;
mod filter;
mod outcome;

pub use cancel::CancelToken;
pub use derive::{
    Derivation, carrier_installment, invoice_installments, ledger_row, waybill_installment,
    waybill_installments,
};
pub use engine::Engine;
pub use filter::{FilterVerdict, screen_document, screen_supplier};
pub use outcome::{
    BatchReport, Disposition, DocumentOutcome, IgnoreReason, InboxLabel, PipelineStage,
};
