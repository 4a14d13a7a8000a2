//! # nfe-ledger
//!
//! Reconciliation engine that turns Brazilian electronic tax documents,
//! invoices (NF-e) and freight waybills (CT-e), into dated rows of a
//! spreadsheet-backed payables ledger.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! No installment is ever recorded twice: a row is identified by its document
//! number and due date.
//!
//! ## Quick Start
//!
//! ```rust
//! use nfe_ledger::carrier::StaticPortal;
//! use nfe_ledger::core::EngineConfigBuilder;
//! use nfe_ledger::ledger::MemoryLedger;
//! use nfe_ledger::pipeline::{CancelToken, Engine};
//!
//! let config = EngineConfigBuilder::new()
//!     .company("EH", "ELETRONICA HORIZONTE LTDA", "11.111.111/0001-11")
//!     .ledger("EH", 2025, "eh-2025")
//!     .build()
//!     .unwrap();
//! let store = MemoryLedger::new().with_document("eh-2025");
//! let portal = StaticPortal::new();
//!
//! let mut engine = Engine::new(&config, &store, &portal);
//! let report = engine.run(Vec::<std::path::PathBuf>::new(), &CancelToken::new());
//! assert_eq!(report.summary(), "0 processed, 0 ignored, 0 errors");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Document types, amounts, dates, retry, configuration, carrier matching |
//! | `xml` | NF-e / CT-e parsing (quick-xml) |
//! | `ledger` | Ledger store trait, worksheet selection, duplicate check, writer |
//! | `pipeline` (default) | The orchestrating [`pipeline::Engine`] |
//! | `config` (default) | JSON configuration loading |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod carrier;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "ledger")]
pub mod ledger;

#[cfg(feature = "pipeline")]
pub mod pipeline;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
