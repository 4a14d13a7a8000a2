//! Run the pipeline over a directory of XML files against an in-memory ledger.
//!
//! ```text
//! cargo run --example process_batch -- config.json ./inbox
//! ```
//!
//! Without arguments a small sample batch is generated in a temporary
//! directory.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use nfe_ledger::carrier::StaticPortal;
use nfe_ledger::core::*;
use nfe_ledger::ledger::MemoryLedger;
use nfe_ledger::pipeline::{CancelToken, Engine};
use rust_decimal_macros::dec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SAMPLE_INVOICE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00"><NFe><infNFe>
  <ide><nNF>4411</nNF></ide>
  <emit><CNPJ>33333333000133</CNPJ><xNome>ACME PECAS LTDA</xNome></emit>
  <dest><CNPJ>11111111000111</CNPJ><xNome>ELETRONICA HORIZONTE LTDA</xNome></dest>
  <total><ICMSTot><vNF>3000.00</vNF></ICMSTot></total>
  <cobr>
    <dup><nDup>001</nDup><dVenc>2025-11-05</dVenc><vDup>1000.00</vDup></dup>
    <dup><nDup>002</nDup><dVenc>2025-12-05</dVenc><vDup>1000.00</vDup></dup>
    <dup><nDup>003</nDup><dVenc>2026-01-05</dVenc><vDup>1000.00</vDup></dup>
  </cobr>
</infNFe></NFe></nfeProc>"#;

const SAMPLE_WAYBILL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cteProc xmlns="http://www.portalfiscal.inf.br/cte" versao="4.00"><CTe><infCte>
  <ide><nCT>90210</nCT></ide>
  <compl><Entrega><semData><tpPer>0</tpPer></semData></Entrega></compl>
  <emit><CNPJ>48740351000165</CNPJ><xNome>BRASPRESS TRANSPORTES URGENTES LTDA</xNome></emit>
  <dest><CNPJ>11111111000111</CNPJ></dest>
  <vPrest><vTPrest>1500.00</vTPrest></vPrest>
</infCte></CTe></cteProc>"#;

fn sample_config() -> EngineConfig {
    EngineConfigBuilder::new()
        .company("EH", "ELETRONICA HORIZONTE LTDA", "11.111.111/0001-11")
        .ledger("EH", 2025, "eh-2025")
        .ledger("EH", 2026, "eh-2026")
        .exclude_emitter("DOMINIO")
        .build()
        .expect("sample configuration is valid")
}

fn xml_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,nfe_ledger=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let sample_dir = tempfile::tempdir().expect("temporary directory");

    let (config, inbox) = match args.as_slice() {
        [config, inbox] => (
            EngineConfig::from_json_file(config).expect("valid configuration"),
            PathBuf::from(inbox),
        ),
        _ => {
            std::fs::write(sample_dir.path().join("nfe_4411.xml"), SAMPLE_INVOICE).expect("write sample");
            std::fs::write(sample_dir.path().join("cte_90210.xml"), SAMPLE_WAYBILL).expect("write sample");
            (sample_config(), sample_dir.path().to_path_buf())
        }
    };

    let store = MemoryLedger::new();
    for company in &config.companies {
        for document_id in company.ledgers.values() {
            store.add_document(document_id);
        }
    }
    let portal = StaticPortal::new().with_invoices(
        "11111111000111",
        vec![CarrierInvoice {
            invoice_number: "778899".into(),
            due_date: NaiveDate::from_ymd_opt(2025, 11, 20).expect("valid date"),
            amount: dec!(1500.03),
        }],
    );

    let files = xml_files(&inbox).expect("readable inbox directory");
    let mut engine = Engine::new(&config, &store, &portal);
    let report = engine.run(&files, &CancelToken::new());

    for outcome in &report.outcomes {
        println!("{outcome} [{:?}]", outcome.inbox_label());
        for warning in &outcome.warnings {
            println!("  warning: {warning}");
        }
    }
    println!("{}", report.summary());

    for company in &config.companies {
        for (year, document_id) in &company.ledgers {
            for title in store.worksheets(document_id) {
                println!("\n== {} {year} / {title} ==", company.code);
                for row in store.rows(document_id, &title).unwrap_or_default() {
                    println!("{}", row.join(" | "));
                }
            }
        }
    }
}
