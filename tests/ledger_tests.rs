#![cfg(feature = "ledger")]

use std::time::Duration;

use chrono::NaiveDate;
use nfe_ledger::core::*;
use nfe_ledger::ledger::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct NoWait;

impl Cooldown for NoWait {
    fn wait(&self, _duration: Duration) {}
}

fn config() -> EngineConfig {
    EngineConfigBuilder::new()
        .company("EH", "ELETRONICA HORIZONTE LTDA", "11.111.111/0001-11")
        .company("MVA", "MVA COMERCIO LTDA", "22.222.222/0001-22")
        .ledger("EH", 2025, "eh-2025")
        .ledger("MVA", 2025, "mva-2025")
        .build()
        .unwrap()
}

fn row(number: &str, due: NaiveDate) -> LedgerRow {
    LedgerRow {
        due_date: due,
        description: "TRANSPORTES SUL (Bot)".into(),
        document_number: number.into(),
        total_amount: dec!(1234.5),
        installment_count: 1,
        installment_index: 1,
        installment_amount: dec!(1234.5),
        paid_amount: None,
        status: None,
    }
}

#[test]
fn every_month_has_its_worksheet_name() {
    let names: Vec<String> = (1..=12).map(|m| worksheet_name(date(2025, m, 15))).collect();
    insta::assert_snapshot!(names.join(" "), @"Jan/2025 Fev/2025 Mar/2025 Abr/2025 Mai/2025 Jun/2025 Jul/2025 Ago/2025 Set/2025 Out/2025 Nov/2025 Dez/2025");
}

#[test]
fn header_layout() {
    insta::assert_snapshot!(
        header_row(DocumentKind::Invoice).join(" | "),
        @"Vencimento | Descrição | NF | Valor Total | Qtd Parcelas | Parcela | Valor Parcela | Valor Pago | Status"
    );
}

#[test]
fn selector_routes_by_recipient_and_year() {
    let cfg = config();
    let selector = LedgerSelector::new(&cfg);
    let company = selector.route("22.222.222/0001-22").unwrap();
    assert_eq!(company.code, "MVA");
    let target = selector.target(company, 2025).unwrap();
    assert_eq!(target.key.to_string(), "MVA 2025");
    assert_eq!(target.document_id, "mva-2025");
    assert!(selector.target(company, 2024).is_none());
    assert!(selector.route("33333333000133").is_none());
}

#[test]
fn session_writes_rows_the_ledger_can_dedup() {
    let cfg = config();
    let store = MemoryLedger::new().with_document("eh-2025");
    let target = LedgerSelector::new(&cfg)
        .select("11111111000111", date(2025, 4, 30))
        .unwrap();
    let title = worksheet_name(date(2025, 4, 30));
    let mut session = LedgerSession::new(&store, RetryPolicy::default(), &NoWait);

    session
        .append(&target, &title, DocumentKind::Waybill, &row("881", date(2025, 4, 30)))
        .unwrap();

    let rows = store.rows("eh-2025", "Abr/2025").unwrap();
    assert_eq!(rows[0][NUMBER_COLUMN], "CT-e");
    insta::assert_snapshot!(format!("{:?}", rows[1]), @r#"["30/04/2025", "TRANSPORTES SUL (Bot)", "881", "R$ 1.234,50", "1", "1ª Parcela", "R$ 1.234,50", "", ""]"#);

    // A second session reads the row back from the store.
    let mut fresh = LedgerSession::new(&store, RetryPolicy::default(), &NoWait);
    assert!(fresh
        .is_duplicate(&target, &title, DocumentKind::Waybill, "881", date(2025, 4, 30))
        .unwrap());
    assert!(!fresh
        .is_duplicate(&target, &title, DocumentKind::Waybill, "881", date(2025, 4, 29))
        .unwrap());
    assert_eq!(store.calls(StoreCall::Create), 1);
}

#[test]
fn hand_edited_rows_do_not_confuse_dedup() {
    let rows: Vec<Vec<String>> = vec![
        header_row(DocumentKind::Invoice).to_vec(),
        vec!["".into(), "Observação".into(), "".into()],
        vec!["TOTAL".into()],
        vec![" 05/11/2025".into(), "ACME (Bot)".into(), "4411 ".into(), "R$ 1,00".into()],
    ];
    assert!(contains_installment(&rows, "4411", date(2025, 11, 5)));
    assert!(!contains_installment(&rows, "Observação", date(2025, 11, 5)));
    assert_eq!(rows.iter().filter(|r| is_entry_row(r)).count(), 1);
}

#[test]
fn non_retryable_provider_errors_pass_through() {
    let store = MemoryLedger::new().with_document("eh-2025");
    store.fail_next(StoreCall::Exists, ProviderError::Fatal("403 forbidden".into()));
    let cfg = config();
    let target = LedgerSelector::new(&cfg)
        .select("11111111000111", date(2025, 1, 2))
        .unwrap();
    let mut session = LedgerSession::new(&store, RetryPolicy::default(), &NoWait);
    let err = session
        .worksheet_rows(&target, "Jan/2025", DocumentKind::Invoice)
        .unwrap_err();
    assert_eq!(err.to_string(), "ledger provider error: 403 forbidden");
    assert_eq!(store.calls(StoreCall::Exists), 1);
}

#[test]
fn cooldown_length_comes_from_the_policy() {
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Duration>>);

    impl Cooldown for Recorder {
        fn wait(&self, duration: Duration) {
            self.0.borrow_mut().push(duration);
        }
    }

    let cfg = EngineConfigBuilder::new()
        .company("EH", "EH", "11111111000111")
        .ledger("EH", 2025, "eh-2025")
        .retry(4, 5)
        .build()
        .unwrap();
    let store = MemoryLedger::new().with_document("eh-2025");
    for _ in 0..3 {
        store.fail_next(StoreCall::Open, ProviderError::RateLimited("quota".into()));
    }
    let target = LedgerSelector::new(&cfg)
        .select("11111111000111", date(2025, 6, 1))
        .unwrap();
    let recorder = Recorder::default();
    let mut session = LedgerSession::new(&store, cfg.retry.policy(), &recorder);
    session.open(&target).unwrap();
    assert_eq!(*recorder.0.borrow(), vec![Duration::from_secs(5); 3]);
}
