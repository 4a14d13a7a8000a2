#![no_main]

use libfuzzer_sys::fuzz_target;
use nfe_ledger::core::CarrierInvoice;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let mut cells = s.splitn(3, '\t');
    let (Some(number), Some(due), Some(amount)) = (cells.next(), cells.next(), cells.next()) else {
        return;
    };
    if let Ok(invoice) = CarrierInvoice::from_portal_row(number, due, amount) {
        let _ = nfe_ledger::core::money::format_brl(invoice.amount);
    }
});
