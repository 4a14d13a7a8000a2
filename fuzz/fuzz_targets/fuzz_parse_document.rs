#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are fine, panics are bugs. Decoding never fails.
    let xml = nfe_ledger::xml::decode(data);
    let _ = nfe_ledger::xml::parse_document(&xml, "fuzz.xml");
});
