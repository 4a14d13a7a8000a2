use crate::core::{Document, EngineConfig};

/// Result of screening a document's emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Nothing against recording the document.
    Accept,
    /// Issued by one of the operating companies.
    SelfIssued,
    /// Emitter or file name contains a configured exclusion fragment.
    Excluded(String),
}

impl FilterVerdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Screen a document before parsing it, using only the supplier name found
/// by a lightweight scan and the file name.
///
/// The designated carrier is never excluded.
pub fn screen_supplier(config: &EngineConfig, supplier: Option<&str>, file_name: &str) -> FilterVerdict {
    let supplier = supplier.unwrap_or("");
    if config.is_own_name(supplier) {
        return FilterVerdict::SelfIssued;
    }
    if config.is_designated_carrier(supplier, "") {
        return FilterVerdict::Accept;
    }
    match config
        .excluded_fragment(supplier)
        .or_else(|| config.excluded_fragment(file_name))
    {
        Some(fragment) => FilterVerdict::Excluded(fragment.to_string()),
        None => FilterVerdict::Accept,
    }
}

/// Screen a parsed document by emitter tax id and name.
pub fn screen_document(config: &EngineConfig, document: &Document) -> FilterVerdict {
    if config.is_own_tax_id(&document.emitter_tax_id) || config.is_own_name(&document.emitter_name) {
        return FilterVerdict::SelfIssued;
    }
    if config.is_designated_carrier(&document.emitter_name, &document.emitter_tax_id) {
        return FilterVerdict::Accept;
    }
    match config.excluded_fragment(&document.emitter_name) {
        Some(fragment) => FilterVerdict::Excluded(fragment.to_string()),
        None => FilterVerdict::Accept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DocumentKind, EngineConfigBuilder};
    use rust_decimal_macros::dec;

    fn config() -> EngineConfig {
        EngineConfigBuilder::new()
            .company("EH", "ELETRONICA HORIZONTE LTDA", "11.111.111/0001-11")
            .ledger("EH", 2025, "eh-2025")
            .exclude_emitter("DOMINIO")
            .build()
            .unwrap()
    }

    fn document(emitter_tax_id: &str, emitter_name: &str) -> Document {
        Document {
            kind: DocumentKind::Invoice,
            emitter_tax_id: emitter_tax_id.into(),
            emitter_name: emitter_name.into(),
            recipient_tax_id: "11111111000111".into(),
            number: "1".into(),
            total_amount: dec!(10),
            source_path: "a.xml".into(),
        }
    }

    #[test]
    fn self_issued_by_tax_id() {
        let verdict = screen_document(&config(), &document("11111111000111", "OUTRO NOME"));
        assert_eq!(verdict, FilterVerdict::SelfIssued);
    }

    #[test]
    fn self_issued_by_name() {
        let verdict = screen_document(&config(), &document("1", "Eletronica Horizonte Ltda"));
        assert_eq!(verdict, FilterVerdict::SelfIssued);
    }

    #[test]
    fn excluded_emitter() {
        let verdict = screen_document(&config(), &document("5", "DOMINIO SISTEMAS LTDA"));
        assert_eq!(verdict, FilterVerdict::Excluded("DOMINIO".into()));
        assert!(screen_document(&config(), &document("5", "ACME PECAS")).is_accept());
    }

    #[test]
    fn supplier_screen_uses_file_name() {
        let cfg = config();
        assert_eq!(
            screen_supplier(&cfg, None, "nfe_dominio_123.xml"),
            FilterVerdict::Excluded("DOMINIO".into())
        );
        assert_eq!(
            screen_supplier(&cfg, Some("ELETRONICA HORIZONTE LTDA"), "x.xml"),
            FilterVerdict::SelfIssued
        );
        assert!(screen_supplier(&cfg, Some("ACME"), "x.xml").is_accept());
    }

    #[test]
    fn carrier_is_never_excluded() {
        let cfg = EngineConfigBuilder::new()
            .company("EH", "EH LTDA", "11111111000111")
            .exclude_emitter("TRANSPORTES")
            .build()
            .unwrap();
        assert!(screen_supplier(&cfg, Some("BRASPRESS TRANSPORTES URGENTES"), "cte.xml").is_accept());
        assert!(screen_document(&cfg, &document("9", "BRASPRESS TRANSPORTES URGENTES")).is_accept());
        assert_eq!(
            screen_document(&cfg, &document("9", "RODONAVES TRANSPORTES")),
            FilterVerdict::Excluded("TRANSPORTES".into())
        );
    }
}
