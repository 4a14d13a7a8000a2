use std::path::Path;

use super::reader::{Element, Ns, Visitor, path_ends_with};
use super::{ParsedDocument, TaxDocumentSchema, required_amount, required_text};
use crate::core::*;

/// Field extraction for CT-e (`cteProc`) documents.
#[derive(Default)]
pub(crate) struct CteSchema {
    emitter_tax_id: Option<String>,
    emitter_name: Option<String>,
    recipient_tax_id: Option<String>,
    number: Option<String>,
    total: Option<String>,
    delivery_forecast: Option<String>,
}

impl Visitor for CteSchema {
    fn text(&mut self, path: &[Element], text: &str) {
        let at = |tail: &[&str]| path_ends_with(path, Ns::Cte, tail);

        if at(&["emit", "CNPJ"]) || at(&["emit", "CPF"]) {
            self.emitter_tax_id.get_or_insert_with(|| text.to_string());
        } else if at(&["emit", "xNome"]) {
            self.emitter_name.get_or_insert_with(|| text.to_string());
        } else if at(&["dest", "CNPJ"]) || at(&["dest", "CPF"]) {
            self.recipient_tax_id.get_or_insert_with(|| text.to_string());
        } else if at(&["ide", "nCT"]) {
            self.number.get_or_insert_with(|| text.to_string());
        } else if at(&["vPrest", "vTPrest"]) {
            self.total.get_or_insert_with(|| text.to_string());
        } else if at(&["compl", "Entrega", "comData", "dProg"]) {
            self.delivery_forecast.get_or_insert_with(|| text.to_string());
        }
    }
}

impl TaxDocumentSchema for CteSchema {
    const KIND: DocumentKind = DocumentKind::Waybill;

    fn finish(self, source: &Path) -> Result<ParsedDocument, ParseError> {
        let document = Document {
            kind: Self::KIND,
            emitter_tax_id: normalize_tax_id(&required_text(self.emitter_tax_id, "emit/CNPJ")?),
            emitter_name: self.emitter_name.unwrap_or_else(|| "-".into()),
            recipient_tax_id: normalize_tax_id(&required_text(
                self.recipient_tax_id,
                "dest/CNPJ",
            )?),
            number: required_text(self.number, "ide/nCT")?,
            total_amount: required_amount(self.total, "vPrest/vTPrest")?,
            source_path: source.to_path_buf(),
        };
        Ok(ParsedDocument {
            document,
            installments: Vec::new(),
            delivery_forecast: self.delivery_forecast,
        })
    }
}
