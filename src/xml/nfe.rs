use std::path::Path;

use super::reader::{Element, Ns, Visitor, path_ends_with};
use super::{ParsedDocument, TaxDocumentSchema, required_amount, required_text};
use crate::core::*;

/// Field extraction for NF-e (`nfeProc`) documents.
#[derive(Default)]
pub(crate) struct NfeSchema {
    emitter_tax_id: Option<String>,
    emitter_name: Option<String>,
    recipient_tax_id: Option<String>,
    number: Option<String>,
    total: Option<String>,
    installments: Vec<RawInstallment>,
    current_dup: Option<RawInstallment>,
}

impl Visitor for NfeSchema {
    fn start(&mut self, path: &[Element]) {
        if path_ends_with(path, Ns::Nfe, &["cobr", "dup"]) {
            self.current_dup = Some(RawInstallment {
                position: self.installments.len() + 1,
                ..Default::default()
            });
        }
    }

    fn text(&mut self, path: &[Element], text: &str) {
        let at = |tail: &[&str]| path_ends_with(path, Ns::Nfe, tail);

        if at(&["emit", "CNPJ"]) || at(&["emit", "CPF"]) {
            self.emitter_tax_id.get_or_insert_with(|| text.to_string());
        } else if at(&["emit", "xNome"]) {
            self.emitter_name.get_or_insert_with(|| text.to_string());
        } else if at(&["dest", "CNPJ"]) || at(&["dest", "CPF"]) {
            self.recipient_tax_id.get_or_insert_with(|| text.to_string());
        } else if at(&["ide", "nNF"]) {
            self.number.get_or_insert_with(|| text.to_string());
        } else if at(&["ICMSTot", "vNF"]) {
            self.total.get_or_insert_with(|| text.to_string());
        } else if let Some(dup) = self.current_dup.as_mut() {
            if at(&["dup", "nDup"]) {
                dup.number = Some(text.to_string());
            } else if at(&["dup", "dVenc"]) {
                dup.due_date = Some(text.to_string());
            } else if at(&["dup", "vDup"]) {
                dup.amount = Some(text.to_string());
            }
        }
    }

    fn end(&mut self, _path: &[Element], ended: &Element) {
        if ended.name == "dup" && ended.is_in(Ns::Nfe) {
            if let Some(dup) = self.current_dup.take() {
                self.installments.push(dup);
            }
        }
    }
}

impl TaxDocumentSchema for NfeSchema {
    const KIND: DocumentKind = DocumentKind::Invoice;

    fn finish(self, source: &Path) -> Result<ParsedDocument, ParseError> {
        let document = Document {
            kind: Self::KIND,
            emitter_tax_id: normalize_tax_id(&required_text(self.emitter_tax_id, "emit/CNPJ")?),
            emitter_name: self.emitter_name.unwrap_or_else(|| "-".into()),
            recipient_tax_id: normalize_tax_id(&required_text(
                self.recipient_tax_id,
                "dest/CNPJ",
            )?),
            number: required_text(self.number, "ide/nNF")?,
            total_amount: required_amount(self.total, "ICMSTot/vNF")?,
            source_path: source.to_path_buf(),
        };
        Ok(ParsedDocument {
            document,
            installments: self.installments,
            delivery_forecast: None,
        })
    }
}
