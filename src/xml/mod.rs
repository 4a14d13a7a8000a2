//! NF-e / CT-e XML parsing.
//!
//! A single namespace-aware event walker feeds one [`TaxDocumentSchema`] per
//! document kind; each schema owns its field extraction.
//!
//! # Example
//!
//! ```
//! use nfe_ledger::core::DocumentKind;
//! use nfe_ledger::xml;
//!
//! let xml = r#"<cteProc xmlns="http://www.portalfiscal.inf.br/cte"><CTe><infCte>
//!   <ide><nCT>881</nCT></ide>
//!   <emit><CNPJ>48740351000165</CNPJ><xNome>TRANSPORTES SUL</xNome></emit>
//!   <dest><CNPJ>11111111000111</CNPJ></dest>
//!   <vPrest><vTPrest>150.00</vTPrest></vPrest>
//! </infCte></CTe></cteProc>"#;
//!
//! let parsed = xml::parse_document(xml, "cte.xml").unwrap();
//! assert_eq!(parsed.document.kind, DocumentKind::Waybill);
//! assert_eq!(parsed.document.number, "881");
//! ```

mod cte;
mod nfe;
mod reader;

use std::borrow::Cow;
use std::path::Path;

use rust_decimal::Decimal;

use crate::core::*;
use cte::CteSchema;
use nfe::NfeSchema;
use reader::{Element, Ns, Visitor};

/// NF-e namespace URI.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// CT-e namespace URI.
pub const CTE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/cte";

/// Output of the parser: the document plus the raw nodes the installment
/// deriver needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// The parsed document.
    pub document: Document,
    /// Invoice `<dup>` nodes in document order (empty for waybills).
    pub installments: Vec<RawInstallment>,
    /// Waybill delivery forecast (`compl/Entrega/comData/dProg`).
    pub delivery_forecast: Option<String>,
}

/// One fiscal document schema.
pub(crate) trait TaxDocumentSchema: Visitor + Default {
    const KIND: DocumentKind;

    /// Turn the collected fields into a document.
    fn finish(self, source: &Path) -> Result<ParsedDocument, ParseError>;
}

/// Classify a root element name: `...nfeProc` is an invoice, `...cteProc` a
/// waybill.
pub fn classify_root(root: &str) -> Option<DocumentKind> {
    let root = root.to_ascii_lowercase();
    if root.ends_with("nfeproc") {
        Some(DocumentKind::Invoice)
    } else if root.ends_with("cteproc") {
        Some(DocumentKind::Waybill)
    } else {
        None
    }
}

/// Parse an XML string. `source` is recorded as the document's origin.
pub fn parse_document(xml: &str, source: impl AsRef<Path>) -> Result<ParsedDocument, ParseError> {
    let root = reader::root_name(xml)?;
    match classify_root(&root) {
        Some(DocumentKind::Invoice) => parse_with::<NfeSchema>(xml, source.as_ref()),
        Some(DocumentKind::Waybill) => parse_with::<CteSchema>(xml, source.as_ref()),
        None => Err(ParseError::UnknownDocumentType(root)),
    }
}

/// Read and parse an XML file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParsedDocument, ParseError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ParseError::Io(format!("{}: {e}", path.display())))?;
    parse_document(&decode(&bytes), path)
}

fn parse_with<S: TaxDocumentSchema>(xml: &str, source: &Path) -> Result<ParsedDocument, ParseError> {
    let mut schema = S::default();
    reader::walk(xml, &mut schema)?;
    schema.finish(source)
}

/// Decode file content: UTF-8 (BOM stripped), falling back to ISO-8859-1.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

#[derive(Default)]
struct SupplierName {
    nfe: Option<String>,
    cte: Option<String>,
    unbound: Option<String>,
}

impl Visitor for SupplierName {
    fn text(&mut self, path: &[Element], text: &str) {
        if path.len() < 2 {
            return;
        }
        let (parent, leaf) = (&path[path.len() - 2], &path[path.len() - 1]);
        if parent.name != "emit" || leaf.name != "xNome" || parent.ns != leaf.ns {
            return;
        }
        let slot = match leaf.ns {
            Ns::Nfe => &mut self.nfe,
            Ns::Cte => &mut self.cte,
            Ns::Unbound => &mut self.unbound,
            Ns::Other => return,
        };
        slot.get_or_insert_with(|| text.to_string());
    }
}

/// Emitter name of an NF-e or CT-e, upper-cased, without a full parse.
///
/// The invoice namespace is consulted first, the waybill namespace second.
/// Returns `None` when the name is absent or the XML is unreadable.
pub fn supplier_name(xml: &str) -> Option<String> {
    let mut v = SupplierName::default();
    reader::walk(xml, &mut v).ok()?;
    v.nfe
        .or(v.cte)
        .or(v.unbound)
        .map(|n| n.trim().to_uppercase())
        .filter(|n| !n.is_empty())
}

/// [`supplier_name`] for a file on disk.
pub fn supplier_name_from_file(path: impl AsRef<Path>) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    supplier_name(&decode(&bytes))
}

pub(crate) fn required_text(value: Option<String>, field: &'static str) -> Result<String, ParseError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ParseError::MissingField(field))
}

/// A document total: a decimal number that is not negative.
pub(crate) fn required_amount(
    value: Option<String>,
    field: &'static str,
) -> Result<Decimal, ParseError> {
    let raw = required_text(value, field)?;
    money::parse_xml_amount(&raw)
        .filter(|amount| *amount >= Decimal::ZERO)
        .ok_or(ParseError::InvalidAmount { field, value: raw })
}
