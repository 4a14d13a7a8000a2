use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;

use super::{CTE_NAMESPACE, NFE_NAMESPACE};
use crate::core::ParseError;

/// Namespace an element resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ns {
    Nfe,
    Cte,
    /// No namespace in scope.
    Unbound,
    Other,
}

/// An open element on the walker's path.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub ns: Ns,
    pub name: String,
}

impl Element {
    /// Whether the element belongs to `ns`. Unbound elements are accepted for
    /// any namespace, so documents stripped of `xmlns` still parse.
    pub fn is_in(&self, ns: Ns) -> bool {
        self.ns == ns || self.ns == Ns::Unbound
    }
}

/// Callbacks driven by [`walk`].
pub(crate) trait Visitor {
    fn start(&mut self, _path: &[Element]) {}
    fn text(&mut self, path: &[Element], text: &str);
    fn end(&mut self, _path: &[Element], _ended: &Element) {}
}

/// Whether the last elements of `path` are `tail`, all within `ns`.
pub(crate) fn path_ends_with(path: &[Element], ns: Ns, tail: &[&str]) -> bool {
    if path.len() < tail.len() {
        return false;
    }
    path[path.len() - tail.len()..]
        .iter()
        .zip(tail)
        .all(|(el, name)| el.is_in(ns) && el.name == *name)
}

fn element(ns: ResolveResult<'_>, local: &[u8]) -> Element {
    let ns = match ns {
        ResolveResult::Bound(namespace) if namespace.0 == NFE_NAMESPACE.as_bytes() => Ns::Nfe,
        ResolveResult::Bound(namespace) if namespace.0 == CTE_NAMESPACE.as_bytes() => Ns::Cte,
        ResolveResult::Unbound => Ns::Unbound,
        _ => Ns::Other,
    };
    Element {
        ns,
        name: String::from_utf8_lossy(local).into_owned(),
    }
}

/// Local name of the document's root element.
pub(crate) fn root_name(xml: &str) -> Result<String, ParseError> {
    let mut reader = NsReader::from_str(xml);
    loop {
        match reader.read_resolved_event() {
            Ok((_, Event::Start(e))) | Ok((_, Event::Empty(e))) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok((_, Event::Eof)) => {
                return Err(ParseError::Malformed("document has no root element".into()));
            }
            Err(e) => return Err(ParseError::Malformed(format!("XML parse error: {e}"))),
            _ => {}
        }
    }
}

/// Walk the whole document, feeding every element and text node to `visitor`.
pub(crate) fn walk(xml: &str, visitor: &mut impl Visitor) -> Result<(), ParseError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Element> = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => {
                path.push(element(ns, e.local_name().as_ref()));
                seen_root = true;
                visitor.start(&path);
            }
            Ok((ns, Event::Empty(e))) => {
                path.push(element(ns, e.local_name().as_ref()));
                seen_root = true;
                visitor.start(&path);
                if let Some(ended) = path.pop() {
                    visitor.end(&path, &ended);
                }
            }
            Ok((_, Event::Text(e))) => {
                let text = e
                    .unescape()
                    .map_err(|err| ParseError::Malformed(format!("invalid text: {err}")))?;
                let text = text.trim();
                if !text.is_empty() && !path.is_empty() {
                    visitor.text(&path, text);
                }
            }
            Ok((_, Event::CData(e))) => {
                let raw = e.into_inner();
                let text = String::from_utf8_lossy(&raw);
                let text = text.trim();
                if !text.is_empty() && !path.is_empty() {
                    visitor.text(&path, text);
                }
            }
            Ok((_, Event::End(_))) => {
                let ended = path
                    .pop()
                    .ok_or_else(|| ParseError::Malformed("unexpected closing tag".into()))?;
                visitor.end(&path, &ended);
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(ParseError::Malformed(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    if let Some(open) = path.last() {
        return Err(ParseError::Malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    if !seen_root {
        return Err(ParseError::Malformed("document has no root element".into()));
    }
    Ok(())
}
