//! Namespace-tolerant element classification.
//!
//! Producers prefix XLIFF elements arbitrarily (`xliff:trans-unit`, `x:target`, ...),
//! sometimes without declaring the prefix. Matching is done on the local part of the
//! qualified name so no namespace resolution is needed.

use quick_xml::events::BytesStart;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    TransUnit,
    Source,
    Target,
    Other,
}

impl ElementKind {
    pub fn of(qname: &[u8]) -> Self {
        let local = local_name(qname);
        if local.eq_ignore_ascii_case(b"trans-unit") {
            Self::TransUnit
        } else if local.eq_ignore_ascii_case(b"source") {
            Self::Source
        } else if local.eq_ignore_ascii_case(b"target") {
            Self::Target
        } else {
            Self::Other
        }
    }
}

/// Part of a qualified name after the last `:`.
pub fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|b| *b == b':') {
        Some(i) => &qname[i + 1..],
        None => qname,
    }
}

/// Namespace prefix of a qualified name, if any.
pub fn prefix(qname: &[u8]) -> Option<&[u8]> {
    qname
        .iter()
        .rposition(|b| *b == b':')
        .map(|i| &qname[..i])
        .filter(|p| !p.is_empty())
}

/// Value of the first attribute whose local name matches `local` (ASCII case-insensitive).
pub fn attr(e: &BytesStart, local: &str) -> Option<String> {
    e.attributes()
        .with_checks(false)
        .flatten()
        .find(|a| local_name(a.key.as_ref()).eq_ignore_ascii_case(local.as_bytes()))
        .map(|a| match a.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
        })
}

/// `translate="no"` on this element.
pub fn is_translate_no(e: &BytesStart) -> bool {
    attr(e, "translate").is_some_and(|v| v.trim().eq_ignore_ascii_case("no"))
}
