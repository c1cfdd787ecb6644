//! Single-pass scanner shared by extraction and write-back.
//!
//! Every byte of the input belongs to exactly one event (`trim_text(false)`), so the
//! reader position before an event is that event's start offset. Units keep byte
//! ranges into the original string which lets write-back splice edits without
//! touching anything else.

use std::ops::Range;

use locsync_core::{LocSyncError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::markup::{self, ElementKind};

const BOM: char = '\u{feff}';

/// A `source` or `target` element inside a unit.
#[derive(Debug, Clone)]
pub(crate) struct RawPart {
    /// `<target ...>`, or the whole element when self-closing.
    pub start_tag: Range<usize>,
    /// Bytes between start and end tag; `None` for `<target/>`.
    pub inner: Option<Range<usize>>,
    /// Concatenated, unescaped character data of all descendants.
    pub text: String,
    pub has_children: bool,
    pub state: Option<String>,
}

impl RawPart {
    /// Inner markup when inline elements are present, plain text otherwise.
    pub fn content(&self, doc: &str) -> String {
        match (&self.inner, self.has_children) {
            (Some(r), true) => doc[r.clone()].to_string(),
            _ => self.text.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawUnit {
    pub index: usize,
    pub id: Option<String>,
    pub translatable: bool,
    pub match_quality: Option<String>,
    pub prefix: Option<String>,
    /// Offset of `</trans-unit>`; `None` for a self-closing unit.
    pub close_at: Option<usize>,
    pub source: Option<RawPart>,
    pub target: Option<RawPart>,
}

impl RawUnit {
    pub fn effective_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("seg-{}", self.index))
    }

    pub fn source_text(&self, doc: &str) -> String {
        self.source.as_ref().map(|p| p.content(doc)).unwrap_or_default()
    }

    pub fn target_text(&self, doc: &str) -> String {
        self.target.as_ref().map(|p| p.content(doc)).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Source,
    Target,
}

struct Frame {
    translate_no: bool,
}

struct Capture {
    unit: usize,
    slot: Slot,
    /// Stack index of the captured element.
    depth: usize,
    inner_start: usize,
    part: RawPart,
}

fn xml_err(e: impl std::fmt::Display) -> color_eyre::eyre::Report {
    LocSyncError::Xml(e.to_string()).into()
}

fn slot_of(kind: ElementKind) -> Option<Slot> {
    match kind {
        ElementKind::Source => Some(Slot::Source),
        ElementKind::Target => Some(Slot::Target),
        _ => None,
    }
}

fn slot_free(unit: &RawUnit, slot: Slot) -> bool {
    match slot {
        Slot::Source => unit.source.is_none(),
        Slot::Target => unit.target.is_none(),
    }
}

fn store(unit: &mut RawUnit, slot: Slot, part: RawPart) {
    match slot {
        Slot::Source => unit.source = Some(part),
        Slot::Target => unit.target = Some(part),
    }
}

/// Scan `doc` and return every translation unit in document order.
///
/// A leading byte-order mark is not seen by the reader; ranges are shifted by its
/// length so they still index into `doc`.
pub(crate) fn scan_units(doc: &str) -> Result<Vec<RawUnit>> {
    let (bom, body) = match doc.strip_prefix(BOM) {
        Some(rest) => (BOM.len_utf8(), rest),
        None => (0, doc),
    };
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Frame> = Vec::new();
    let mut units: Vec<RawUnit> = Vec::new();
    // (index into `units`, stack index of the unit element)
    let mut open_units: Vec<(usize, usize)> = Vec::new();
    let mut capture: Option<Capture> = None;
    let mut seen_root = false;

    loop {
        let pos = bom + reader.buffer_position() as usize;
        let event = reader.read_event().map_err(xml_err)?;
        let after = bom + reader.buffer_position() as usize;
        match event {
            Event::Start(e) => {
                seen_root = true;
                let kind = ElementKind::of(e.name().as_ref());
                let translate_no = markup::is_translate_no(&e);
                let depth = stack.len();
                if let Some(c) = capture.as_mut() {
                    c.part.has_children = true;
                } else {
                    if let Some(slot) = slot_of(kind) {
                        if let Some(&(unit, unit_depth)) = open_units.last() {
                            if unit_depth + 1 == depth && slot_free(&units[unit], slot) {
                                capture = Some(Capture {
                                    unit,
                                    slot,
                                    depth,
                                    inner_start: after,
                                    part: RawPart {
                                        start_tag: pos..after,
                                        inner: None,
                                        text: String::new(),
                                        has_children: false,
                                        state: markup::attr(&e, "state"),
                                    },
                                });
                            }
                        }
                    }
                    if kind == ElementKind::TransUnit {
                        units.push(new_unit(units.len(), &e, &stack, translate_no));
                        open_units.push((units.len() - 1, depth));
                    }
                }
                stack.push(Frame { translate_no });
            }
            Event::Empty(e) => {
                seen_root = true;
                let kind = ElementKind::of(e.name().as_ref());
                let depth = stack.len();
                if let Some(c) = capture.as_mut() {
                    c.part.has_children = true;
                } else {
                    if let Some(slot) = slot_of(kind) {
                        if let Some(&(unit, unit_depth)) = open_units.last() {
                            if unit_depth + 1 == depth && slot_free(&units[unit], slot) {
                                let part = RawPart {
                                    start_tag: pos..after,
                                    inner: None,
                                    text: String::new(),
                                    has_children: false,
                                    state: markup::attr(&e, "state"),
                                };
                                store(&mut units[unit], slot, part);
                            }
                        }
                    }
                    if kind == ElementKind::TransUnit {
                        let translate_no = markup::is_translate_no(&e);
                        units.push(new_unit(units.len(), &e, &stack, translate_no));
                    }
                }
            }
            Event::End(_) => {
                if stack.pop().is_none() {
                    return Err(xml_err("unexpected closing tag"));
                }
                let depth = stack.len();
                if capture.as_ref().is_some_and(|c| c.depth == depth) {
                    if let Some(mut c) = capture.take() {
                        c.part.inner = Some(c.inner_start..pos);
                        store(&mut units[c.unit], c.slot, c.part);
                    }
                }
                if open_units.last().is_some_and(|&(_, d)| d == depth) {
                    if let Some((unit, _)) = open_units.pop() {
                        units[unit].close_at = Some(pos);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(c) = capture.as_mut() {
                    match t.unescape() {
                        Ok(s) => c.part.text.push_str(&s),
                        Err(_) => c.part.text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Event::CData(t) => {
                if let Some(c) = capture.as_mut() {
                    c.part.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_err("unclosed element at end of document"));
    }
    if !seen_root {
        return Err(xml_err("no root element"));
    }
    Ok(units)
}

fn new_unit(
    index: usize,
    e: &quick_xml::events::BytesStart,
    stack: &[Frame],
    translate_no: bool,
) -> RawUnit {
    // Ancestors up to, but not including, the document root element.
    let locked_by_ancestor = stack.iter().skip(1).any(|f| f.translate_no);
    RawUnit {
        index,
        id: markup::attr(e, "id"),
        translatable: !(translate_no || locked_by_ancestor),
        match_quality: markup::attr(e, "match-quality"),
        prefix: markup::prefix(e.name().as_ref())
            .map(|p| String::from_utf8_lossy(p).into_owned()),
        close_at: None,
        source: None,
        target: None,
    }
}
