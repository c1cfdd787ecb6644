//! In-place rewriting of unit text.
//!
//! Edits are computed against the scanned byte ranges and spliced into the original
//! string, so markup outside the touched elements is preserved byte-for-byte. The
//! result is scanned again before it is handed back; on any failure the original
//! content is returned unchanged.

use std::borrow::Cow;
use std::ops::Range;

use locsync_core::{LocSyncError, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::markup::local_name;
use crate::normalize::normalize;
use crate::units::{scan_units, RawPart, RawUnit};

/// State written on every propagated target.
pub const PROPAGATED_STATE: &str = "translated";

struct Edit {
    range: Range<usize>,
    text: String,
}

/// Set the target of every translatable unit whose normalized source equals `key`.
/// Missing target elements are created. Returns `content` unchanged on failure or
/// when nothing matched.
pub fn write_target_by_source(content: &str, key: &str, text: &str) -> String {
    match try_write_target(content, key, text) {
        Ok(Some(out)) => out,
        Ok(None) => content.to_string(),
        Err(e) => {
            tracing::warn!(event = "writeback_failed", mode = "by_source", key = key, error = %e);
            content.to_string()
        }
    }
}

/// Set the target of the unit(s) with id `unit_id`, creating the element when
/// missing. Returns `content` unchanged on failure or when no such unit exists.
pub fn write_target_by_id(content: &str, unit_id: &str, text: &str) -> String {
    match try_write_target_by_id(content, unit_id, text) {
        Ok(Some(out)) => out,
        Ok(None) => content.to_string(),
        Err(e) => {
            tracing::warn!(event = "writeback_failed", mode = "target_by_id", unit = unit_id, error = %e);
            content.to_string()
        }
    }
}

/// Set the source text of the unit(s) with id `unit_id`. Returns `content`
/// unchanged on failure or when no such unit exists.
pub fn write_source_by_id(content: &str, unit_id: &str, text: &str) -> String {
    match try_write_source(content, unit_id, text) {
        Ok(Some(out)) => out,
        Ok(None) => content.to_string(),
        Err(e) => {
            tracing::warn!(event = "writeback_failed", mode = "by_id", unit = unit_id, error = %e);
            content.to_string()
        }
    }
}

fn try_write_target(content: &str, key: &str, text: &str) -> Result<Option<String>> {
    if key.is_empty() {
        return Ok(None);
    }
    let units = scan_units(content)?;
    let body = render_text(text);
    let mut edits = Vec::new();

    for unit in units.iter().filter(|u| u.translatable) {
        if unit.source.is_none() || normalize(&unit.source_text(content)) != key {
            continue;
        }
        edits.extend(target_edits(content, unit, &body)?);
    }

    finish(content, edits)
}

fn try_write_target_by_id(content: &str, unit_id: &str, text: &str) -> Result<Option<String>> {
    let units = scan_units(content)?;
    let body = render_text(text);
    let mut edits = Vec::new();
    for unit in units.iter().filter(|u| u.effective_id() == unit_id) {
        edits.extend(target_edits(content, unit, &body)?);
    }
    finish(content, edits)
}

/// Edits that set the target of `unit` to `body`, creating the element when missing.
fn target_edits(content: &str, unit: &RawUnit, body: &str) -> Result<Vec<Edit>> {
    if let Some(part) = &unit.target {
        return replace_part(content, part, body, Some(PROPAGATED_STATE));
    }
    let Some(at) = unit.close_at else {
        return Ok(Vec::new());
    };
    let name = match &unit.prefix {
        Some(p) => format!("{p}:target"),
        None => "target".to_string(),
    };
    let mut start = BytesStart::new(name.as_str());
    start.push_attribute(("state", PROPAGATED_STATE));
    Ok(vec![Edit {
        range: at..at,
        text: element(start, &name, body)?,
    }])
}

fn try_write_source(content: &str, unit_id: &str, text: &str) -> Result<Option<String>> {
    let units = scan_units(content)?;
    let body = render_text(text);
    let mut edits = Vec::new();
    for unit in units.iter().filter(|u| u.effective_id() == unit_id) {
        if let Some(part) = &unit.source {
            edits.extend(replace_part(content, part, &body, None)?);
        }
    }
    finish(content, edits)
}

fn finish(content: &str, mut edits: Vec<Edit>) -> Result<Option<String>> {
    if edits.is_empty() {
        return Ok(None);
    }
    edits.sort_by_key(|e| e.range.start);
    let out = splice(content, &edits);
    // Never hand back a document the scanner cannot read.
    scan_units(&out)?;
    Ok(Some(out))
}

/// Edits that set the body of `part`, optionally updating its `state` attribute.
fn replace_part(
    content: &str,
    part: &RawPart,
    body: &str,
    state: Option<&str>,
) -> Result<Vec<Edit>> {
    let tag = &content[part.start_tag.clone()];
    let (start, name) = reopen(tag, state)?;
    match &part.inner {
        Some(inner) => {
            let mut edits = Vec::with_capacity(2);
            if state.is_some() {
                let mut w = Writer::new(Vec::new());
                w.write_event(Event::Start(start))?;
                edits.push(Edit {
                    range: part.start_tag.clone(),
                    text: String::from_utf8(w.into_inner())?,
                });
            }
            edits.push(Edit {
                range: inner.clone(),
                text: body.to_string(),
            });
            Ok(edits)
        }
        // `<target/>` becomes `<target ...>body</target>`.
        None => Ok(vec![Edit {
            range: part.start_tag.clone(),
            text: element(start, &name, body)?,
        }]),
    }
}

/// Re-read a start (or empty) tag and rebuild it with `state` set, keeping the
/// other attributes in their original order.
fn reopen(tag: &str, state: Option<&str>) -> Result<(BytesStart<'static>, String)> {
    let mut reader = Reader::from_str(tag);
    let e = match reader.read_event()? {
        Event::Start(e) | Event::Empty(e) => e,
        other => return Err(LocSyncError::Xml(format!("expected a start tag, got {other:?}")).into()),
    };
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut start = BytesStart::new(name.clone());
    let mut state_written = false;
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let is_state = local_name(attr.key.as_ref()).eq_ignore_ascii_case(b"state");
        match state {
            Some(s) if is_state => {
                if !state_written {
                    start.push_attribute((key.as_str(), s));
                    state_written = true;
                }
            }
            _ => {
                let value = match attr.unescape_value() {
                    Ok(v) => v.into_owned(),
                    Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                };
                start.push_attribute((key.as_str(), value.as_str()));
            }
        }
    }
    if let (Some(s), false) = (state, state_written) {
        start.push_attribute(("state", s));
    }
    Ok((start, name))
}

fn element(start: BytesStart<'_>, name: &str, body: &str) -> Result<String> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Start(start))?;
    w.write_event(Event::Text(BytesText::from_escaped(body)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(String::from_utf8(w.into_inner())?)
}

fn splice(content: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(content.len() + edits.iter().map(|e| e.text.len()).sum::<usize>());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&content[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(&content[cursor..]);
    out
}

/// Markup-ready form of a unit text: well-formed inline markup is kept as is,
/// anything else is escaped as character data.
pub fn render_text(text: &str) -> Cow<'_, str> {
    if is_markup_fragment(text) {
        Cow::Borrowed(text)
    } else {
        escape(text)
    }
}

/// `true` when `text` contains inline elements and parses as balanced markup with
/// valid entities.
pub fn is_markup_fragment(text: &str) -> bool {
    if !text.contains('<') {
        return false;
    }
    let wrapped = format!("<f>{text}</f>");
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);
    let mut depth = 0usize;
    let mut elements = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                elements += 1;
            }
            Ok(Event::Empty(_)) => elements += 1,
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Ok(Event::Text(t)) => {
                if t.unescape().is_err() {
                    return false;
                }
            }
            Ok(Event::Decl(_)) | Ok(Event::DocType(_)) | Ok(Event::PI(_)) => return false,
            // The wrapper counts as one element; inline markup needs at least one more.
            Ok(Event::Eof) => return depth == 0 && elements > 1,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}
