use std::collections::HashSet;

use locsync_core::Asset;
use locsync_domain::{HealthIssue, HealthReport};
use locsync_parsers_xml::extract_asset;
use once_cell::sync::Lazy;
use quick_xml::errors::IllFormedError;
use quick_xml::events::Event;
use regex::Regex;

pub const CATEGORIES: &[&str] = &[
    "parse",
    "tag-mismatch",
    "invalid-entity",
    "encoding-detected",
    "unexpected-doctype",
    "invalid-char",
    "no-units",
    "duplicate-id",
];

static RE_XML_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<\?xml[^>]*encoding\s*=\s*['"]([^'"]+)['"][^>]*\?>"#)
        .expect("valid declaration regex")
});

/// Category include/exclude lists; empty `only` keeps everything.
#[derive(Debug, Clone, Default)]
pub struct HealthFilter {
    pub only: Vec<String>,
    pub except: Vec<String>,
}

impl HealthFilter {
    /// Accepts comma-separated lists as given on the command line.
    pub fn from_lists(only: &[String], except: &[String]) -> Self {
        let split = |v: &[String]| -> Vec<String> {
            v.iter()
                .flat_map(|s| s.split(','))
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            only: split(only),
            except: split(except),
        }
    }

    pub fn keeps(&self, category: &str) -> bool {
        (self.only.is_empty() || self.only.iter().any(|c| c == category))
            && !self.except.iter().any(|c| c == category)
    }
}

/// Lint every asset for structural and encoding problems.
pub fn health_check(assets: &[Asset], filter: &HealthFilter) -> HealthReport {
    let mut issues = Vec::new();
    for asset in assets {
        check_asset(asset, &mut issues);
    }
    issues.retain(|i: &HealthIssue| filter.keeps(&i.category));
    tracing::debug!(event = "health_checked", assets = assets.len(), issues = issues.len());
    HealthReport {
        checked: assets.len(),
        issues,
    }
}

fn check_asset(asset: &Asset, issues: &mut Vec<HealthIssue>) {
    let content = asset.content();
    let mut push = |category: &str, error: String| {
        issues.push(HealthIssue {
            path: asset.name.clone(),
            category: category.to_string(),
            error,
        })
    };

    let head_end = content
        .char_indices()
        .map(|(i, _)| i)
        .find(|i| *i >= 512)
        .unwrap_or(content.len());
    if let Some(caps) = RE_XML_DECL.captures(&content[..head_end]) {
        let enc = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let enc_norm = enc.to_ascii_lowercase().replace('_', "-");
        if enc_norm != "utf-8" && enc_norm != "utf8" {
            push("encoding-detected", format!("XML declares encoding={enc}; expected UTF-8"));
        }
    }

    if content
        .chars()
        .any(|ch| (ch as u32) < 0x20 && !matches!(ch, '\t' | '\n' | '\r'))
    {
        push("invalid-char", "control character < 0x20".into());
    }

    let mut reader = quick_xml::Reader::from_str(content);
    reader.config_mut().trim_text(false);
    let mut depth = 0usize;
    let mut doctype = false;
    let mut bad_entity: Option<String> = None;
    let failure = loop {
        match reader.read_event() {
            Ok(Event::Eof) => {
                if depth > 0 {
                    break Some(("tag-mismatch", format!("{depth} element(s) left unclosed")));
                }
                break None;
            }
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::DocType(_)) => doctype = true,
            Ok(Event::Text(t)) => {
                if bad_entity.is_none() {
                    if let Err(e) = t.unescape() {
                        bad_entity = Some(e.to_string());
                    }
                }
            }
            Ok(_) => {}
            Err(e) => break Some((classify(&e), e.to_string())),
        }
    };

    if doctype {
        push("unexpected-doctype", "DOCTYPE present".into());
    }
    if let Some(e) = bad_entity {
        push("invalid-entity", e);
    }
    let parsed = failure.is_none();
    if let Some((category, error)) = failure {
        push(category, error);
    }
    if !parsed {
        return;
    }

    let segments = extract_asset(asset);
    if segments.is_empty() {
        push("no-units", "no trans-unit elements found".into());
    }
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for seg in &segments {
        if !seen.insert(seg.id.as_str()) && reported.insert(seg.id.as_str()) {
            push("duplicate-id", format!("unit id `{}` appears more than once", seg.id));
        }
    }
}

fn classify(e: &quick_xml::Error) -> &'static str {
    match e {
        quick_xml::Error::IllFormed(
            IllFormedError::MismatchedEndTag { .. }
            | IllFormedError::UnmatchedEndTag(_),
        ) => "tag-mismatch",
        quick_xml::Error::EscapeError(_) => "invalid-entity",
        _ => "parse",
    }
}
