// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PPD record reader — turns PPD text into a `RawDocument`.
//
// Only the records the option model needs are interpreted: identity strings,
// groups, UI option blocks with their choices, `*Default...` keywords and
// constraint records. Everything else (PostScript code, fonts, order
// dependencies, custom options) is skipped.

use std::borrow::Cow;

use ppdwerk_core::OptionKind;
use ppdwerk_core::error::PpdError;
use thiserror::Error;
use tracing::{debug, warn};

use crate::raw::{RawChoice, RawConstraint, RawDocument, RawGroup, RawOption, RawTerm};

/// Group that receives options declared outside any `*OpenGroup` block.
pub const GENERAL_GROUP: &str = "General";

/// Reasons the reader rejects a document.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("missing *PPD-Adobe header")]
    MissingHeader,

    #[error("unterminated quoted value for *{keyword} starting on line {line}")]
    UnterminatedString { keyword: String, line: usize },
}

impl From<ReadError> for PpdError {
    fn from(err: ReadError) -> Self {
        PpdError::DocumentUnreadable(err.to_string())
    }
}

/// Decode document bytes. UTF-8 is tried first; anything else is taken as
/// ISO-8859-1, which maps every byte.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Parse raw bytes into a document handle.
pub fn read_bytes(bytes: &[u8]) -> Result<RawDocument, ReadError> {
    read_str(&decode_text(bytes))
}

/// Parse PPD text into a document handle.
pub fn read_str(text: &str) -> Result<RawDocument, ReadError> {
    let mut state = ReaderState::default();
    let mut lines = text.lines().enumerate();
    let mut seen_header = false;

    while let Some((index, line)) = lines.next() {
        let line_no = index + 1;
        let line = line.trim_end_matches('\r');

        let Some(body) = line.strip_prefix('*') else {
            continue;
        };
        if body.starts_with('%') || body.trim() == "End" {
            continue;
        }

        let (keyword, selector, value) = split_record(body);

        let value = match value {
            Some(raw) => Some(read_value(raw, keyword, line_no, &mut lines)?),
            None => None,
        };

        if !seen_header {
            if keyword != "PPD-Adobe" {
                return Err(ReadError::MissingHeader);
            }
            seen_header = true;
            continue;
        }

        state.apply(keyword, selector, value.as_deref().unwrap_or(""), line_no);
    }

    if !seen_header {
        return Err(ReadError::MissingHeader);
    }

    let doc = state.finish();
    debug!(
        groups = doc.groups.len(),
        options = doc.option_count(),
        constraints = doc.constraints.len(),
        "PPD records read"
    );
    Ok(doc)
}

// -- Record splitting ---------------------------------------------------------

/// Split `Keyword selector: value` (leading `*` already removed).
fn split_record(body: &str) -> (&str, Option<&str>, Option<&str>) {
    let keyword_end = body
        .find(|c: char| c.is_whitespace() || c == ':')
        .unwrap_or(body.len());
    let keyword = &body[..keyword_end];
    let rest = &body[keyword_end..];

    if let Some(value) = rest.strip_prefix(':') {
        return (keyword, None, Some(value));
    }

    match rest.find(':') {
        Some(colon) => {
            let selector = rest[..colon].trim();
            let selector = (!selector.is_empty()).then_some(selector);
            (keyword, selector, Some(&rest[colon + 1..]))
        }
        None => {
            let selector = rest.trim();
            (keyword, (!selector.is_empty()).then_some(selector), None)
        }
    }
}

/// Resolve a value, following quoted strings across lines.
fn read_value<'a, I>(
    raw: &str,
    keyword: &str,
    line_no: usize,
    lines: &mut I,
) -> Result<String, ReadError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let raw = raw.trim();
    let Some(quoted) = raw.strip_prefix('"') else {
        return Ok(raw.to_string());
    };

    if let Some(end) = quoted.find('"') {
        return Ok(quoted[..end].to_string());
    }

    let mut value = quoted.to_string();
    for (_, next) in lines.by_ref() {
        let next = next.trim_end_matches('\r');
        value.push('\n');
        if let Some(end) = next.find('"') {
            value.push_str(&next[..end]);
            return Ok(value);
        }
        value.push_str(next);
    }

    Err(ReadError::UnterminatedString {
        keyword: keyword.to_string(),
        line: line_no,
    })
}

/// Split a `Key/Label` translation string.
fn split_translation(text: &str) -> (Option<String>, Option<String>) {
    let text = text.trim();
    let (key, label) = match text.split_once('/') {
        Some((key, label)) => (key.trim(), Some(label.trim())),
        None => (text, None),
    };
    let key = (!key.is_empty()).then(|| key.to_string());
    let label = label.filter(|l| !l.is_empty()).map(decode_hex_label);
    (key, label)
}

/// Decode `<hex>` byte runs inside a translation string.
fn decode_hex_label(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(len) = bytes[i + 1..].iter().position(|&b| b == b'>') {
                let inner = &text[i + 1..i + 1 + len];
                if let Some(decoded) = decode_hex_run(inner) {
                    out.extend(decoded);
                    i += len + 2;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn decode_hex_run(inner: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = inner.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.is_empty() || digits.len() % 2 != 0 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}

/// Parse the value of a constraint record into its first two terms.
fn parse_constraint(value: &str) -> Option<RawConstraint> {
    let mut terms: Vec<RawTerm> = Vec::new();
    for token in value.split_whitespace() {
        if let Some(option) = token.strip_prefix('*') {
            if !option.is_empty() {
                terms.push(RawTerm {
                    option: option.to_string(),
                    choice: None,
                });
            }
        } else if let Some(last) = terms.last_mut() {
            if last.choice.is_none() {
                last.choice = Some(token.to_string());
            }
        }
    }

    if terms.len() > 2 {
        warn!(terms = terms.len(), "constraint record has extra terms, keeping the first two");
    }
    let mut terms = terms.into_iter();
    let first = terms.next()?;
    let second = terms.next()?;
    Some(RawConstraint { first, second })
}

// -- Reader state -------------------------------------------------------------

#[derive(Default)]
struct ReaderState {
    doc: RawDocument,
    current_group: Option<usize>,
    /// Option block being read, with the index of the group it belongs to.
    open_option: Option<(usize, RawOption)>,
}

impl ReaderState {
    fn apply(&mut self, keyword: &str, selector: Option<&str>, value: &str, line_no: usize) {
        match keyword {
            "Manufacturer" => self.doc.manufacturer = Some(value.to_string()),
            "ModelName" => self.doc.model_name = Some(value.to_string()),
            "NickName" => self.doc.nickname = Some(value.to_string()),
            "ShortNickName" => self.doc.short_nickname = Some(value.to_string()),

            "OpenGroup" => {
                self.close_option(line_no);
                self.open_group(value);
            }
            "CloseGroup" => {
                self.close_option(line_no);
                self.current_group = None;
            }
            // Sub-groups are folded into their enclosing group.
            "OpenSubGroup" | "CloseSubGroup" => {}

            "OpenUI" | "JCLOpenUI" => {
                self.close_option(line_no);
                self.open_option(selector.unwrap_or(""), value);
            }
            "CloseUI" | "JCLCloseUI" => self.close_option(line_no),

            "UIConstraints" | "NonUIConstraints" => match parse_constraint(value) {
                Some(constraint) => self.doc.constraints.push(constraint),
                None => warn!(line = line_no, value, "constraint record needs two options, skipped"),
            },

            _ => self.apply_other(keyword, selector, value),
        }
    }

    fn apply_other(&mut self, keyword: &str, selector: Option<&str>, value: &str) {
        if let (Some((_, option)), Some(selector)) = (self.open_option.as_mut(), selector) {
            if option.key.as_deref() == Some(keyword) {
                let (key, label) = split_translation(selector);
                option.choices.push(RawChoice { key, label });
                return;
            }
        }

        if let Some(option) = keyword.strip_prefix("Default") {
            let value = value.trim();
            if !option.is_empty() && !value.is_empty() {
                self.doc.defaults.insert(option.to_string(), value.to_string());
            }
        }
    }

    fn open_group(&mut self, value: &str) {
        let (key, label) = split_translation(value);
        let existing = key
            .as_deref()
            .and_then(|k| self.doc.groups.iter().position(|g| g.key.as_deref() == Some(k)));

        let index = match existing {
            Some(index) => index,
            None => {
                self.doc.groups.push(RawGroup {
                    key,
                    label,
                    options: Vec::new(),
                });
                self.doc.groups.len() - 1
            }
        };
        self.current_group = Some(index);
    }

    /// `name` is `*Key/Label`; `kind` is the keyword after the colon.
    fn open_option(&mut self, name: &str, kind: &str) {
        let name = name.trim().trim_start_matches('*');
        let (key, label) = split_translation(name);
        let group = match self.current_group {
            Some(index) => index,
            None => self.general_group(),
        };
        self.open_option = Some((
            group,
            RawOption {
                key,
                label,
                kind: OptionKind::from_keyword(kind),
                choices: Vec::new(),
            },
        ));
    }

    fn close_option(&mut self, line_no: usize) {
        if let Some((group, option)) = self.open_option.take() {
            if let Some(group) = self.doc.groups.get_mut(group) {
                group.options.push(option);
            } else {
                warn!(line = line_no, "option block without a group, dropped");
            }
        }
    }

    fn general_group(&mut self) -> usize {
        if let Some(index) = self
            .doc
            .groups
            .iter()
            .position(|g| g.key.as_deref() == Some(GENERAL_GROUP))
        {
            return index;
        }
        self.doc.groups.push(RawGroup {
            key: Some(GENERAL_GROUP.to_string()),
            label: Some(GENERAL_GROUP.to_string()),
            options: Vec::new(),
        });
        self.doc.groups.len() - 1
    }

    fn finish(mut self) -> RawDocument {
        if self.open_option.is_some() {
            warn!("document ended inside an option block");
            self.close_option(0);
        }
        self.doc
    }
}
