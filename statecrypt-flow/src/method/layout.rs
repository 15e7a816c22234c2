//! Formatting of a JSON text, kept apart from its content.
//!
//! The partial method rebuilds its plaintext from a parsed document. To give
//! back the exact bytes it was handed, it records the whitespace in front of
//! every token and any key or number spelled differently from its canonical
//! form, then replays both when rendering.
//!
//! Gaps are stored run-length encoded (`s` space, `t` tab, `n` newline, `r`
//! carriage return, optional repeat count) and separated by `.`, so a two-space
//! indented line costs three bytes.

use crate::error::{FlowError, FlowResult};
use crate::info::EncryptedDocument;
use serde_json::Value;
use statecrypt_config::Settings;
use std::collections::BTreeMap;

pub(crate) const LAYOUT_FIELD: &str = "layout";
pub(crate) const SPELLINGS_FIELD: &str = "spellings";

const GAP_SEPARATOR: &str = ".";
const MAX_RUN: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Punct,
    String,
    Literal,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    raw: &'a str,
}

/// Tokens of a JSON text and the whitespace around them.
///
/// `gaps[i]` precedes `tokens[i]`; the final gap trails the last token.
#[derive(Debug)]
pub(crate) struct Scan<'a> {
    tokens: Vec<Token<'a>>,
    gaps: Vec<&'a str>,
}

/// Splits `text` into tokens without interpreting them.
///
/// `text` must already be known to be valid JSON.
pub(crate) fn scan(text: &str) -> FlowResult<Scan<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut gaps = Vec::new();
    let mut pos = 0;

    loop {
        let start = pos;
        while bytes.get(pos).copied().is_some_and(is_whitespace) {
            pos += 1;
        }
        gaps.push(&text[start..pos]);

        let Some(&first) = bytes.get(pos) else { break };
        let start = pos;
        let kind = match first {
            b'{' | b'}' | b'[' | b']' | b',' | b':' => {
                pos += 1;
                TokenKind::Punct
            }
            b'"' => {
                pos = string_end(bytes, pos)?;
                TokenKind::String
            }
            _ => {
                while bytes.get(pos).is_some_and(|b| !is_delimiter(*b)) {
                    pos += 1;
                }
                TokenKind::Literal
            }
        };
        tokens.push(Token {
            kind,
            raw: &text[start..pos],
        });
    }

    Ok(Scan { tokens, gaps })
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_delimiter(byte: u8) -> bool {
    is_whitespace(byte) || matches!(byte, b'{' | b'}' | b'[' | b']' | b',' | b':' | b'"')
}

fn string_end(bytes: &[u8], open: usize) -> FlowResult<usize> {
    let mut pos = open + 1;
    loop {
        match bytes.get(pos) {
            Some(b'"') => return Ok(pos + 1),
            Some(b'\\') => pos += 2,
            Some(_) => pos += 1,
            None => {
                return Err(FlowError::Structure(
                    "unterminated string in JSON payload".to_string(),
                ));
            }
        }
    }
}

impl<'a> Scan<'a> {
    fn is_key(&self, index: usize) -> bool {
        self.tokens[index].kind == TokenKind::String
            && self
                .tokens
                .get(index + 1)
                .is_some_and(|next| next.kind == TokenKind::Punct && next.raw == ":")
    }

    /// Escaped contents of every string that is a value rather than a key, in text order.
    pub(crate) fn value_strings(&self) -> Vec<&'a str> {
        (0..self.tokens.len())
            .filter(|&index| self.tokens[index].kind == TokenKind::String && !self.is_key(index))
            .map(|index| {
                let raw = self.tokens[index].raw;
                &raw[1..raw.len() - 1]
            })
            .collect()
    }

    pub(crate) fn key_count(&self) -> usize {
        (0..self.tokens.len()).filter(|&index| self.is_key(index)).count()
    }

    /// The formatting needed to render this exact text again.
    pub(crate) fn layout(&self) -> FlowResult<Layout> {
        let mut spellings = BTreeMap::new();
        for (index, token) in self.tokens.iter().enumerate() {
            let checked = token.kind == TokenKind::Literal || self.is_key(index);
            if !checked {
                continue;
            }
            let canonical = serde_json::from_str::<Value>(token.raw)?.to_string();
            if canonical != token.raw {
                spellings.insert(index, token.raw.to_string());
            }
        }

        Ok(Layout {
            gaps: self.gaps.iter().map(|gap| gap.to_string()).collect(),
            spellings,
        })
    }
}

/// Whitespace and non-canonical spellings of one JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    gaps: Vec<String>,
    spellings: BTreeMap<usize, String>,
}

impl Layout {
    /// Writes the layout into envelope settings. Compact canonical text records nothing.
    pub(crate) fn record(&self, settings: &mut Settings) -> FlowResult<()> {
        if self.gaps.iter().any(|gap| !gap.is_empty()) {
            let encoded = self
                .gaps
                .iter()
                .map(|gap| encode_gap(gap))
                .collect::<Vec<_>>()
                .join(GAP_SEPARATOR);
            settings.insert(
                LAYOUT_FIELD.to_string(),
                encoded.trim_end_matches(GAP_SEPARATOR).to_string(),
            );
        }
        if !self.spellings.is_empty() {
            settings.insert(
                SPELLINGS_FIELD.to_string(),
                serde_json::to_string(&self.spellings)?,
            );
        }
        Ok(())
    }

    /// Reads a layout written by [`Layout::record`]. Missing fields mean compact canonical text.
    pub(crate) fn recorded(settings: &Settings) -> Option<Self> {
        let gaps = match settings.get(LAYOUT_FIELD) {
            Some(encoded) => encoded
                .split(GAP_SEPARATOR)
                .map(decode_gap)
                .collect::<Option<Vec<_>>>()?,
            None => Vec::new(),
        };
        let spellings = match settings.get(SPELLINGS_FIELD) {
            Some(encoded) => serde_json::from_str(encoded).ok()?,
            None => BTreeMap::new(),
        };
        Some(Self { gaps, spellings })
    }

    /// Renders `document` with this layout.
    ///
    /// String values are written between quotes as they are, so they must
    /// already hold escaped JSON string contents.
    pub(crate) fn render(&self, document: &EncryptedDocument) -> FlowResult<Vec<u8>> {
        let mut renderer = Renderer {
            layout: self,
            out: String::new(),
            token: 0,
        };
        renderer.object(document)?;
        if let Some(gap) = self.gaps.get(renderer.token) {
            renderer.out.push_str(gap);
        }
        Ok(renderer.out.into_bytes())
    }
}

struct Renderer<'a> {
    layout: &'a Layout,
    out: String,
    token: usize,
}

impl Renderer<'_> {
    fn emit(&mut self, canonical: &str) {
        if let Some(gap) = self.layout.gaps.get(self.token) {
            self.out.push_str(gap);
        }
        match self.layout.spellings.get(&self.token) {
            Some(spelling) => self.out.push_str(spelling),
            None => self.out.push_str(canonical),
        }
        self.token += 1;
    }

    fn object(&mut self, fields: &EncryptedDocument) -> FlowResult<()> {
        self.emit("{");
        for (index, (key, value)) in fields.iter().enumerate() {
            if index > 0 {
                self.emit(",");
            }
            self.emit(&serde_json::to_string(key)?);
            self.emit(":");
            self.value(value)?;
        }
        self.emit("}");
        Ok(())
    }

    fn value(&mut self, value: &Value) -> FlowResult<()> {
        match value {
            Value::Null => self.emit("null"),
            Value::Bool(true) => self.emit("true"),
            Value::Bool(false) => self.emit("false"),
            Value::Number(number) => self.emit(&number.to_string()),
            Value::String(escaped) => self.emit(&format!("\"{escaped}\"")),
            Value::Array(items) => {
                self.emit("[");
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.emit(",");
                    }
                    self.value(item)?;
                }
                self.emit("]");
            }
            Value::Object(fields) => self.object(fields)?,
        }
        Ok(())
    }
}

fn encode_gap(gap: &str) -> String {
    let mut encoded = String::new();
    let mut chars = gap.chars().peekable();
    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.next_if_eq(&c).is_some() {
            run += 1;
        }
        encoded.push(match c {
            ' ' => 's',
            '\t' => 't',
            '\n' => 'n',
            _ => 'r',
        });
        if run > 1 {
            encoded.push_str(&run.to_string());
        }
    }
    encoded
}

fn decode_gap(encoded: &str) -> Option<String> {
    let mut gap = String::new();
    let mut chars = encoded.chars().peekable();
    while let Some(code) = chars.next() {
        let c = match code {
            's' => ' ',
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            _ => return None,
        };
        let mut digits = String::new();
        while let Some(digit) = chars.next_if(char::is_ascii_digit) {
            digits.push(digit);
        }
        let run = if digits.is_empty() {
            1
        } else {
            digits.parse::<usize>().ok().filter(|run| *run <= MAX_RUN)?
        };
        gap.extend(std::iter::repeat_n(c, run));
    }
    Some(gap)
}
