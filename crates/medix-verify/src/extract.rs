//! Recovery of a JSON object from raw model text.
//!
//! Models wrap JSON in code fences, prepend or append prose, and get cut off
//! mid-object when they hit a token limit. `extract_json` undoes all three
//! without ever touching text that already parses.
//!
//! Stages, in order:
//!
//! 1. Strip code fences and try a direct parse.
//! 2. Scan from the first `{` with an explicit state machine, stopping where
//!    the root object closes.
//! 3. Complete whatever the scan left open: close the string, drop a member
//!    cut off before its value and any dangling comma, then close every open
//!    container innermost first.
//! 4. Parse. On failure, drop commas that precede a closing bracket and parse
//!    once more.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[\]}])").expect("valid regex"));

/// One open container on the nesting stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    closer: char,
    /// Only meaningful for objects: the next string is a key.
    expect_key: bool,
}

impl Frame {
    fn object() -> Self {
        Self { closer: '}', expect_key: true }
    }

    fn array() -> Self {
        Self { closer: ']', expect_key: false }
    }

    fn is_object(&self) -> bool {
        self.closer == '}'
    }
}

/// Scanner state after consuming a prefix of the input.
#[derive(Debug, Default)]
struct Scan {
    out: String,
    stack: Vec<Frame>,
    in_string: bool,
    escape_pending: bool,
    /// The open (or just closed) string is an object key.
    string_is_key: bool,
    /// A key string closed and its `:` has not arrived yet.
    awaiting_colon: bool,
    /// Offset in `out` of the opening quote of the most recent key.
    member_start: Option<usize>,
}

impl Scan {
    /// Consume `text`, which starts at the root `{`.
    fn run(text: &str) -> Self {
        let mut scan = Scan::default();

        for ch in text.chars() {
            scan.out.push(ch);

            if scan.in_string {
                if scan.escape_pending {
                    scan.escape_pending = false;
                } else if ch == '\\' {
                    scan.escape_pending = true;
                } else if ch == '"' {
                    scan.in_string = false;
                    if scan.string_is_key {
                        scan.awaiting_colon = true;
                    }
                }
                continue;
            }

            match ch {
                '"' => {
                    scan.in_string = true;
                    scan.string_is_key = scan.stack.last().is_some_and(|f| f.is_object() && f.expect_key);
                    if scan.string_is_key {
                        scan.member_start = Some(scan.out.len() - 1);
                    }
                }
                '{' => scan.stack.push(Frame::object()),
                '[' => scan.stack.push(Frame::array()),
                '}' | ']' => {
                    scan.stack.pop();
                    if scan.stack.is_empty() {
                        // Root closed; whatever follows is commentary.
                        break;
                    }
                }
                ':' => {
                    scan.awaiting_colon = false;
                    if let Some(frame) = scan.stack.last_mut() {
                        frame.expect_key = false;
                    }
                }
                ',' => {
                    if let Some(frame) = scan.stack.last_mut() {
                        if frame.is_object() {
                            frame.expect_key = true;
                        }
                    }
                }
                _ => {}
            }
        }

        scan
    }

    /// Close everything the scan left open and return the candidate text.
    ///
    /// A member cut off before its value starts (open key, key without `:`,
    /// or `:` with nothing after it) is dropped along with its comma.
    fn complete(mut self) -> String {
        let dangling_key = self.awaiting_colon || (self.in_string && self.string_is_key);

        if self.in_string && !dangling_key {
            if self.escape_pending {
                self.out.pop();
            }
            self.out.push('"');
        }

        let trimmed_len = self.out.trim_end().len();
        self.out.truncate(trimmed_len);

        if !self.stack.is_empty() {
            if dangling_key || self.out.ends_with(':') {
                if let Some(start) = self.member_start {
                    self.out.truncate(start);
                    let trimmed_len = self.out.trim_end().len();
                    self.out.truncate(trimmed_len);
                }
            }
            if self.out.ends_with(',') {
                self.out.pop();
            }
        }

        while let Some(frame) = self.stack.pop() {
            self.out.push(frame.closer);
        }
        self.out
    }
}

/// Remove a surrounding markdown code fence, if present.
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string ("json") along with the opening fence.
        text = rest.split_once('\n').map_or("", |(_, body)| body);
    }
    if let Some(body) = text.trim_end().strip_suffix("```") {
        text = body;
    }
    text.trim()
}

fn parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

/// Recover a JSON object from `raw`.
///
/// Returns `None` when the text contains no `{` or nothing parseable can be
/// rebuilt from it.
pub fn extract_json(raw: &str) -> Option<Value> {
    let text = strip_fences(raw);

    if let Some(value) = parse_object(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let candidate = Scan::run(&text[start..]).complete();

    if let Some(value) = parse_object(&candidate) {
        debug!(recovered_len = candidate.len(), "recovered JSON by completion");
        return Some(value);
    }

    let cleaned = TRAILING_COMMA.replace_all(&candidate, "$1");
    let value = parse_object(&cleaned);
    if value.is_some() {
        debug!("recovered JSON after trailing comma cleanup");
    }
    value
}
