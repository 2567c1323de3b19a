//! The persisted extension format.
//!
//! ```text
//! #INCLUDE square_impl as sq
//! (lambda (x) (* (eval x) (eval x)))
//! #INCLUDE twice_impl as twice
//! (lambda (f x) ((eval f) ((eval f) (eval x))))
//! #EXCLUDE
//! ```
//!
//! Each block runs from its header to the next header or the `#EXCLUDE`
//! sentinel. Text after the sentinel is ignored.

use std::fmt;
use std::ops::Range;

use opal_ir::Symbol;

use crate::errors::malformed_form;
use crate::{EvalError, Value};

/// Starts a block header.
pub const INCLUDE: &str = "#INCLUDE";
/// Ends the block list.
pub const EXCLUDE: &str = "#EXCLUDE";

/// One registration: internal name, keyword alias, and OPAL source that
/// evaluates to the handler function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionBlock {
    pub name: Symbol,
    pub alias: Symbol,
    pub body: String,
}

impl fmt::Display for ExtensionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{INCLUDE} {} as {}", self.name, self.alias)?;
        writeln!(f, "{}", self.body.trim_end())
    }
}

/// Where a block sits in the persisted text, in lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockSpan {
    pub alias: Symbol,
    pub lines: Range<usize>,
}

fn is_sentinel(line: &str) -> bool {
    line.trim_start().starts_with(EXCLUDE)
}

fn header(line: &str) -> Option<Result<(Symbol, Symbol), EvalError>> {
    let rest = line.trim().strip_prefix(INCLUDE)?;
    let parts: Vec<&str> = rest.split_whitespace().collect();
    Some(match parts[..] {
        [name, "as", alias] => Ok((Symbol::new(name), Symbol::new(alias))),
        _ => Err(malformed_form(INCLUDE, &Value::symbol(line.trim()))),
    })
}

/// Parse blocks along with their line spans.
pub fn parse_spans(text: &str) -> Result<Vec<(BlockSpan, ExtensionBlock)>, EvalError> {
    let mut blocks = Vec::new();
    let mut open: Option<(usize, Symbol, Symbol, Vec<&str>)> = None;
    let mut end = 0;
    for (index, line) in text.lines().enumerate() {
        end = index;
        if is_sentinel(line) {
            break;
        }
        match header(line) {
            Some(parsed) => {
                let (name, alias) = parsed?;
                if let Some(block) = open.take() {
                    blocks.push(close(block, index));
                }
                open = Some((index, name, alias, Vec::new()));
            }
            None => match open.as_mut() {
                Some((_, _, _, body)) => body.push(line),
                None if line.trim().is_empty() => {}
                None => return Err(malformed_form(INCLUDE, &Value::symbol(line.trim()))),
            },
        }
        end = index + 1;
    }
    if let Some(block) = open.take() {
        blocks.push(close(block, end));
    }
    Ok(blocks)
}

fn close(
    (start, name, alias, body): (usize, Symbol, Symbol, Vec<&str>),
    end: usize,
) -> (BlockSpan, ExtensionBlock) {
    let span = BlockSpan {
        alias: alias.clone(),
        lines: start..end,
    };
    let block = ExtensionBlock {
        name,
        alias,
        body: body.join("\n").trim().to_string(),
    };
    (span, block)
}

/// Parse the blocks of a persisted text or a freshly entered extension.
pub fn parse_blocks(text: &str) -> Result<Vec<ExtensionBlock>, EvalError> {
    Ok(parse_spans(text)?.into_iter().map(|(_, block)| block).collect())
}

/// The lines before the sentinel.
pub(super) fn without_sentinel(text: &str) -> String {
    let mut kept = String::new();
    for line in text.lines().take_while(|line| !is_sentinel(line)) {
        kept.push_str(line);
        kept.push('\n');
    }
    kept
}

/// `text` with the lines in `spans` removed, sentinel re-appended.
pub(super) fn excise(text: &str, spans: &[Range<usize>]) -> String {
    let mut kept = String::new();
    for (index, line) in text.lines().enumerate() {
        if is_sentinel(line) {
            break;
        }
        if spans.iter().any(|span| span.contains(&index)) {
            continue;
        }
        kept.push_str(line);
        kept.push('\n');
    }
    with_sentinel(kept)
}

pub(super) fn with_sentinel(mut text: String) -> String {
    text.push_str(EXCLUDE);
    text.push('\n');
    text
}
