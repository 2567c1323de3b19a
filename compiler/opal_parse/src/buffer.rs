//! Line accumulation for drivers and file loading.
//!
//! Lines are pushed one at a time. Comments are stripped as they arrive
//! (block comments nest), and the pending text is released as a [`Chunk`]
//! once it is complete: either balanced parentheses, or an extension block
//! wrapped in [`EXTENSION_START`] ... [`EXTENSION_END`].

use crate::ParseError;

/// Opens an extension block.
pub const EXTENSION_START: &str = "@start";
/// Closes an extension block.
pub const EXTENSION_END: &str = "@end";

/// Configurable comment markers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentDelimiters {
    /// Comments out the rest of the line.
    pub line: String,
    pub block_open: String,
    pub block_close: String,
}

impl Default for CommentDelimiters {
    fn default() -> Self {
        CommentDelimiters {
            line: "--".to_string(),
            block_open: "/-".to_string(),
            block_close: "-/".to_string(),
        }
    }
}

/// A complete unit of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Chunk {
    /// One or more balanced expressions.
    Expressions(String),
    /// The body of an `@start` ... `@end` block, markers removed.
    Extension(String),
}

#[derive(Clone, Copy)]
enum Marker {
    Line,
    Open,
    Close,
}

/// Accumulates input lines until they form a complete chunk.
#[derive(Clone, Debug)]
pub struct ExpressionBuffer {
    delimiters: CommentDelimiters,
    comment_depth: usize,
    pending: String,
}

impl ExpressionBuffer {
    pub fn new(delimiters: CommentDelimiters) -> Self {
        ExpressionBuffer {
            delimiters,
            comment_depth: 0,
            pending: String::new(),
        }
    }

    /// Whether a block comment is still open.
    pub fn in_comment(&self) -> bool {
        self.comment_depth > 0
    }

    /// Text received but not yet released.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.trim().is_empty()
    }

    /// Discard pending text and comment state.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.comment_depth = 0;
    }

    /// Feed one line of input.
    ///
    /// Returns a chunk when the pending text became complete. More closing
    /// than opening parentheses can never complete, so that input is
    /// dropped with [`ParseError::FatalExpression`].
    pub fn push_line(&mut self, line: &str) -> Result<Option<Chunk>, ParseError> {
        let code = self.strip_comments(line)?;
        self.pending.push_str(&code);
        self.pending.push('\n');

        let opens = self.pending.matches('(').count();
        let closes = self.pending.matches(')').count();
        if closes > opens {
            let text = self.pending.split_whitespace().collect::<Vec<_>>().join(" ");
            self.pending.clear();
            return Err(ParseError::FatalExpression { text });
        }

        if self.pending.contains(EXTENSION_START) {
            if !self.pending.contains(EXTENSION_END) {
                return Ok(None);
            }
            let text = std::mem::take(&mut self.pending);
            let body = text
                .split_once(EXTENSION_START)
                .and_then(|(_, rest)| rest.rsplit_once(EXTENSION_END))
                .map_or("", |(body, _)| body);
            return Ok(Some(Chunk::Extension(body.trim().to_string())));
        }

        if opens == closes {
            let text = std::mem::take(&mut self.pending);
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            return Ok(Some(Chunk::Expressions(text.to_string())));
        }
        Ok(None)
    }

    /// Split a whole source text into chunks.
    ///
    /// Input left incomplete at the end is an unmatched opening paren.
    pub fn split(text: &str, delimiters: CommentDelimiters) -> Result<Vec<Chunk>, ParseError> {
        let mut buffer = ExpressionBuffer::new(delimiters);
        let mut chunks = Vec::new();
        for line in text.lines() {
            if let Some(chunk) = buffer.push_line(line)? {
                chunks.push(chunk);
            }
        }
        if !buffer.is_empty() {
            let text = buffer.pending.split_whitespace().collect::<Vec<_>>().join(" ");
            return Err(ParseError::UnmatchedOpen { text });
        }
        Ok(chunks)
    }

    fn next_marker(&self, text: &str) -> Option<(usize, Marker)> {
        let d = &self.delimiters;
        let mut candidates = vec![
            (text.find(d.block_close.as_str()), Marker::Close),
            (text.find(d.block_open.as_str()), Marker::Open),
        ];
        if self.comment_depth == 0 {
            candidates.push((text.find(d.line.as_str()), Marker::Line));
        }
        candidates
            .into_iter()
            .filter_map(|(pos, marker)| pos.map(|p| (p, marker)))
            .min_by_key(|(pos, _)| *pos)
    }

    fn strip_comments(&mut self, line: &str) -> Result<String, ParseError> {
        let mut code = String::new();
        let mut rest = line;
        while let Some((pos, marker)) = self.next_marker(rest) {
            if self.comment_depth == 0 {
                code.push_str(&rest[..pos]);
            }
            match marker {
                Marker::Line => return Ok(code),
                Marker::Open => {
                    self.comment_depth += 1;
                    rest = &rest[pos + self.delimiters.block_open.len()..];
                }
                Marker::Close => {
                    if self.comment_depth == 0 {
                        return Err(ParseError::UnmatchedCommentClose {
                            line: line.to_string(),
                        });
                    }
                    self.comment_depth -= 1;
                    rest = &rest[pos + self.delimiters.block_close.len()..];
                    // keep tokens on either side of a closed comment apart
                    if self.comment_depth == 0 {
                        code.push(' ');
                    }
                }
            }
        }
        if self.comment_depth == 0 {
            code.push_str(rest);
        }
        Ok(code)
    }
}

impl Default for ExpressionBuffer {
    fn default() -> Self {
        ExpressionBuffer::new(CommentDelimiters::default())
    }
}
