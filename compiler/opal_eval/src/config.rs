//! Session configuration.
//!
//! The driver parses its own command line and hands the result in as a
//! [`SessionConfig`]; nothing in the evaluator reads global state.

use opal_parse::CommentDelimiters;

/// Default bound on nested calls and on head reductions of one expression.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Mode switches set by the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionFlags {
    /// The driver is running a prompt loop.
    pub interactive: bool,
    /// Attach call backtraces to errors.
    pub debug: bool,
    /// Keep durable extensions at exit instead of rolling them back.
    pub permanent_extensions: bool,
    /// Lose a random keyword on every error.
    pub chaos: bool,
}

impl SessionFlags {
    /// Read the driver's single-letter switches, e.g. `"-id"`. Unknown
    /// letters are ignored.
    pub fn from_switches(switches: &str) -> Self {
        let mut flags = SessionFlags::default();
        for c in switches.chars() {
            match c {
                'i' => flags.interactive = true,
                'd' => flags.debug = true,
                'p' => flags.permanent_extensions = true,
                'c' => flags.chaos = true,
                _ => {}
            }
        }
        flags
    }
}

/// Everything a session needs to know up front.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub flags: SessionFlags,
    pub comments: CommentDelimiters,
    pub max_call_depth: usize,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_flags(mut self, flags: SessionFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_comments(mut self, comments: CommentDelimiters) -> Self {
        self.comments = comments;
        self
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            flags: SessionFlags::default(),
            comments: CommentDelimiters::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_set_flags() {
        let flags = SessionFlags::from_switches("-dc");
        assert!(flags.debug);
        assert!(flags.chaos);
        assert!(!flags.interactive);
        assert!(!flags.permanent_extensions);
    }

    #[test]
    fn default_depth() {
        assert_eq!(SessionConfig::default().max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(SessionConfig::new().with_max_call_depth(7).max_call_depth, 7);
    }
}
