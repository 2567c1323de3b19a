//! Extension registry: durable records of runtime-registered keywords.
//!
//! The live keywords sit in the keyword table; this registry owns the
//! persisted side. It keeps:
//! - the store text as it was when the session started (the rollback
//!   snapshot),
//! - an index of `(alias, line span)` rebuilt from the stored text after
//!   every write,
//! - the log of aliases registered durably in this session.
//!
//! Every read-modify-write of a store happens under one process-wide lock,
//! so sessions sharing a file never interleave their updates.

mod block;
mod store;

pub use block::{parse_blocks, parse_spans, BlockSpan, ExtensionBlock, EXCLUDE, INCLUDE};
pub use store::{ExtensionStore, FileStore, MemoryStore};

use std::fmt;

use opal_ir::Symbol;
use parking_lot::Mutex;

use crate::errors::io_error;
use crate::EvalError;

static STORE_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// What `finish` did with this session's extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitReport {
    /// Permanent session: these aliases stay persisted.
    Kept(Vec<Symbol>),
    /// The store was restored to its content at session start.
    RolledBack,
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReport::Kept(aliases) if aliases.is_empty() => f.write_str("No extensions saved."),
            ExitReport::Kept(aliases) => {
                f.write_str("The following extensions have been saved:")?;
                for alias in aliases {
                    write!(f, "\n  {alias}")?;
                }
                Ok(())
            }
            ExitReport::RolledBack => f.write_str("Extensions from this session were discarded."),
        }
    }
}

fn store_error(err: &std::io::Error) -> EvalError {
    io_error(format!("extension store: {err}"))
}

pub struct ExtensionRegistry {
    store: Box<dyn ExtensionStore>,
    snapshot: String,
    index: Vec<BlockSpan>,
    session_log: Vec<Symbol>,
}

impl ExtensionRegistry {
    /// A registry over an empty in-memory store.
    pub fn in_memory() -> Self {
        ExtensionRegistry {
            store: Box::new(MemoryStore::default()),
            snapshot: String::new(),
            index: Vec::new(),
            session_log: Vec::new(),
        }
    }

    /// Snapshot `store` and parse what it holds. The blocks are returned for
    /// the caller to register.
    pub fn open(store: Box<dyn ExtensionStore>) -> Result<(Self, Vec<ExtensionBlock>), EvalError> {
        let snapshot = {
            let _guard = STORE_LOCK.lock();
            store.read().map_err(|err| store_error(&err))?
        };
        let (index, blocks) = parse_spans(&snapshot)?.into_iter().unzip();
        let registry = ExtensionRegistry {
            store,
            snapshot,
            index,
            session_log: Vec::new(),
        };
        Ok((registry, blocks))
    }

    /// Append `blocks` to the store.
    pub fn persist(&mut self, blocks: &[ExtensionBlock]) -> Result<(), EvalError> {
        if blocks.is_empty() {
            return Ok(());
        }
        let _guard = STORE_LOCK.lock();
        let current = self.store.read().map_err(|err| store_error(&err))?;
        let mut text = block::without_sentinel(&current);
        for block in blocks {
            text.push_str(&block.to_string());
        }
        let text = block::with_sentinel(text);
        self.store.write(&text).map_err(|err| store_error(&err))?;
        self.reindex(&text)?;
        for block in blocks {
            tracing::debug!(alias = %block.alias, "extension persisted");
            self.session_log.push(block.alias.clone());
        }
        Ok(())
    }

    /// Excise every persisted block registered under `alias`. Returns
    /// whether any was found.
    pub fn remove(&mut self, alias: &str) -> Result<bool, EvalError> {
        let _guard = STORE_LOCK.lock();
        let current = self.store.read().map_err(|err| store_error(&err))?;
        let spans: Vec<_> = parse_spans(&current)?
            .into_iter()
            .filter(|(span, _)| span.alias == alias)
            .map(|(span, _)| span.lines)
            .collect();
        self.session_log.retain(|logged| logged != alias);
        if spans.is_empty() {
            return Ok(false);
        }
        let text = block::excise(&current, &spans);
        self.store.write(&text).map_err(|err| store_error(&err))?;
        self.reindex(&text)?;
        tracing::debug!(alias, "extension record removed");
        Ok(true)
    }

    /// Apply the exit policy.
    pub fn finish(&mut self, permanent: bool) -> Result<ExitReport, EvalError> {
        if permanent {
            return Ok(ExitReport::Kept(self.session_log.clone()));
        }
        let _guard = STORE_LOCK.lock();
        self.store
            .write(&self.snapshot)
            .map_err(|err| store_error(&err))?;
        tracing::debug!(discarded = self.session_log.len(), "extensions rolled back");
        self.session_log.clear();
        self.index = parse_spans(&self.snapshot)?
            .into_iter()
            .map(|(span, _)| span)
            .collect();
        Ok(ExitReport::RolledBack)
    }

    fn reindex(&mut self, text: &str) -> Result<(), EvalError> {
        self.index = parse_spans(text)?.into_iter().map(|(span, _)| span).collect();
        Ok(())
    }

    /// Where each persisted block sits.
    pub fn index(&self) -> &[BlockSpan] {
        &self.index
    }

    /// Aliases persisted during this session.
    pub fn session_log(&self) -> &[Symbol] {
        &self.session_log
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// The stored text right now.
    pub fn persisted(&self) -> Result<String, EvalError> {
        let _guard = STORE_LOCK.lock();
        self.store.read().map_err(|err| store_error(&err))
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("index", &self.index)
            .field("session_log", &self.session_log)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
