use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Backing storage for the persisted extension text.
pub trait ExtensionStore {
    /// Current text; a store that was never written reads as empty.
    fn read(&self) -> io::Result<String>;

    fn write(&mut self, text: &str) -> io::Result<()>;
}

/// A file on disk.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExtensionStore for FileStore {
    fn read(&self) -> io::Result<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        std::fs::write(&self.path, text)
    }
}

/// In-memory text. Clones share the same text, so a test can keep a handle
/// and inspect what the session wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    text: Arc<Mutex<String>>,
}

impl MemoryStore {
    pub fn new(initial: &str) -> Self {
        MemoryStore {
            text: Arc::new(Mutex::new(initial.to_string())),
        }
    }

    pub fn contents(&self) -> String {
        self.text.lock().clone()
    }
}

impl ExtensionStore for MemoryStore {
    fn read(&self) -> io::Result<String> {
        Ok(self.text.lock().clone())
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        *self.text.lock() = text.to_string();
        Ok(())
    }
}
