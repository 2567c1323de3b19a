//! Print handler for configurable output.
//!
//! `show`, `usrin` and the informational messages of the evaluator go
//! through a [`SharedPrintHandler`]. Drivers use stdout and stdin; tests
//! capture into a buffer and queue input lines.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Captures output in memory and answers reads from queued lines.
pub struct BufferPrintHandler {
    buffer: Mutex<String>,
    input: Mutex<VecDeque<String>>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        BufferPrintHandler {
            buffer: Mutex::new(String::new()),
            input: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a line for a later `read_line`.
    pub fn push_input(&self, line: &str) {
        self.input.lock().push_back(line.to_string());
    }

    /// The prompt is captured like output. An empty queue reads as end of
    /// input.
    pub fn read_line(&self, prompt: &str) -> String {
        self.buffer.lock().push_str(prompt);
        self.input.lock().pop_front().unwrap_or_default()
    }

    pub fn println(&self, msg: &str) {
        let mut buf = self.buffer.lock();
        buf.push_str(msg);
        buf.push('\n');
    }

    pub fn get_output(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Default for BufferPrintHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Where output goes.
pub enum PrintHandlerImpl {
    Stdout,
    Buffer(BufferPrintHandler),
    /// Discards everything.
    Silent,
}

impl PrintHandlerImpl {
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => println!("{msg}"),
            Self::Buffer(h) => h.println(msg),
            Self::Silent => {}
        }
    }

    /// Show `prompt` and read one line, without its line ending. End of
    /// input reads as an empty line.
    pub fn read_line(&self, prompt: &str) -> io::Result<String> {
        match self {
            Self::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(prompt.as_bytes())?;
                stdout.flush()?;
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line)?;
                Ok(line.trim_end_matches(['\n', '\r']).to_string())
            }
            Self::Buffer(h) => Ok(h.read_line(prompt)),
            Self::Silent => Ok(String::new()),
        }
    }

    /// Queue input for a buffer handler; other handlers ignore it.
    pub fn push_input(&self, line: &str) {
        if let Self::Buffer(h) = self {
            h.push_input(line);
        }
    }

    /// Captured output; empty for handlers that do not capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(h) => h.get_output(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }
}

pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(BufferPrintHandler::new()))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}
