//! Error types for evaluation.
//!
//! `EvalErrorKind` carries the structured data for each failure; factory
//! functions below are the public way to build an [`EvalError`] and fill in
//! both `kind` and `message`.
//!
//! Every kind belongs to one [`ErrorCategory`], which is what drivers and
//! tests match on: the language reports syntax, name, type, and I/O errors,
//! plus arithmetic faults and the recursion limit.

use std::fmt;

use opal_parse::ParseError;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Coarse error taxonomy surfaced to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Syntax,
    Name,
    Type,
    Io,
    Arithmetic,
    Index,
    Recursion,
    Runtime,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Syntax => "SyntaxError",
            ErrorCategory::Name => "NameError",
            ErrorCategory::Type => "TypeError",
            ErrorCategory::Io => "IOError",
            ErrorCategory::Arithmetic => "ArithmeticError",
            ErrorCategory::Index => "IndexError",
            ErrorCategory::Recursion => "RecursionError",
            ErrorCategory::Runtime => "RuntimeError",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed error data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Syntax
    Syntax {
        message: String,
    },
    MalformedAccessor {
        accessor: String,
    },
    MalformedQuote {
        form: String,
    },
    MalformedForm {
        keyword: String,
        form: String,
    },

    // Names
    UndefinedVariable {
        name: String,
    },
    UndefinedGlobal {
        name: String,
    },
    UndefinedMember {
        template: String,
        member: String,
    },
    DeleteBeforeAssignment {
        name: String,
    },
    ExtensionNotFound {
        alias: String,
    },
    ModuleNotFound {
        name: String,
    },
    ModuleNotImported {
        name: String,
    },
    MissingClosure {
        name: String,
    },

    // Types
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    StrictTypeViolation {
        name: String,
        declared: String,
        got: String,
    },
    UnknownType {
        name: String,
    },
    UnsupportedOperand {
        operation: String,
        operand: String,
    },
    NotCallable {
        type_name: String,
    },

    // Arithmetic
    DivisionByZero,
    IntegerOverflow {
        operation: String,
    },

    // Index
    IndexOutOfBounds {
        index: i64,
        len: usize,
    },

    // I/O
    Io {
        message: String,
    },

    // Recursion
    StackOverflow {
        depth: usize,
    },

    Custom {
        message: String,
    },
}

impl EvalErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Syntax { .. }
            | Self::MalformedAccessor { .. }
            | Self::MalformedQuote { .. }
            | Self::MalformedForm { .. } => ErrorCategory::Syntax,
            Self::UndefinedVariable { .. }
            | Self::UndefinedGlobal { .. }
            | Self::UndefinedMember { .. }
            | Self::DeleteBeforeAssignment { .. }
            | Self::ExtensionNotFound { .. }
            | Self::ModuleNotFound { .. }
            | Self::ModuleNotImported { .. }
            | Self::MissingClosure { .. } => ErrorCategory::Name,
            Self::ArityMismatch { .. }
            | Self::StrictTypeViolation { .. }
            | Self::UnknownType { .. }
            | Self::UnsupportedOperand { .. }
            | Self::NotCallable { .. } => ErrorCategory::Type,
            Self::DivisionByZero | Self::IntegerOverflow { .. } => ErrorCategory::Arithmetic,
            Self::IndexOutOfBounds { .. } => ErrorCategory::Index,
            Self::Io { .. } => ErrorCategory::Io,
            Self::StackOverflow { .. } => ErrorCategory::Recursion,
            Self::Custom { .. } => ErrorCategory::Runtime,
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Syntax
            Self::Syntax { message } => write!(f, "{message}"),
            Self::MalformedAccessor { accessor } => {
                write!(f, "malformed accessor expression: {accessor}")
            }
            Self::MalformedQuote { form } => write!(f, "quote takes a single operand: {form}"),
            Self::MalformedForm { keyword, form } => {
                write!(f, "malformed '{keyword}' expression: {form}")
            }

            // Names
            Self::UndefinedVariable { name } => write!(f, "variable {name} is not defined."),
            Self::UndefinedGlobal { name } => {
                write!(f, "global variable {name} is not defined.")
            }
            Self::UndefinedMember { template, member } => {
                write!(f, "instance of {template} has no member '{member}'.")
            }
            Self::DeleteBeforeAssignment { name } => {
                write!(f, "cannot delete variable '{name}' before assignment.")
            }
            Self::ExtensionNotFound { alias } => write!(f, "extension '{alias}' not found."),
            Self::ModuleNotFound { name } => write!(f, "no module named '{name}'."),
            Self::ModuleNotImported { name } => {
                write!(f, "module '{name}' has not been imported.")
            }
            Self::MissingClosure { name } => {
                write!(f, "closure for {name} is no longer available.")
            }

            // Types
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => {
                let plural = if *expected == 1 { "" } else { "s" };
                let verb = if *got == 1 { "was" } else { "were" };
                write!(
                    f,
                    "{name} takes {expected} argument{plural} but {got} {verb} given"
                )
            }
            Self::StrictTypeViolation {
                name,
                declared,
                got,
            } => write!(
                f,
                "variable {name} requires value of type <{declared}> but received <{got}>"
            ),
            Self::UnknownType { name } => write!(f, "unknown type <{name}>"),
            Self::UnsupportedOperand { operation, operand } => {
                write!(f, "unsupported argument for '{operation}': {operand}")
            }
            Self::NotCallable { type_name } => {
                write!(f, "value of type <{type_name}> cannot be applied")
            }

            // Arithmetic
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::IntegerOverflow { operation } => write!(f, "integer overflow in {operation}"),

            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of range for list of length {len}")
            }

            Self::Io { message } => write!(f, "{message}"),

            Self::StackOverflow { depth } => {
                write!(f, "maximum recursion depth exceeded (limit: {depth})")
            }

            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured error data.
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory-built errors.
    pub message: String,
    /// Active calls at the failure site, innermost first. Only recorded in debug sessions.
    pub backtrace: Option<Vec<String>>,
    /// Secondary information appended by the session (e.g. chaos-mode losses).
    pub notes: Vec<String>,
}

impl EvalError {
    /// Create an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    #[must_use]
    pub fn with_backtrace(mut self, frames: Vec<String>) -> Self {
        self.backtrace = Some(frames);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category(), self.message)?;
        if let Some(frames) = &self.backtrace {
            if !frames.is_empty() {
                write!(f, "\nstack backtrace:")?;
                for (i, frame) in frames.iter().enumerate() {
                    write!(f, "\n  {i}: {frame}")?;
                }
            }
        }
        for note in &self.notes {
            write!(f, "\nnote: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        EvalError::from_kind(EvalErrorKind::Syntax {
            message: err.to_string(),
        })
    }
}

// Syntax errors

#[cold]
pub fn malformed_accessor(accessor: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedAccessor {
        accessor: accessor.to_string(),
    })
}

#[cold]
pub fn malformed_quote(form: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedQuote {
        form: form.to_string(),
    })
}

#[cold]
pub fn malformed_form(keyword: &str, form: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MalformedForm {
        keyword: keyword.to_string(),
        form: form.to_string(),
    })
}

// Name errors

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_global(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedGlobal {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_member(template: &str, member: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMember {
        template: template.to_string(),
        member: member.to_string(),
    })
}

#[cold]
pub fn delete_before_assignment(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::DeleteBeforeAssignment {
        name: name.to_string(),
    })
}

#[cold]
pub fn extension_not_found(alias: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ExtensionNotFound {
        alias: alias.to_string(),
    })
}

#[cold]
pub fn module_not_found(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuleNotFound {
        name: name.to_string(),
    })
}

#[cold]
pub fn module_not_imported(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuleNotImported {
        name: name.to_string(),
    })
}

#[cold]
pub fn missing_closure(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingClosure {
        name: name.to_string(),
    })
}

// Type errors

/// Wrong number of arguments; names the callee and both counts.
#[cold]
pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn strict_type_violation(name: &str, declared: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StrictTypeViolation {
        name: name.to_string(),
        declared: declared.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn unknown_type(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownType {
        name: name.to_string(),
    })
}

#[cold]
pub fn unsupported_operand(operation: &str, operand: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedOperand {
        operation: operation.to_string(),
        operand: operand.to_string(),
    })
}

#[cold]
pub fn not_callable(value: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: value.type_name().to_string(),
    })
}

// Arithmetic errors

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, len })
}

// I/O errors

#[cold]
pub fn io_error(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Io {
        message: message.into(),
    })
}

/// Maximum recursion depth exceeded error.
#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth: limit })
}
