//! Evaluation behavior observable from OPAL programs.

mod closures;
mod core;
mod templates;
