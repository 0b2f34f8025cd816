//! Command-line parsing for tidesh
//!
//! This module contains the pieces of shell syntax the completion engine
//! needs to understand:
//!
//! - `tokenizer`: quote-aware word splitting with source spans, plus the
//!   escape/unescape helpers used throughout the crate
//! - `statement`: statement extraction (command substitutions, plain
//!   statements, decorations) around a cursor position
//!
//! Full command parsing (control flow, redirection targets, job control) is
//! deliberately out of scope; lines are executed by the host shell.

pub mod statement;
pub mod tokenizer;

pub use statement::{cmdsubst_extent, plain_statement_at, Decoration, PlainStatement};
pub use tokenizer::{escape_string, tokenize, unescape, Token};
