//! cinderc-lex - Lexical analysis for the Cinder C subset.
//!
//! This crate turns raw source text into a token stream and normalizes it for
//! the parser:
//!
//! 1. [`lex`] produces the full stream, including whitespace and newline
//!    tokens, terminated by an end-of-file token.
//! 2. [`preprocess`] drops the whitespace tokens and folds runs of adjacent
//!    string literals into a single token.
//!
//! The lexer is pure over its input: no I/O, no global state. Errors are
//! returned as [`LexError`] values carrying the offending source line.

pub mod cursor;
mod error;
mod lexer;
mod preprocessor;
mod token;

pub use error::LexError;
pub use lexer::{lex, Lexer};
pub use preprocessor::preprocess;
pub use token::{Token, TokenKind};
