//! Lexical error values.

use thiserror::Error;

/// Error produced while tokenizing source text.
///
/// Every variant carries the line the offending construct started on; the
/// driver combines it with the file name when rendering the diagnostic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// The source ended inside a character or string literal.
    #[error("unexpected end of file in a literal")]
    EofInLiteral { line: u32 },

    /// A newline appeared inside a character or string literal.
    #[error("unterminated literal")]
    UnterminatedLiteral { line: u32 },

    /// A character literal was not closed with `'`.
    #[error("unterminated character literal")]
    UnterminatedCharacter { line: u32 },

    /// A `/* ... */` comment ran to the end of the source.
    #[error("unterminated /* ... */ comment")]
    UnterminatedComment { line: u32 },

    /// An escape sequence other than `\0 \' \" \n \\`.
    #[error("unknown escape sequence '\\{escape}'")]
    UnknownEscape { escape: char, line: u32 },

    /// A stray `..` (only `.` and `...` are tokens).
    #[error("invalid token '..'")]
    InvalidToken { line: u32 },
}

impl LexError {
    /// Source line the error was detected on.
    pub fn line(&self) -> u32 {
        match *self {
            LexError::EofInLiteral { line }
            | LexError::UnterminatedLiteral { line }
            | LexError::UnterminatedCharacter { line }
            | LexError::UnterminatedComment { line }
            | LexError::UnknownEscape { line, .. }
            | LexError::InvalidToken { line } => line,
        }
    }
}
