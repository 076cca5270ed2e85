//! Parse and semantic-analysis error values.

use cinderc_lex::LexError;
use thiserror::Error;

/// Error produced by the front end. The first error is fatal; nothing is
/// recovered or accumulated.
///
/// The variants follow the error taxonomy: syntax (`UnexpectedToken`,
/// `IntegerOverflow`), name lookup (`UndeclaredSymbol`, `UndefinedMember`),
/// typing (`TypeMismatch`), lvalue discipline (`NotLvalue`), control-flow
/// context (`OutsideLoop`) and redefinition (`Redefinition`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    /// The parser expected one construct and found another token.
    #[error("expected {expected}, but got {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: u32,
    },

    /// An integer literal outside the signed 32-bit range.
    #[error("too large integer constant {text}")]
    IntegerOverflow { text: String, line: u32 },

    /// An identifier with no binding in the value environment.
    #[error("undeclared symbol {name}")]
    UndeclaredSymbol { name: String, line: u32 },

    /// A `.` access naming a member the struct does not have.
    #[error("cannot find member named {name}")]
    UndefinedMember { name: String, line: u32 },

    /// Any type-rule violation.
    #[error("{message}")]
    TypeMismatch { message: String, line: u32 },

    /// An operation that requires an lvalue got an rvalue.
    #[error("{message}")]
    NotLvalue { message: String, line: u32 },

    /// `break` or `continue` outside a permitting context.
    #[error("{keyword} outside of loop")]
    OutsideLoop { keyword: &'static str, line: u32 },

    /// A name defined twice in the same scope, a struct redefined, or a
    /// function given a second body.
    #[error("{message}")]
    Redefinition { message: String, line: u32 },
}

impl ParseError {
    /// Source line the error refers to.
    pub fn line(&self) -> u32 {
        match self {
            ParseError::Lex(e) => e.line(),
            ParseError::UnexpectedToken { line, .. }
            | ParseError::IntegerOverflow { line, .. }
            | ParseError::UndeclaredSymbol { line, .. }
            | ParseError::UndefinedMember { line, .. }
            | ParseError::TypeMismatch { line, .. }
            | ParseError::NotLvalue { line, .. }
            | ParseError::OutsideLoop { line, .. }
            | ParseError::Redefinition { line, .. } => *line,
        }
    }
}
