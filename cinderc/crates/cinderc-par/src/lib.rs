//! cinderc-par - Recursive-descent parser fused with semantic analysis.
//!
//! The parser recognizes the grammar and *simultaneously* builds typed AST
//! nodes: every node constructor type-checks its operands, resolves names
//! against the scoped environments, enforces the lvalue rules and tracks the
//! control-flow context. There is no separate checking pass; a
//! [`TranslationUnit`] that comes out of [`parse`] is fully typed.
//!
//! The grammar is C-like and disambiguated by one token of lookahead plus
//! the typedef test: a bare identifier is a type specifier iff the value
//! environment binds it to a typedef. That test is the only reason the
//! parser consults the environment while *recognizing* (rather than
//! analyzing) input.
//!
//! The first error is fatal. Errors are returned as [`ParseError`] values;
//! no recovery is attempted.

mod ast;
mod error;
mod expr;
mod items;
mod scope;
mod stmt;
mod types;

#[cfg(test)]
mod edge_cases;

pub use ast::{
    BinaryOp, Decl, DeclArena, DeclId, Expr, ExprKind, FunctionDecl, Stmt, StmtKind,
    TranslationUnit, UnaryOp,
};
pub use error::ParseError;
pub use scope::{Env, ScopeStack};
pub use types::{StructMember, Type, TypeId, TypeRegistry};

use cinderc_lex::{lex, preprocess, Token, TokenKind};

/// Parser state for one translation unit.
///
/// Owns the preprocessed token stream, the type registry, the declaration
/// arena, the paired scope stacks, the current-function context and the
/// control-flow state stack. All of it is consumed into the resulting
/// [`TranslationUnit`] (or dropped on the first error).
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,

    pub(crate) types: TypeRegistry,
    pub(crate) decls: DeclArena,
    pub(crate) env: Env,

    /// The function whose body is being parsed, if any.
    pub(crate) current_function: Option<DeclId>,
    /// Local variables of the current function, in declaration order.
    pub(crate) locals: Vec<DeclId>,
    /// Control-flow permission masks; see `stmt.rs`.
    pub(crate) flow: Vec<u8>,
}

impl Parser {
    /// Creates a parser over an already-preprocessed token stream.
    ///
    /// The stream must be terminated by an end-of-file token, which [`lex`]
    /// and [`preprocess`] guarantee.
    pub fn new(tokens: Vec<Token>) -> Self {
        assert!(matches!(
            tokens.last().map(|t| t.kind),
            Some(TokenKind::Eof)
        ));

        Self {
            tokens,
            index: 0,
            types: TypeRegistry::new(),
            decls: DeclArena::new(),
            env: Env::new(),
            current_function: None,
            locals: Vec::new(),
            flow: vec![0],
        }
    }

    /// The token under the cursor.
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.index]
    }

    /// One token of lookahead. At the end of the stream this is the
    /// end-of-file token itself.
    pub(crate) fn peek(&self) -> &Token {
        if self.current().kind == TokenKind::Eof {
            self.current()
        } else {
            &self.tokens[self.index + 1]
        }
    }

    /// Consumes and returns the current token. The end-of-file token is
    /// never consumed; it is returned again and again.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    /// Consumes the current token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or fails, naming what was
    /// expected and the offending token's spelling and line.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    /// An `expected X, but got Y` error at the current token.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current().text.clone(),
            line: self.current().line,
        }
    }
}

/// Runs the whole front end over one source string: lex, preprocess, parse
/// and analyze.
pub fn parse(filename: &str, source: &str) -> Result<TranslationUnit, ParseError> {
    let tokens = preprocess(lex(source)?);
    Parser::new(tokens).parse_translation_unit(filename)
}
