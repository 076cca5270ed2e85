//! Statement parsing, scope pairing and the control-flow context.
//!
//! Every scope-introducing construct (compound statement, each `if` branch,
//! loop bodies) pushes the combined environment on entry and pops it on
//! exit, including the error path: the pop happens before an inner error
//! propagates, so the stacks stay balanced.
//!
//! The control-flow context is a stack of bitmasks. A loop body pushes the
//! current mask ORed with both bits, so nested constructs inherit the
//! enclosing permissions; `break`/`continue` check the top of the stack.

use cinderc_lex::TokenKind;

use crate::ast::{Stmt, StmtKind};
use crate::error::ParseError;
use crate::Parser;

/// `break` is permitted.
pub(crate) const FLOW_BREAK: u8 = 1;
/// `continue` is permitted.
pub(crate) const FLOW_CONTINUE: u8 = 2;

impl Parser {
    /// Pushes a control-flow state, inheriting the enclosing permissions.
    fn flow_push(&mut self, bits: u8) {
        let current = *self.flow.last().expect("flow stack is never empty");
        self.flow.push(bits | current);
    }

    fn flow_pop(&mut self) {
        assert!(self.flow.len() > 1, "flow stack underflow");
        self.flow.pop();
    }

    fn flow_accepts(&self, bit: u8) -> bool {
        self.flow.last().expect("flow stack is never empty") & bit != 0
    }

    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.current().kind {
            TokenKind::LBrace => self.parse_compound_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Break => self.parse_break_stmt(),
            TokenKind::Continue => self.parse_continue_stmt(),
            _ => {
                if self.is_declaration_specifier(self.current()) {
                    self.parse_decl_stmt()
                } else {
                    self.parse_expr_stmt()
                }
            }
        }
    }

    pub(crate) fn parse_compound_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.env.push();
        let result = self.parse_compound_body();
        self.env.pop();
        result
    }

    fn parse_compound_body(&mut self) -> Result<Stmt, ParseError> {
        let open = self.expect(TokenKind::LBrace, "{")?;

        let mut stmts = Vec::new();
        while self.current().kind != TokenKind::RBrace {
            if self.current().kind == TokenKind::Eof {
                return Err(self.unexpected("}"));
            }
            stmts.push(self.parse_stmt()?);
        }

        self.expect(TokenKind::RBrace, "}")?;

        Ok(Stmt {
            kind: StmtKind::Compound(stmts),
            line: open.line,
        })
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let t = self.expect(TokenKind::Return, "return")?;

        let value = if self.current().kind != TokenKind::Semicolon {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon, ";")?;

        // Check against the enclosing function's return type.
        let function = self
            .current_function
            .expect("return statement outside of a function body");
        let return_ty = self
            .types
            .function_return(self.decls[function].ty())
            .expect("current function has a function type");

        if self.types.is_void(return_ty) {
            if value.is_some() {
                return Err(ParseError::TypeMismatch {
                    message: "void function should not return a value".to_string(),
                    line: t.line,
                });
            }
        } else {
            let ok = value
                .as_ref()
                .is_some_and(|v| self.assign_into(v.ty, return_ty));
            if !ok {
                return Err(ParseError::TypeMismatch {
                    message: "invalid return type".to_string(),
                    line: t.line,
                });
            }
        }

        Ok(Stmt {
            kind: StmtKind::Return(value),
            line: t.line,
        })
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let t = self.expect(TokenKind::If, "if")?;
        let cond = self.parse_paren_expr()?;

        self.env.push();
        let then_result = self.parse_stmt();
        self.env.pop();
        let then_stmt = then_result?;

        let else_stmt = if self.eat(TokenKind::Else) {
            self.env.push();
            let else_result = self.parse_stmt();
            self.env.pop();
            Some(Box::new(else_result?))
        } else {
            None
        };

        if !self.types.is_int32(cond.ty) {
            return Err(ParseError::TypeMismatch {
                message: "invalid condition type".to_string(),
                line: t.line,
            });
        }

        Ok(Stmt {
            kind: StmtKind::If {
                cond,
                then_stmt: Box::new(then_stmt),
                else_stmt,
            },
            line: t.line,
        })
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let t = self.expect(TokenKind::While, "while")?;
        let cond = self.parse_paren_expr()?;

        self.env.push();
        self.flow_push(FLOW_BREAK | FLOW_CONTINUE);
        let body_result = self.parse_stmt();
        self.flow_pop();
        self.env.pop();
        let body = body_result?;

        if !self.types.is_int32(cond.ty) {
            return Err(ParseError::TypeMismatch {
                message: "invalid condition type".to_string(),
                line: t.line,
            });
        }

        Ok(Stmt {
            kind: StmtKind::While {
                cond,
                body: Box::new(body),
            },
            line: t.line,
        })
    }

    fn parse_do_stmt(&mut self) -> Result<Stmt, ParseError> {
        let t = self.expect(TokenKind::Do, "do")?;

        self.env.push();
        self.flow_push(FLOW_BREAK | FLOW_CONTINUE);
        let body_result = self.parse_stmt();
        self.flow_pop();
        self.env.pop();
        let body = body_result?;

        self.expect(TokenKind::While, "while")?;
        let cond = self.parse_paren_expr()?;
        self.expect(TokenKind::Semicolon, ";")?;

        if !self.types.is_int32(cond.ty) {
            return Err(ParseError::TypeMismatch {
                message: "invalid condition type".to_string(),
                line: t.line,
            });
        }

        Ok(Stmt {
            kind: StmtKind::Do {
                body: Box::new(body),
                cond,
            },
            line: t.line,
        })
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let t = self.expect(TokenKind::For, "for")?;
        self.expect(TokenKind::LParen, "(")?;

        let init = if self.current().kind != TokenKind::Semicolon {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, ";")?;

        let cond = if self.current().kind != TokenKind::Semicolon {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, ";")?;

        let step = if self.current().kind != TokenKind::RParen {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::RParen, ")")?;

        self.env.push();
        self.flow_push(FLOW_BREAK | FLOW_CONTINUE);
        let body_result = self.parse_stmt();
        self.flow_pop();
        self.env.pop();
        let body = body_result?;

        if let Some(cond) = &cond {
            if !self.types.is_int32(cond.ty) {
                return Err(ParseError::TypeMismatch {
                    message: "invalid condition type".to_string(),
                    line: t.line,
                });
            }
        }

        Ok(Stmt {
            kind: StmtKind::For {
                init,
                cond,
                step,
                body: Box::new(body),
            },
            line: t.line,
        })
    }

    fn parse_break_stmt(&mut self) -> Result<Stmt, ParseError> {
        let t = self.expect(TokenKind::Break, "break")?;
        self.expect(TokenKind::Semicolon, ";")?;

        if !self.flow_accepts(FLOW_BREAK) {
            return Err(ParseError::OutsideLoop {
                keyword: "break",
                line: t.line,
            });
        }

        Ok(Stmt {
            kind: StmtKind::Break,
            line: t.line,
        })
    }

    fn parse_continue_stmt(&mut self) -> Result<Stmt, ParseError> {
        let t = self.expect(TokenKind::Continue, "continue")?;
        self.expect(TokenKind::Semicolon, ";")?;

        if !self.flow_accepts(FLOW_CONTINUE) {
            return Err(ParseError::OutsideLoop {
                keyword: "continue",
                line: t.line,
            });
        }

        Ok(Stmt {
            kind: StmtKind::Continue,
            line: t.line,
        })
    }

    fn parse_decl_stmt(&mut self) -> Result<Stmt, ParseError> {
        let decl = self.parse_decl()?;
        let semi = self.expect(TokenKind::Semicolon, ";")?;

        Ok(Stmt {
            kind: StmtKind::Decl(decl),
            line: semi.line,
        })
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        let semi = self.expect(TokenKind::Semicolon, ";")?;

        Ok(Stmt {
            kind: StmtKind::Expr(expr),
            line: semi.line,
        })
    }
}
