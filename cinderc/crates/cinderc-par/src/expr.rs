//! Expression parsing and the semantic rules applied during construction.
//!
//! Precedence ladder, lowest to highest: assignment (right-associative, `=`
//! only), equality, relational, additive, multiplicative, unary, postfix,
//! primary. When the current token is `(`, the unary level decides between a
//! cast and a parenthesized expression by testing whether the *next* token
//! is a type specifier.

use cinderc_lex::{Token, TokenKind};

use crate::ast::{BinaryOp, Decl, Expr, ExprKind, UnaryOp};
use crate::error::ParseError;
use crate::types::TypeId;
use crate::Parser;

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assign_expr()
    }

    /// assignment-expression: equality-expression [ `=` assignment-expression ]
    pub(crate) fn parse_assign_expr(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_equality_expr()?;

        if self.current().kind != TokenKind::Eq {
            return Ok(left);
        }

        let op = self.advance();
        let right = self.parse_assign_expr()?;
        self.sema_binary_expr(left, op, right)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational_expr()?;

        while matches!(self.current().kind, TokenKind::EqEq | TokenKind::NotEq) {
            let op = self.advance();
            let right = self.parse_relational_expr()?;
            left = self.sema_binary_expr(left, op, right)?;
        }

        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive_expr()?;

        while matches!(
            self.current().kind,
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq
        ) {
            let op = self.advance();
            let right = self.parse_additive_expr()?;
            left = self.sema_binary_expr(left, op, right)?;
        }

        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative_expr()?;

        while matches!(self.current().kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = self.sema_binary_expr(left, op, right)?;
        }

        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary_expr()?;

        while matches!(
            self.current().kind,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent
        ) {
            let op = self.advance();
            let right = self.parse_unary_expr()?;
            left = self.sema_binary_expr(left, op, right)?;
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, ParseError> {
        match self.current().kind {
            TokenKind::Minus | TokenKind::Plus | TokenKind::Star | TokenKind::Ampersand => {
                let op = self.advance();
                let operand = self.parse_unary_expr()?;
                self.sema_unary_expr(op, operand)
            }

            // `( type )` is a cast, `( expr )` is grouping.
            TokenKind::LParen if self.is_type_specifier(self.peek()) => self.parse_cast_expr(),

            _ => self.parse_postfix_expr(),
        }
    }

    fn parse_cast_expr(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LParen, "(")?;
        let target = self.parse_type()?;
        self.expect(TokenKind::RParen, ")")?;
        let operand = self.parse_unary_expr()?;

        Ok(Expr {
            kind: ExprKind::Cast {
                operand: Box::new(operand),
            },
            ty: target,
            is_lvalue: false,
            line: open.line,
        })
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr, ParseError> {
        let mut operand = self.parse_primary_expr()?;

        loop {
            match self.current().kind {
                TokenKind::LParen => operand = self.parse_call_expr(operand)?,
                TokenKind::Dot => operand = self.parse_dot_expr(operand)?,
                _ => return Ok(operand),
            }
        }
    }

    fn parse_call_expr(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LParen, "(")?;

        let mut args = Vec::new();
        if self.current().kind != TokenKind::RParen {
            args.push(self.parse_assign_expr()?);
            while self.eat(TokenKind::Comma) {
                args.push(self.parse_assign_expr()?);
            }
        }

        self.expect(TokenKind::RParen, ")")?;
        self.sema_call_expr(callee, open, args)
    }

    fn parse_dot_expr(&mut self, parent: Expr) -> Result<Expr, ParseError> {
        let dot = self.expect(TokenKind::Dot, ".")?;
        let member = self.expect(TokenKind::Identifier, "identifier")?;
        self.sema_dot_expr(parent, dot, member)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        match self.current().kind {
            TokenKind::LParen => self.parse_paren_expr(),
            TokenKind::Number => self.parse_number_expr(),
            TokenKind::String => self.parse_string_expr(),
            TokenKind::Identifier => self.parse_identifier_expr(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `( expression )`; the parentheses leave no node behind.
    pub(crate) fn parse_paren_expr(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen, "(")?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::RParen, ")")?;
        Ok(expr)
    }

    fn parse_number_expr(&mut self) -> Result<Expr, ParseError> {
        let t = self.expect(TokenKind::Number, "number")?;

        // The spelling is all decimal digits; anything that does not fit in
        // a signed 32-bit integer is rejected.
        let value = match t.text.parse::<i64>() {
            Ok(v) if v <= i32::MAX as i64 => v as i32,
            _ => {
                return Err(ParseError::IntegerOverflow {
                    text: t.text,
                    line: t.line,
                })
            }
        };

        Ok(Expr {
            kind: ExprKind::Integer(value),
            ty: self.types.int32(),
            is_lvalue: false,
            line: t.line,
        })
    }

    fn parse_string_expr(&mut self) -> Result<Expr, ParseError> {
        let t = self.expect(TokenKind::String, "string")?;
        let bytes = t.bytes.unwrap_or_default();
        let int8 = self.types.int8();
        let ty = self.types.pointer(int8);

        Ok(Expr {
            kind: ExprKind::String(bytes),
            ty,
            is_lvalue: false,
            line: t.line,
        })
    }

    fn parse_identifier_expr(&mut self) -> Result<Expr, ParseError> {
        let t = self.expect(TokenKind::Identifier, "identifier")?;

        let decl = self.env.values.lookup(&t.text, true).ok_or_else(|| {
            ParseError::UndeclaredSymbol {
                name: t.text.clone(),
                line: t.line,
            }
        })?;

        let node = &self.decls[decl];
        let is_lvalue = matches!(node, Decl::Variable { .. } | Decl::Param { .. });

        Ok(Expr {
            kind: ExprKind::Identifier {
                name: t.text,
                decl,
            },
            ty: node.ty(),
            is_lvalue,
            line: t.line,
        })
    }

    // ------------------------------------------------------------------
    // Semantic constructors
    // ------------------------------------------------------------------

    /// Assignability: the expression type must be complete and identical to
    /// the destination type. Mixed-type assignments require explicit casts.
    pub(crate) fn assign_into(&self, expr_ty: TypeId, dest_ty: TypeId) -> bool {
        !self.types.is_incomplete(expr_ty) && self.types.equals(expr_ty, dest_ty)
    }

    fn sema_unary_expr(&mut self, op: Token, operand: Expr) -> Result<Expr, ParseError> {
        let (unary_op, ty, is_lvalue) = match op.kind {
            TokenKind::Plus | TokenKind::Minus => {
                if !self.types.is_int32(operand.ty) {
                    return Err(ParseError::TypeMismatch {
                        message: format!("invalid operand type of unary operator {}", op.text),
                        line: op.line,
                    });
                }
                let unary_op = if op.kind == TokenKind::Plus {
                    UnaryOp::Plus
                } else {
                    UnaryOp::Neg
                };
                (unary_op, operand.ty, false)
            }

            TokenKind::Star => {
                if !self.types.is_pointer(operand.ty) {
                    return Err(ParseError::TypeMismatch {
                        message: format!("invalid operand type of unary operator {}", op.text),
                        line: op.line,
                    });
                }
                if self.types.is_incomplete_pointer(operand.ty) {
                    return Err(ParseError::TypeMismatch {
                        message: "cannot dereference pointer of incomplete type".to_string(),
                        line: op.line,
                    });
                }
                let elem = self.types.pointer_element(operand.ty).unwrap();
                (UnaryOp::Deref, elem, true)
            }

            TokenKind::Ampersand => {
                if !operand.is_lvalue {
                    return Err(ParseError::NotLvalue {
                        message: format!(
                            "operand of unary operator {} must be a lvalue",
                            op.text
                        ),
                        line: op.line,
                    });
                }
                let ty = self.types.pointer(operand.ty);
                (UnaryOp::AddrOf, ty, false)
            }

            _ => unreachable!("not a unary operator: {:?}", op.kind),
        };

        Ok(Expr {
            kind: ExprKind::Unary {
                op: unary_op,
                operand: Box::new(operand),
            },
            ty,
            is_lvalue,
            line: op.line,
        })
    }

    fn sema_binary_expr(&mut self, left: Expr, op: Token, right: Expr) -> Result<Expr, ParseError> {
        let binary_op = match op.kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::EqEq => BinaryOp::EqEq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Eq => BinaryOp::Assign,
            _ => unreachable!("not a binary operator: {:?}", op.kind),
        };

        let invalid_operands = || ParseError::TypeMismatch {
            message: format!("invalid operand type of binary operator {}", op.text),
            line: op.line,
        };

        let ty = if binary_op.is_arithmetic() {
            if !self.types.is_int32(left.ty) || !self.types.is_int32(right.ty) {
                return Err(invalid_operands());
            }
            left.ty
        } else if binary_op.is_relational() {
            if !self.types.is_int32(left.ty) || !self.types.is_int32(right.ty) {
                return Err(invalid_operands());
            }
            self.types.int32()
        } else if binary_op.is_equality() {
            // Two int32 operands, or two pointers of identical type.
            let ints = self.types.is_int32(left.ty) && self.types.is_int32(right.ty);
            let pointers = self.types.is_pointer(left.ty)
                && self.types.is_pointer(right.ty)
                && self.types.equals(left.ty, right.ty);
            if !ints && !pointers {
                return Err(invalid_operands());
            }
            self.types.int32()
        } else {
            // Assignment.
            if !left.is_lvalue {
                return Err(ParseError::NotLvalue {
                    message: "cannot assign to rvalue".to_string(),
                    line: op.line,
                });
            }
            if !self.assign_into(right.ty, left.ty) {
                return Err(invalid_operands());
            }
            right.ty
        };

        Ok(Expr {
            kind: ExprKind::Binary {
                op: binary_op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            is_lvalue: false,
            line: op.line,
        })
    }

    fn sema_call_expr(
        &mut self,
        callee: Expr,
        open: Token,
        args: Vec<Expr>,
    ) -> Result<Expr, ParseError> {
        if !self.types.is_function(callee.ty) {
            return Err(ParseError::TypeMismatch {
                message: "invalid callee type".to_string(),
                line: open.line,
            });
        }

        let params = self.types.function_params(callee.ty).unwrap().to_vec();
        let var_args = self.types.function_var_args(callee.ty);

        let count_ok = if var_args {
            args.len() >= params.len()
        } else {
            args.len() == params.len()
        };
        if !count_ok {
            return Err(ParseError::TypeMismatch {
                message: "invalid number of arguments".to_string(),
                line: open.line,
            });
        }

        // Declared parameters are checked; var-args extras are not.
        for (arg, param_ty) in args.iter().zip(params.iter()) {
            if !self.assign_into(arg.ty, *param_ty) {
                return Err(ParseError::TypeMismatch {
                    message: "invalid type of argument".to_string(),
                    line: arg.line,
                });
            }
        }

        let ty = self.types.function_return(callee.ty).unwrap();

        Ok(Expr {
            kind: ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            ty,
            is_lvalue: false,
            line: open.line,
        })
    }

    fn sema_dot_expr(&mut self, parent: Expr, dot: Token, member: Token) -> Result<Expr, ParseError> {
        if !self.types.is_struct(parent.ty) {
            return Err(ParseError::TypeMismatch {
                message: "member reference base type must be a struct type".to_string(),
                line: dot.line,
            });
        }

        let (index, found) = self
            .types
            .struct_find_member(parent.ty, &member.text)
            .ok_or_else(|| ParseError::UndefinedMember {
                name: member.text.clone(),
                line: member.line,
            })?;

        let ty = found.ty;
        let is_lvalue = parent.is_lvalue;

        Ok(Expr {
            kind: ExprKind::Dot {
                parent: Box::new(parent),
                member: member.text,
                index: index as u32,
            },
            ty,
            is_lvalue,
            line: dot.line,
        })
    }
}
