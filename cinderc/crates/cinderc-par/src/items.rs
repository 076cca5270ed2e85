//! Type specifiers, declarations, functions and the translation unit.
//!
//! Top level, an item is a typedef, a function prototype or definition, a
//! global variable, or a bare type declaration (`struct T { ... };`). The
//! single subtlety of the grammar lives here: after parsing a type, the next
//! tokens decide which of those it was.

use cinderc_lex::{Token, TokenKind};

use crate::ast::{Decl, DeclId, FunctionDecl, TranslationUnit};
use crate::error::ParseError;
use crate::types::{StructMember, TypeId};
use crate::Parser;

impl Parser {
    /// A token opens a type specifier if it is a type keyword, `struct`,
    /// `const`, or an identifier bound to a typedef. The typedef test is the
    /// only place the recognizer consults the environment.
    pub(crate) fn is_type_specifier(&self, t: &Token) -> bool {
        match t.kind {
            TokenKind::Void
            | TokenKind::Char
            | TokenKind::Int
            | TokenKind::Struct
            | TokenKind::Const => true,

            TokenKind::Identifier => self
                .env
                .values
                .lookup(&t.text, true)
                .is_some_and(|id| self.decls[id].is_typedef()),

            _ => false,
        }
    }

    pub(crate) fn is_declaration_specifier(&self, t: &Token) -> bool {
        t.kind == TokenKind::Typedef || self.is_type_specifier(t)
    }

    /// type: [`const`] primary-type `*`*
    ///
    /// `const` is accepted but not tracked.
    pub(crate) fn parse_type(&mut self) -> Result<TypeId, ParseError> {
        self.eat(TokenKind::Const);

        let mut ty = self.parse_primary_type()?;

        while self.eat(TokenKind::Star) {
            ty = self.types.pointer(ty);
        }

        Ok(ty)
    }

    fn parse_primary_type(&mut self) -> Result<TypeId, ParseError> {
        match self.current().kind {
            TokenKind::Void => {
                self.advance();
                Ok(self.types.void())
            }

            TokenKind::Char => {
                self.advance();
                Ok(self.types.int8())
            }

            TokenKind::Int => {
                self.advance();
                Ok(self.types.int32())
            }

            TokenKind::Identifier => self.parse_identifier_type(),

            TokenKind::Struct => self.parse_struct_type(),

            _ => Err(self.unexpected("type")),
        }
    }

    fn parse_identifier_type(&mut self) -> Result<TypeId, ParseError> {
        let t = self.expect(TokenKind::Identifier, "identifier")?;

        match self.env.values.lookup(&t.text, true) {
            Some(id) if self.decls[id].is_typedef() => Ok(self.decls[id].ty()),
            _ => Err(ParseError::UnexpectedToken {
                expected: "type".to_string(),
                found: t.text,
                line: t.line,
            }),
        }
    }

    /// struct-type: `struct` identifier [ `{` member* `}` ]
    fn parse_struct_type(&mut self) -> Result<TypeId, ParseError> {
        let t = self.expect(TokenKind::Struct, "struct")?;
        let tag = self.expect(TokenKind::Identifier, "identifier")?;

        if self.current().kind != TokenKind::LBrace {
            // A reference: find the tag anywhere up the stack, or introduce
            // an incomplete one in the innermost scope.
            return Ok(match self.env.tags.lookup(&tag.text, true) {
                Some(ty) => ty,
                None => {
                    let ty = self.types.struct_incomplete(&tag.text, t.line);
                    self.env.tags.define(&tag.text, ty);
                    ty
                }
            });
        }

        self.advance();

        // A definition: find-or-create in the innermost scope only, so an
        // inner tag shadows an outer one instead of completing it.
        let ty = match self.env.tags.lookup(&tag.text, false) {
            Some(ty) => ty,
            None => {
                let ty = self.types.struct_incomplete(&tag.text, t.line);
                self.env.tags.define(&tag.text, ty);
                ty
            }
        };

        if self.types.struct_members(ty).is_some() {
            return Err(ParseError::Redefinition {
                message: format!("redefinition of struct {}", tag.text),
                line: tag.line,
            });
        }

        // The tag is registered before the body is parsed, so members may be
        // pointers to the struct itself.
        self.env.push();
        let members = self.parse_struct_members();
        self.env.pop();
        let members = members?;

        if members.is_empty() {
            return Err(ParseError::TypeMismatch {
                message: "empty struct is not supported".to_string(),
                line: t.line,
            });
        }

        for (i, member) in members.iter().enumerate() {
            if members[..i].iter().any(|m| m.name == member.name) {
                return Err(ParseError::Redefinition {
                    message: format!("member {} is already defined", member.name),
                    line: member.line,
                });
            }
        }

        self.types.struct_complete(ty, members);
        Ok(ty)
    }

    fn parse_struct_members(&mut self) -> Result<Vec<StructMember>, ParseError> {
        let mut members = Vec::new();

        while self.current().kind != TokenKind::RBrace {
            if self.current().kind == TokenKind::Eof {
                return Err(self.unexpected("}"));
            }
            members.push(self.parse_struct_member()?);
        }

        self.expect(TokenKind::RBrace, "}")?;
        Ok(members)
    }

    fn parse_struct_member(&mut self) -> Result<StructMember, ParseError> {
        let ty = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "identifier")?;
        self.expect(TokenKind::Semicolon, ";")?;

        if self.types.is_incomplete(ty) {
            return Err(ParseError::TypeMismatch {
                message: "member of struct must be a complete type".to_string(),
                line: name.line,
            });
        }

        Ok(StructMember {
            name: name.text,
            ty,
            line: name.line,
        })
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// declaration: typedef | variable-declaration
    ///
    /// Returns `None` for a bare type declaration (`struct T { ... }` with
    /// no declarator), which only has the side effect of registering the
    /// tag. The trailing `;` belongs to the caller.
    pub(crate) fn parse_decl(&mut self) -> Result<Option<DeclId>, ParseError> {
        if self.current().kind == TokenKind::Typedef {
            return self.parse_typedef().map(Some);
        }
        self.parse_var_decl()
    }

    fn parse_typedef(&mut self) -> Result<DeclId, ParseError> {
        self.expect(TokenKind::Typedef, "typedef")?;
        let ty = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "identifier")?;

        self.check_redeclaration(&name)?;

        // The alias stores the aliased type id itself; resolving the alias
        // later yields the identical type.
        let id = self.decls.push(Decl::Typedef {
            name: name.text.clone(),
            ty,
            line: name.line,
        });
        self.env.values.define(&name.text, id);

        Ok(id)
    }

    fn parse_var_decl(&mut self) -> Result<Option<DeclId>, ParseError> {
        let ty = self.parse_type()?;

        if self.current().kind == TokenKind::Semicolon {
            return Ok(None);
        }

        let name = self.expect(TokenKind::Identifier, "identifier")?;
        self.sema_var_decl(ty, name).map(Some)
    }

    fn sema_var_decl(&mut self, ty: TypeId, name: Token) -> Result<DeclId, ParseError> {
        if self.types.is_incomplete(ty) {
            return Err(ParseError::TypeMismatch {
                message: "variable must have a complete type".to_string(),
                line: name.line,
            });
        }

        self.check_redeclaration(&name)?;

        let id = self.decls.push(Decl::Variable {
            name: name.text.clone(),
            ty,
            line: name.line,
        });
        self.env.values.define(&name.text, id);

        // Locals are collected for entry-block allocation; at file scope the
        // declaration becomes a zero-initialized global instead.
        if self.current_function.is_some() {
            self.locals.push(id);
        }

        Ok(id)
    }

    fn parse_param(&mut self) -> Result<DeclId, ParseError> {
        let ty = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "identifier")?;

        if self.types.is_incomplete(ty) {
            return Err(ParseError::TypeMismatch {
                message: "parameter must have a complete type".to_string(),
                line: name.line,
            });
        }

        self.check_redeclaration(&name)?;

        let id = self.decls.push(Decl::Param {
            name: name.text.clone(),
            ty,
            line: name.line,
        });
        self.env.values.define(&name.text, id);

        Ok(id)
    }

    /// Same-scope redeclaration is fatal; shadowing an outer scope is fine.
    fn check_redeclaration(&self, name: &Token) -> Result<(), ParseError> {
        if self.env.values.lookup(&name.text, false).is_some() {
            return Err(ParseError::Redefinition {
                message: format!(
                    "symbol {} has already been declared in this scope",
                    name.text
                ),
                line: name.line,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Top level
    // ------------------------------------------------------------------

    /// top-level: typedef `;` | function | global variable | type `;`
    ///
    /// Returns `None` when the item added nothing new to the declaration
    /// list (bare type declaration, or a definition that filled in an
    /// already-listed prototype).
    fn parse_top_level(&mut self) -> Result<Option<DeclId>, ParseError> {
        if self.current().kind == TokenKind::Typedef {
            let decl = self.parse_typedef()?;
            self.expect(TokenKind::Semicolon, ";")?;
            return Ok(Some(decl));
        }

        self.parse_function()
    }

    fn parse_function(&mut self) -> Result<Option<DeclId>, ParseError> {
        let return_ty = self.parse_type()?;

        // `struct T { ... };` declares the tag only.
        if self.eat(TokenKind::Semicolon) {
            return Ok(None);
        }

        let name = self.expect(TokenKind::Identifier, "identifier")?;

        // `int a;` is a global variable.
        if self.eat(TokenKind::Semicolon) {
            return self.sema_var_decl(return_ty, name).map(Some);
        }

        self.expect(TokenKind::LParen, "(")?;

        // Parameters get their own scope; it is popped before the function
        // symbol is bound and re-created for the body.
        self.env.push();
        let params = self.parse_params();
        self.env.pop();
        let (params, var_args) = params?;

        self.expect(TokenKind::RParen, ")")?;

        let param_tys: Vec<TypeId> = params.iter().map(|p| self.decls[*p].ty()).collect();
        let fn_ty = self.types.function(return_ty, param_tys, var_args);

        // A previous declaration of the same name must be a function with
        // the identical type; anything else is a redefinition error.
        let existing = match self.env.values.lookup(&name.text, false) {
            None => None,
            Some(id) => match &self.decls[id] {
                Decl::Function(f) if self.types.equals(f.ty, fn_ty) => Some(id),
                _ => {
                    return Err(ParseError::Redefinition {
                        message: format!(
                            "symbol {} has already been declared in this scope",
                            name.text
                        ),
                        line: name.line,
                    })
                }
            },
        };

        let (id, is_new) = match existing {
            Some(id) => (id, false),
            None => {
                let id = self.decls.push(Decl::Function(FunctionDecl {
                    name: name.text.clone(),
                    ty: fn_ty,
                    params: params.clone(),
                    var_args,
                    body: None,
                    locals: Vec::new(),
                    line: name.line,
                }));
                self.env.values.define(&name.text, id);
                (id, true)
            }
        };

        // Prototype: done. Repeated prototypes are accepted but not listed
        // again.
        if self.eat(TokenKind::Semicolon) {
            return Ok(if is_new { Some(id) } else { None });
        }

        // Definition follows. Bodies are parsed exactly once.
        if let Decl::Function(f) = &self.decls[id] {
            if f.body.is_some() {
                return Err(ParseError::Redefinition {
                    message: format!("redefinition of function {}", name.text),
                    line: name.line,
                });
            }
        }

        // The definition's parameters replace the prototype's.
        if let Decl::Function(f) = &mut self.decls[id] {
            f.params = params.clone();
        }

        self.current_function = Some(id);
        self.locals = Vec::new();

        // Parameters share the body's outermost scope.
        self.env.push();
        for param in &params {
            let param_name = self.decls[*param].name().to_string();
            self.env.values.define(&param_name, *param);
        }

        let body = self.parse_compound_stmt();
        self.env.pop();
        let body = body?;

        let locals = std::mem::take(&mut self.locals);
        self.current_function = None;

        if let Decl::Function(f) = &mut self.decls[id] {
            f.body = Some(body);
            f.locals = locals;
        }

        Ok(if is_new { Some(id) } else { None })
    }

    /// parameter-list: `void` | param (`,` param)* [`,` `...`]
    ///
    /// A lone `void` is normalized to an empty parameter list.
    fn parse_params(&mut self) -> Result<(Vec<DeclId>, bool), ParseError> {
        let mut params = Vec::new();
        let mut var_args = false;

        if self.current().kind == TokenKind::Void && self.peek().kind == TokenKind::RParen {
            self.advance();
            return Ok((params, var_args));
        }

        params.push(self.parse_param()?);

        while self.eat(TokenKind::Comma) {
            if self.eat(TokenKind::DotDotDot) {
                var_args = true;
                break;
            }
            params.push(self.parse_param()?);
        }

        Ok((params, var_args))
    }

    /// Parses a whole translation unit and hands back everything the
    /// generator needs.
    pub fn parse_translation_unit(
        mut self,
        filename: &str,
    ) -> Result<TranslationUnit, ParseError> {
        let mut decls = Vec::new();

        while self.current().kind != TokenKind::Eof {
            if let Some(decl) = self.parse_top_level()? {
                decls.push(decl);
            }
        }

        debug_assert_eq!(self.env.depth(), 1);
        debug_assert_eq!(self.flow.len(), 1);

        Ok(TranslationUnit {
            filename: filename.to_string(),
            decls,
            arena: self.decls,
            types: self.types,
        })
    }
}
