//! IR lowering over the external builder.
//!
//! The generator walks a typed translation unit and emits instructions
//! through an `inkwell` builder. Expressions are lowered with an explicit
//! lvalue/rvalue split: `lvalue()` produces the address of a storage
//! location, `rvalue()` a loaded value. Statements are lowered onto basic
//! blocks; loops stash their continue/break targets on a stack for the
//! jump statements to find.
//!
//! Storage is allocated eagerly: on function entry one `alloca` is built for
//! every parameter and every local (in declaration order), and parameter
//! values are copied into their slots.

use cinderc_par::{
    BinaryOp, Decl, DeclId, Expr, ExprKind, FunctionDecl, Stmt, StmtKind, TranslationUnit, UnaryOp,
};
use cinderc_util::FxHashMap;
use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicTypeEnum;
use inkwell::values::{
    BasicMetadataValueEnum, BasicValueEnum, FunctionValue, IntValue, PointerValue,
};
use inkwell::{AddressSpace, IntPredicate};

use crate::error::{CodeGenError, Result};
use crate::types::TypeMapper;

/// Branch targets of the nearest enclosing loop.
struct LoopLabels<'ctx> {
    continue_block: BasicBlock<'ctx>,
    break_block: BasicBlock<'ctx>,
}

/// Generator state for one translation unit.
pub struct Generator<'ctx, 'tu> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    mapper: TypeMapper<'ctx>,
    tu: &'tu TranslationUnit,

    /// Function declarations to their IR functions.
    functions: FxHashMap<DeclId, FunctionValue<'ctx>>,
    /// Global variables to their storage.
    globals: FxHashMap<DeclId, PointerValue<'ctx>>,
    /// Parameters and locals of the function being lowered to their slots.
    slots: FxHashMap<DeclId, PointerValue<'ctx>>,
    /// Enclosing loops, innermost last.
    loops: Vec<LoopLabels<'ctx>>,
}

/// Lowers a typed translation unit into a verified module.
pub fn generate<'ctx>(tu: &TranslationUnit, context: &'ctx Context) -> Result<Module<'ctx>> {
    let module = context.create_module(&tu.filename);
    let builder = context.create_builder();

    let mut generator = Generator {
        context,
        module,
        builder,
        mapper: TypeMapper::new(context),
        tu,
        functions: FxHashMap::default(),
        globals: FxHashMap::default(),
        slots: FxHashMap::default(),
        loops: Vec::new(),
    };

    for decl_id in &tu.decls {
        generator.generate_decl(*decl_id)?;
    }

    generator
        .module
        .verify()
        .map_err(|message| CodeGenError::Verify(message.to_string()))?;

    Ok(generator.module)
}

fn llvm_err(e: inkwell::builder::BuilderError) -> CodeGenError {
    CodeGenError::Llvm(e.to_string())
}

impl<'ctx, 'tu> Generator<'ctx, 'tu> {
    fn generate_decl(&mut self, id: DeclId) -> Result<()> {
        match self.tu.decl(id) {
            Decl::Typedef { .. } => Ok(()),

            Decl::Variable { name, ty, .. } => {
                let basic = self.mapper.basic(&self.tu.types, *ty)?;
                let global = self.module.add_global(basic, None, name);
                global.set_initializer(&const_zero(basic));
                self.globals.insert(id, global.as_pointer_value());
                Ok(())
            }

            Decl::Function(function) => self.generate_function(id, function),

            Decl::Param { name, .. } => Err(CodeGenError::Internal(format!(
                "parameter {} at top level",
                name
            ))),
        }
    }

    fn generate_function(&mut self, id: DeclId, decl: &'tu FunctionDecl) -> Result<()> {
        let fn_type = self.mapper.function_type(&self.tu.types, decl.ty)?;
        let function = self
            .module
            .add_function(&decl.name, fn_type, Some(Linkage::External));
        self.functions.insert(id, function);

        let Some(body) = &decl.body else {
            return Ok(());
        };

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        self.slots.clear();

        // One slot per parameter, initialized from the incoming value.
        for (i, param_id) in decl.params.iter().enumerate() {
            let param = self.tu.decl(*param_id);
            let ty = self.mapper.basic(&self.tu.types, param.ty())?;
            let slot = self
                .builder
                .build_alloca(ty, param.name())
                .map_err(llvm_err)?;
            let value = function.get_nth_param(i as u32).ok_or_else(|| {
                CodeGenError::Internal(format!("missing IR parameter {}", param.name()))
            })?;
            self.builder.build_store(slot, value).map_err(llvm_err)?;
            self.slots.insert(*param_id, slot);
        }

        // One slot per local, in declaration order.
        for local_id in &decl.locals {
            let local = self.tu.decl(*local_id);
            let ty = self.mapper.basic(&self.tu.types, local.ty())?;
            let slot = self
                .builder
                .build_alloca(ty, local.name())
                .map_err(llvm_err)?;
            self.slots.insert(*local_id, slot);
        }

        self.generate_stmt(body)?;

        // A body that falls off the end receives a synthetic `ret void`; in
        // a non-void function the verifier flags the path.
        if self.current_block()?.get_terminator().is_none() {
            self.builder.build_return(None).map_err(llvm_err)?;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn generate_stmt(&mut self, stmt: &'tu Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Compound(stmts) => {
                for stmt in stmts {
                    // Statements after return/break/continue land in a fresh
                    // unreachable block.
                    self.ensure_open_block()?;
                    self.generate_stmt(stmt)?;
                }
                Ok(())
            }

            StmtKind::Return(None) => {
                self.builder.build_return(None).map_err(llvm_err)?;
                Ok(())
            }

            StmtKind::Return(Some(value)) => {
                let value = self.rvalue(value)?;
                self.builder.build_return(Some(&value)).map_err(llvm_err)?;
                Ok(())
            }

            StmtKind::If {
                cond,
                then_stmt,
                else_stmt,
            } => self.generate_if(cond, then_stmt, else_stmt.as_deref()),

            StmtKind::While { cond, body } => self.generate_while(cond, body),

            StmtKind::Do { body, cond } => self.generate_do(body, cond),

            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => self.generate_for(init.as_ref(), cond.as_ref(), step.as_ref(), body),

            StmtKind::Break => {
                let target = self.loop_labels()?.break_block;
                self.builder
                    .build_unconditional_branch(target)
                    .map_err(llvm_err)?;
                Ok(())
            }

            StmtKind::Continue => {
                let target = self.loop_labels()?.continue_block;
                self.builder
                    .build_unconditional_branch(target)
                    .map_err(llvm_err)?;
                Ok(())
            }

            // Storage was allocated at entry; a bare type declaration has no
            // object at all.
            StmtKind::Decl(_) => Ok(()),

            StmtKind::Expr(expr) => {
                self.generate_expr(expr)?;
                Ok(())
            }
        }
    }

    fn generate_if(
        &mut self,
        cond: &'tu Expr,
        then_stmt: &'tu Stmt,
        else_stmt: Option<&'tu Stmt>,
    ) -> Result<()> {
        let cond = self.condition(cond)?;
        let function = self.current_function()?;

        let then_block = self.context.append_basic_block(function, "if.then");
        let else_block = else_stmt.map(|_| self.context.append_basic_block(function, "if.else"));
        let end_block = self.context.append_basic_block(function, "if.end");

        self.builder
            .build_conditional_branch(cond, then_block, else_block.unwrap_or(end_block))
            .map_err(llvm_err)?;

        self.builder.position_at_end(then_block);
        self.generate_stmt(then_stmt)?;
        self.branch_to_if_open(end_block)?;

        if let (Some(else_block), Some(else_stmt)) = (else_block, else_stmt) {
            self.builder.position_at_end(else_block);
            self.generate_stmt(else_stmt)?;
            self.branch_to_if_open(end_block)?;
        }

        self.builder.position_at_end(end_block);
        Ok(())
    }

    fn generate_while(&mut self, cond: &'tu Expr, body: &'tu Stmt) -> Result<()> {
        let function = self.current_function()?;
        let header = self.context.append_basic_block(function, "while.cond");
        let body_block = self.context.append_basic_block(function, "while.body");
        let end = self.context.append_basic_block(function, "while.end");

        self.builder
            .build_unconditional_branch(header)
            .map_err(llvm_err)?;

        self.builder.position_at_end(header);
        let cond = self.condition(cond)?;
        self.builder
            .build_conditional_branch(cond, body_block, end)
            .map_err(llvm_err)?;

        self.builder.position_at_end(body_block);
        self.loops.push(LoopLabels {
            continue_block: header,
            break_block: end,
        });
        let body_result = self.generate_stmt(body);
        self.loops.pop();
        body_result?;
        self.branch_to_if_open(header)?;

        self.builder.position_at_end(end);
        Ok(())
    }

    fn generate_do(&mut self, body: &'tu Stmt, cond: &'tu Expr) -> Result<()> {
        let function = self.current_function()?;
        let body_block = self.context.append_basic_block(function, "do.body");
        let header = self.context.append_basic_block(function, "do.cond");
        let end = self.context.append_basic_block(function, "do.end");

        self.builder
            .build_unconditional_branch(body_block)
            .map_err(llvm_err)?;

        self.builder.position_at_end(body_block);
        self.loops.push(LoopLabels {
            continue_block: header,
            break_block: end,
        });
        let body_result = self.generate_stmt(body);
        self.loops.pop();
        body_result?;
        self.branch_to_if_open(header)?;

        self.builder.position_at_end(header);
        let cond = self.condition(cond)?;
        self.builder
            .build_conditional_branch(cond, body_block, end)
            .map_err(llvm_err)?;

        self.builder.position_at_end(end);
        Ok(())
    }

    fn generate_for(
        &mut self,
        init: Option<&'tu Expr>,
        cond: Option<&'tu Expr>,
        step: Option<&'tu Expr>,
        body: &'tu Stmt,
    ) -> Result<()> {
        if let Some(init) = init {
            self.generate_expr(init)?;
        }

        let function = self.current_function()?;
        let header = self.context.append_basic_block(function, "for.cond");
        let body_block = self.context.append_basic_block(function, "for.body");
        let step_block = self.context.append_basic_block(function, "for.step");
        let end = self.context.append_basic_block(function, "for.end");

        self.builder
            .build_unconditional_branch(header)
            .map_err(llvm_err)?;

        self.builder.position_at_end(header);
        match cond {
            Some(cond) => {
                let cond = self.condition(cond)?;
                self.builder
                    .build_conditional_branch(cond, body_block, end)
                    .map_err(llvm_err)?;
            }
            None => {
                self.builder
                    .build_unconditional_branch(body_block)
                    .map_err(llvm_err)?;
            }
        }

        self.builder.position_at_end(body_block);
        self.loops.push(LoopLabels {
            continue_block: step_block,
            break_block: end,
        });
        let body_result = self.generate_stmt(body);
        self.loops.pop();
        body_result?;
        self.branch_to_if_open(step_block)?;

        self.builder.position_at_end(step_block);
        if let Some(step) = step {
            self.generate_expr(step)?;
        }
        self.builder
            .build_unconditional_branch(header)
            .map_err(llvm_err)?;

        self.builder.position_at_end(end);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Lowers an expression for its value. `None` iff the expression's type
    /// is `void` (a void call or a cast to void).
    fn generate_expr(&mut self, expr: &'tu Expr) -> Result<Option<BasicValueEnum<'ctx>>> {
        match &expr.kind {
            ExprKind::Integer(value) => {
                let ty = self.context.i32_type();
                Ok(Some(ty.const_int(*value as u64, false).into()))
            }

            ExprKind::String(bytes) => {
                // A private constant global holding the bytes plus a
                // terminating NUL. Built by hand so embedded NULs survive.
                let value = self.context.const_string(bytes, true);
                let global = self.module.add_global(value.get_type(), None, "str");
                global.set_linkage(Linkage::Private);
                global.set_constant(true);
                global.set_initializer(&value);
                Ok(Some(global.as_pointer_value().into()))
            }

            ExprKind::Identifier { name, decl } => {
                if self.tu.types.is_function(expr.ty) {
                    return Err(CodeGenError::Internal(format!(
                        "function {} used as a value",
                        name
                    )));
                }
                let slot = self.lvalue(expr)?;
                let ty = self.mapper.basic(&self.tu.types, expr.ty)?;
                let value = self.builder.build_load(ty, slot, name).map_err(llvm_err)?;
                Ok(Some(value))
            }

            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Plus => self.generate_expr(operand),

                UnaryOp::Neg => {
                    let value = self.int_rvalue(operand)?;
                    let value = self.builder.build_int_neg(value, "neg").map_err(llvm_err)?;
                    Ok(Some(value.into()))
                }

                UnaryOp::Deref => {
                    let pointer = self.rvalue(operand)?.into_pointer_value();
                    let ty = self.mapper.basic(&self.tu.types, expr.ty)?;
                    let value = self
                        .builder
                        .build_load(ty, pointer, "deref")
                        .map_err(llvm_err)?;
                    Ok(Some(value))
                }

                UnaryOp::AddrOf => {
                    let slot = self.lvalue(operand)?;
                    Ok(Some(slot.into()))
                }
            },

            ExprKind::Binary { op, left, right } => self.generate_binary(*op, left, right),

            ExprKind::Call { callee, args } => self.generate_call(callee, args),

            ExprKind::Dot {
                parent,
                member,
                index,
            } => {
                if parent.is_lvalue {
                    let pointer = self.lvalue(expr)?;
                    let ty = self.mapper.basic(&self.tu.types, expr.ty)?;
                    let value = self
                        .builder
                        .build_load(ty, pointer, member)
                        .map_err(llvm_err)?;
                    Ok(Some(value))
                } else {
                    // Member of a struct rvalue, e.g. a call result.
                    let parent = self.rvalue(parent)?.into_struct_value();
                    let value = self
                        .builder
                        .build_extract_value(parent, *index, member)
                        .map_err(llvm_err)?;
                    Ok(Some(value))
                }
            }

            ExprKind::Cast { operand } => self.generate_cast(expr, operand),
        }
    }

    fn generate_binary(
        &mut self,
        op: BinaryOp,
        left: &'tu Expr,
        right: &'tu Expr,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        if op == BinaryOp::Assign {
            let slot = self.lvalue(left)?;
            let value = self.rvalue(right)?;
            self.builder.build_store(slot, value).map_err(llvm_err)?;
            return Ok(Some(value));
        }

        if op.is_arithmetic() {
            let lhs = self.int_rvalue(left)?;
            let rhs = self.int_rvalue(right)?;
            let value = match op {
                BinaryOp::Add => self.builder.build_int_add(lhs, rhs, "add"),
                BinaryOp::Sub => self.builder.build_int_sub(lhs, rhs, "sub"),
                BinaryOp::Mul => self.builder.build_int_mul(lhs, rhs, "mul"),
                BinaryOp::Div => self.builder.build_int_signed_div(lhs, rhs, "div"),
                BinaryOp::Rem => self.builder.build_int_signed_rem(lhs, rhs, "rem"),
                _ => unreachable!(),
            }
            .map_err(llvm_err)?;
            return Ok(Some(value.into()));
        }

        // Comparison: signed predicates for int32, eq/ne for pointers
        // (compared as integers), result widened to int32.
        let predicate = match op {
            BinaryOp::Lt => IntPredicate::SLT,
            BinaryOp::Gt => IntPredicate::SGT,
            BinaryOp::LtEq => IntPredicate::SLE,
            BinaryOp::GtEq => IntPredicate::SGE,
            BinaryOp::EqEq => IntPredicate::EQ,
            BinaryOp::NotEq => IntPredicate::NE,
            _ => unreachable!(),
        };

        let lhs = self.rvalue(left)?;
        let rhs = self.rvalue(right)?;

        let (lhs, rhs) = if self.tu.types.is_pointer(left.ty) {
            let int = self.context.i64_type();
            (
                self.builder
                    .build_ptr_to_int(lhs.into_pointer_value(), int, "lhs.addr")
                    .map_err(llvm_err)?,
                self.builder
                    .build_ptr_to_int(rhs.into_pointer_value(), int, "rhs.addr")
                    .map_err(llvm_err)?,
            )
        } else {
            (lhs.into_int_value(), rhs.into_int_value())
        };

        let flag = self
            .builder
            .build_int_compare(predicate, lhs, rhs, "cmp")
            .map_err(llvm_err)?;
        let value = self
            .builder
            .build_int_z_extend(flag, self.context.i32_type(), "cmp.ext")
            .map_err(llvm_err)?;
        Ok(Some(value.into()))
    }

    fn generate_call(
        &mut self,
        callee: &'tu Expr,
        args: &'tu [Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        // There are no function pointers: the callee is always an identifier
        // bound to a function declaration.
        let function = match &callee.kind {
            ExprKind::Identifier { decl, .. } => {
                *self.functions.get(decl).ok_or_else(|| {
                    CodeGenError::Internal("call before function declaration".to_string())
                })?
            }
            _ => {
                return Err(CodeGenError::Internal(
                    "callee is not a function identifier".to_string(),
                ))
            }
        };

        let mut arg_values: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.rvalue(arg)?.into());
        }

        let site = self
            .builder
            .build_call(function, &arg_values, "call")
            .map_err(llvm_err)?;

        // Void calls produce no value.
        Ok(site.try_as_basic_value().left())
    }

    fn generate_cast(
        &mut self,
        expr: &'tu Expr,
        operand: &'tu Expr,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let types = &self.tu.types;
        let from = operand.ty;
        let to = expr.ty;

        // A cast to void evaluates the operand for effect only.
        if types.is_void(to) {
            self.generate_expr(operand)?;
            return Ok(None);
        }

        let value = self.rvalue(operand)?;

        if types.equals(from, to) {
            return Ok(Some(value));
        }

        let result: BasicValueEnum = match (types.is_pointer(from), types.is_pointer(to)) {
            // pointer <-> pointer
            (true, true) => {
                let target = self.context.ptr_type(AddressSpace::default());
                self.builder
                    .build_pointer_cast(value.into_pointer_value(), target, "ptr.cast")
                    .map_err(llvm_err)?
                    .into()
            }

            // integer -> pointer
            (false, true) => {
                let target = self.context.ptr_type(AddressSpace::default());
                self.builder
                    .build_int_to_ptr(value.into_int_value(), target, "int2ptr")
                    .map_err(llvm_err)?
                    .into()
            }

            // pointer -> integer
            (true, false) => {
                let target = self.int_type(to)?;
                self.builder
                    .build_ptr_to_int(value.into_pointer_value(), target, "ptr2int")
                    .map_err(llvm_err)?
                    .into()
            }

            // integer width adjustment; int8 is signed, so widening
            // sign-extends.
            (false, false) => {
                let target = self.int_type(to)?;
                let value = value.into_int_value();
                let from_width = value.get_type().get_bit_width();
                let to_width = target.get_bit_width();

                if from_width < to_width {
                    self.builder
                        .build_int_s_extend(value, target, "sext")
                        .map_err(llvm_err)?
                        .into()
                } else if from_width > to_width {
                    self.builder
                        .build_int_truncate(value, target, "trunc")
                        .map_err(llvm_err)?
                        .into()
                } else {
                    value.into()
                }
            }
        };

        Ok(Some(result))
    }

    /// The address of an lvalue expression.
    fn lvalue(&mut self, expr: &'tu Expr) -> Result<PointerValue<'ctx>> {
        match &expr.kind {
            ExprKind::Identifier { name, decl } => self
                .slots
                .get(decl)
                .or_else(|| self.globals.get(decl))
                .copied()
                .ok_or_else(|| {
                    CodeGenError::Internal(format!("no storage for identifier {}", name))
                }),

            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand,
            } => Ok(self.rvalue(operand)?.into_pointer_value()),

            ExprKind::Dot {
                parent,
                member,
                index,
            } => {
                let parent_ptr = self.lvalue(parent)?;
                let struct_type = self.mapper.struct_type(&self.tu.types, parent.ty)?;
                self.builder
                    .build_struct_gep(struct_type, parent_ptr, *index, member)
                    .map_err(llvm_err)
            }

            _ => Err(CodeGenError::Internal(
                "expression is not an lvalue".to_string(),
            )),
        }
    }

    /// Lowers an expression that must produce a value.
    fn rvalue(&mut self, expr: &'tu Expr) -> Result<BasicValueEnum<'ctx>> {
        self.generate_expr(expr)?
            .ok_or_else(|| CodeGenError::Internal("expected a value, got void".to_string()))
    }

    fn int_rvalue(&mut self, expr: &'tu Expr) -> Result<IntValue<'ctx>> {
        Ok(self.rvalue(expr)?.into_int_value())
    }

    /// Reduces a condition expression to `i1` by comparing against zero.
    fn condition(&mut self, expr: &'tu Expr) -> Result<IntValue<'ctx>> {
        let value = self.int_rvalue(expr)?;
        let zero = value.get_type().const_zero();
        self.builder
            .build_int_compare(IntPredicate::NE, value, zero, "tobool")
            .map_err(llvm_err)
    }

    // ------------------------------------------------------------------
    // Block bookkeeping
    // ------------------------------------------------------------------

    fn current_block(&self) -> Result<BasicBlock<'ctx>> {
        self.builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Internal("builder has no insertion block".to_string()))
    }

    fn current_function(&self) -> Result<FunctionValue<'ctx>> {
        self.current_block()?
            .get_parent()
            .ok_or_else(|| CodeGenError::Internal("block has no parent function".to_string()))
    }

    /// Branches to `target` unless the current block is already terminated.
    fn branch_to_if_open(&self, target: BasicBlock<'ctx>) -> Result<()> {
        if self.current_block()?.get_terminator().is_none() {
            self.builder
                .build_unconditional_branch(target)
                .map_err(llvm_err)?;
        }
        Ok(())
    }

    /// Positions the builder on a fresh block if the current one is already
    /// terminated, so statements after a jump still have somewhere to go.
    fn ensure_open_block(&self) -> Result<()> {
        let block = self.current_block()?;
        if block.get_terminator().is_some() {
            let function = self.current_function()?;
            let dead = self.context.append_basic_block(function, "unreachable");
            self.builder.position_at_end(dead);
        }
        Ok(())
    }

    fn loop_labels(&self) -> Result<&LoopLabels<'ctx>> {
        self.loops
            .last()
            .ok_or_else(|| CodeGenError::Internal("jump statement outside of a loop".to_string()))
    }

    fn int_type(&mut self, ty: cinderc_par::TypeId) -> Result<inkwell::types::IntType<'ctx>> {
        match self.mapper.basic(&self.tu.types, ty)? {
            BasicTypeEnum::IntType(int) => Ok(int),
            other => Err(CodeGenError::Internal(format!(
                "expected an integer type, got {:?}",
                other
            ))),
        }
    }
}

/// Zero value for a global of the given type.
fn const_zero(ty: BasicTypeEnum) -> BasicValueEnum {
    match ty {
        BasicTypeEnum::IntType(t) => t.const_zero().into(),
        BasicTypeEnum::PointerType(t) => t.const_null().into(),
        BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
        BasicTypeEnum::StructType(t) => t.const_zero().into(),
        BasicTypeEnum::FloatType(t) => t.const_zero().into(),
        BasicTypeEnum::VectorType(t) => t.const_zero().into(),
        BasicTypeEnum::ScalableVectorType(t) => t.const_zero().into(),
    }
}
