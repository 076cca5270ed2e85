//! Mapping source types to LLVM types.
//!
//! `void → void`, `int8 → i8`, `int32 → i32`, pointers to the opaque `ptr`,
//! arrays and functions structurally, and structs to named struct types that
//! receive their body the first time they are mapped (all structs reaching
//! the generator are complete).

use cinderc_par::{Type, TypeId, TypeRegistry};
use cinderc_util::FxHashMap;
use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, StructType};
use inkwell::AddressSpace;

use crate::error::{CodeGenError, Result};

/// Maps [`TypeId`]s to LLVM types, caching named struct types so that every
/// mention of one source struct resolves to the same LLVM type.
pub struct TypeMapper<'ctx> {
    context: &'ctx Context,
    structs: FxHashMap<TypeId, StructType<'ctx>>,
}

impl<'ctx> TypeMapper<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self {
            context,
            structs: FxHashMap::default(),
        }
    }

    /// Maps a type usable as a value (anything but `void` and bare function
    /// types).
    pub fn basic(&mut self, types: &TypeRegistry, id: TypeId) -> Result<BasicTypeEnum<'ctx>> {
        match types.get(id) {
            Type::Void => Err(CodeGenError::Internal(
                "void is not a value type".to_string(),
            )),

            Type::Int8 => Ok(self.context.i8_type().into()),

            Type::Int32 => Ok(self.context.i32_type().into()),

            Type::Pointer { .. } => Ok(self.context.ptr_type(AddressSpace::default()).into()),

            Type::Array { elem, len } => {
                let elem = self.basic(types, *elem)?;
                Ok(elem.array_type(*len).into())
            }

            Type::Function { .. } => Err(CodeGenError::Internal(
                "function types are not value types".to_string(),
            )),

            Type::Struct { .. } => Ok(self.struct_type(types, id)?.into()),
        }
    }

    /// Maps a struct type to its named LLVM struct, creating and bodying it
    /// on first use.
    pub fn struct_type(&mut self, types: &TypeRegistry, id: TypeId) -> Result<StructType<'ctx>> {
        if let Some(existing) = self.structs.get(&id) {
            return Ok(*existing);
        }

        let tag = types
            .struct_tag(id)
            .ok_or_else(|| CodeGenError::Internal("expected a struct type".to_string()))?;

        // Register the opaque type first so member mapping can refer back to
        // it through pointers.
        let struct_type = self.context.opaque_struct_type(tag);
        self.structs.insert(id, struct_type);

        let members = types.struct_members(id).ok_or_else(|| {
            CodeGenError::Internal(format!("incomplete struct {} reached lowering", tag))
        })?;

        let field_types = members
            .iter()
            .map(|m| self.basic(types, m.ty))
            .collect::<Result<Vec<_>>>()?;
        struct_type.set_body(&field_types, false);

        Ok(struct_type)
    }

    /// Maps a function type.
    pub fn function_type(&mut self, types: &TypeRegistry, id: TypeId) -> Result<FunctionType<'ctx>> {
        let ret = types
            .function_return(id)
            .ok_or_else(|| CodeGenError::Internal("expected a function type".to_string()))?;
        let var_args = types.function_var_args(id);

        let params = types
            .function_params(id)
            .unwrap()
            .iter()
            .map(|p| self.basic(types, *p).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>>>()?;

        if types.is_void(ret) {
            Ok(self.context.void_type().fn_type(&params, var_args))
        } else {
            Ok(self.basic(types, ret)?.fn_type(&params, var_args))
        }
    }
}
