//! The type registry.
//!
//! All types of a translation unit live in one registry and are referred to
//! by [`TypeId`]. The three primitives are allocated once at fixed ids, so
//! "primitives compare by identity" is simply id equality and
//! [`TypeRegistry::int32`] returns the same id for the lifetime of a compile.
//! Pointer, array and function types are freely re-allocated and compared
//! structurally; struct types are nominal and equal only by id.
//!
//! Struct types are completable: they are created incomplete (tag known,
//! members unknown) so that a member can already be a pointer to the
//! enclosing struct, and transition to complete exactly once.

use cinderc_util::{define_idx, IndexVec};

define_idx!(TypeId);

/// A member of a complete struct type.
#[derive(Clone, Debug)]
pub struct StructMember {
    pub name: String,
    pub ty: TypeId,
    pub line: u32,
}

/// A type. `Struct` with `members: None` is an incomplete (declared but not
/// yet defined) struct.
#[derive(Clone, Debug)]
pub enum Type {
    Void,
    Int8,
    Int32,
    Pointer {
        elem: TypeId,
    },
    Array {
        elem: TypeId,
        len: u32,
    },
    Function {
        ret: TypeId,
        params: Vec<TypeId>,
        var_args: bool,
    },
    Struct {
        tag: String,
        members: Option<Vec<StructMember>>,
        line: u32,
    },
}

/// Owns every type of one translation unit.
#[derive(Debug)]
pub struct TypeRegistry {
    types: IndexVec<TypeId, Type>,
}

const VOID: TypeId = TypeId(0);
const INT8: TypeId = TypeId(1);
const INT32: TypeId = TypeId(2);

impl TypeRegistry {
    pub fn new() -> Self {
        let mut types = IndexVec::new();
        assert_eq!(types.push(Type::Void), VOID);
        assert_eq!(types.push(Type::Int8), INT8);
        assert_eq!(types.push(Type::Int32), INT32);
        Self { types }
    }

    /// The `void` singleton.
    pub fn void(&self) -> TypeId {
        VOID
    }

    /// The `int8` (C `char`) singleton.
    pub fn int8(&self) -> TypeId {
        INT8
    }

    /// The `int32` (C `int`) singleton.
    pub fn int32(&self) -> TypeId {
        INT32
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    /// Constructs a pointer type.
    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.types.push(Type::Pointer { elem })
    }

    /// Constructs an array type. `len` must be at least 1.
    pub fn array(&mut self, elem: TypeId, len: u32) -> TypeId {
        assert!(len >= 1);
        self.types.push(Type::Array { elem, len })
    }

    /// Constructs a function type. An empty parameter list is the normalized
    /// form of a `(void)` parameter list.
    pub fn function(&mut self, ret: TypeId, params: Vec<TypeId>, var_args: bool) -> TypeId {
        self.types.push(Type::Function {
            ret,
            params,
            var_args,
        })
    }

    /// Creates an incomplete struct type for `tag`.
    pub fn struct_incomplete(&mut self, tag: &str, line: u32) -> TypeId {
        self.types.push(Type::Struct {
            tag: tag.to_string(),
            members: None,
            line,
        })
    }

    /// Transitions an incomplete struct to complete.
    ///
    /// The caller has already rejected empty member lists and duplicate
    /// member names; completing twice is an implementation bug.
    pub fn struct_complete(&mut self, id: TypeId, new_members: Vec<StructMember>) {
        assert!(!new_members.is_empty());
        match &mut self.types[id] {
            Type::Struct { members, .. } => {
                assert!(members.is_none(), "struct completed twice");
                *members = Some(new_members);
            }
            _ => panic!("struct_complete on a non-struct type"),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Void)
    }

    pub fn is_int8(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Int8)
    }

    pub fn is_int32(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Int32)
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Pointer { .. })
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Array { .. })
    }

    pub fn is_function(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Function { .. })
    }

    pub fn is_struct(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Struct { .. })
    }

    /// `void`, function types and not-yet-completed structs have no object
    /// layout and cannot be the type of a variable, parameter or member.
    pub fn is_incomplete(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::Void | Type::Function { .. } => true,
            Type::Struct { members, .. } => members.is_none(),
            _ => false,
        }
    }

    pub fn is_void_pointer(&self, id: TypeId) -> bool {
        self.pointer_element(id).is_some_and(|e| self.is_void(e))
    }

    pub fn is_incomplete_pointer(&self, id: TypeId) -> bool {
        self.pointer_element(id)
            .is_some_and(|e| self.is_incomplete(e))
    }

    pub fn pointer_element(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Pointer { elem } => Some(*elem),
            _ => None,
        }
    }

    pub fn array_element(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Array { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    pub fn array_length(&self, id: TypeId) -> Option<u32> {
        match self.get(id) {
            Type::Array { len, .. } => Some(*len),
            _ => None,
        }
    }

    pub fn function_return(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::Function { ret, .. } => Some(*ret),
            _ => None,
        }
    }

    pub fn function_params(&self, id: TypeId) -> Option<&[TypeId]> {
        match self.get(id) {
            Type::Function { params, .. } => Some(params),
            _ => None,
        }
    }

    pub fn function_var_args(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Function { var_args: true, .. })
    }

    pub fn struct_tag(&self, id: TypeId) -> Option<&str> {
        match self.get(id) {
            Type::Struct { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn struct_members(&self, id: TypeId) -> Option<&[StructMember]> {
        match self.get(id) {
            Type::Struct {
                members: Some(members),
                ..
            } => Some(members),
            _ => None,
        }
    }

    /// Finds a member of a complete struct by name, returning its index and
    /// the member itself.
    pub fn struct_find_member(&self, id: TypeId, name: &str) -> Option<(usize, &StructMember)> {
        self.struct_members(id)?
            .iter()
            .enumerate()
            .find(|(_, m)| m.name == name)
    }

    /// Structural equality. Identity first; structs are nominal, so two
    /// distinct struct ids are never equal.
    pub fn equals(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }

        match (self.get(a), self.get(b)) {
            (Type::Void, Type::Void) => true,
            (Type::Int8, Type::Int8) => true,
            (Type::Int32, Type::Int32) => true,

            (Type::Pointer { elem: ea }, Type::Pointer { elem: eb }) => self.equals(*ea, *eb),

            (
                Type::Array { elem: ea, len: la },
                Type::Array { elem: eb, len: lb },
            ) => la == lb && self.equals(*ea, *eb),

            (
                Type::Function {
                    ret: ra,
                    params: pa,
                    var_args: va,
                },
                Type::Function {
                    ret: rb,
                    params: pb,
                    var_args: vb,
                },
            ) => {
                va == vb
                    && self.equals(*ra, *rb)
                    && pa.len() == pb.len()
                    && pa.iter().zip(pb.iter()).all(|(x, y)| self.equals(*x, *y))
            }

            _ => false,
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_singletons() {
        let types = TypeRegistry::new();
        assert_eq!(types.int32(), types.int32());
        assert_ne!(types.int8(), types.int32());
        assert!(types.is_void(types.void()));
        assert!(types.is_int8(types.int8()));
        assert!(types.is_int32(types.int32()));
    }

    #[test]
    fn test_pointer_equality_is_structural() {
        let mut types = TypeRegistry::new();
        let p1 = types.pointer(types.int32());
        let p2 = types.pointer(types.int32());
        let p3 = types.pointer(types.int8());

        assert_ne!(p1, p2);
        assert!(types.equals(p1, p2));
        assert!(!types.equals(p1, p3));
    }

    #[test]
    fn test_array_equality() {
        let mut types = TypeRegistry::new();
        let a1 = types.array(types.int32(), 4);
        let a2 = types.array(types.int32(), 4);
        let a3 = types.array(types.int32(), 5);

        assert!(types.equals(a1, a2));
        assert!(!types.equals(a1, a3));
        assert_eq!(types.array_length(a1), Some(4));
        assert_eq!(types.array_element(a1), Some(types.int32()));
    }

    #[test]
    fn test_function_equality() {
        let mut types = TypeRegistry::new();
        let i32_ = types.int32();
        let f1 = types.function(i32_, vec![i32_], false);
        let f2 = types.function(i32_, vec![i32_], false);
        let f3 = types.function(i32_, vec![i32_, i32_], false);
        let f4 = types.function(i32_, vec![i32_], true);

        assert!(types.equals(f1, f2));
        assert!(!types.equals(f1, f3));
        assert!(!types.equals(f1, f4));
    }

    #[test]
    fn test_struct_equality_is_nominal() {
        let mut types = TypeRegistry::new();
        let s1 = types.struct_incomplete("tag", 1);
        let s2 = types.struct_incomplete("tag", 1);

        assert!(types.equals(s1, s1));
        assert!(!types.equals(s1, s2));
    }

    #[test]
    fn test_struct_completion() {
        let mut types = TypeRegistry::new();
        let s = types.struct_incomplete("point", 1);
        assert!(types.is_incomplete(s));
        assert!(types.struct_members(s).is_none());

        let i32_ = types.int32();
        types.struct_complete(
            s,
            vec![
                StructMember {
                    name: "x".into(),
                    ty: i32_,
                    line: 1,
                },
                StructMember {
                    name: "y".into(),
                    ty: i32_,
                    line: 1,
                },
            ],
        );

        assert!(!types.is_incomplete(s));
        assert_eq!(types.struct_members(s).unwrap().len(), 2);

        let (index, member) = types.struct_find_member(s, "y").unwrap();
        assert_eq!(index, 1);
        assert_eq!(member.name, "y");
        assert!(types.struct_find_member(s, "z").is_none());
    }

    #[test]
    #[should_panic]
    fn test_double_completion_panics() {
        let mut types = TypeRegistry::new();
        let s = types.struct_incomplete("t", 1);
        let member = StructMember {
            name: "x".into(),
            ty: types.int32(),
            line: 1,
        };
        types.struct_complete(s, vec![member.clone()]);
        types.struct_complete(s, vec![member]);
    }

    #[test]
    fn test_incomplete_kinds() {
        let mut types = TypeRegistry::new();
        assert!(types.is_incomplete(types.void()));
        assert!(!types.is_incomplete(types.int32()));

        let f = types.function(types.void(), vec![], false);
        assert!(types.is_incomplete(f));

        let p = types.pointer(types.void());
        assert!(!types.is_incomplete(p));
        assert!(types.is_void_pointer(p));
        assert!(types.is_incomplete_pointer(p));
    }
}
