//! Inspection backend contract.
//!
//! Views never touch target memory directly. Everything they need (symbol
//! lookup, field projection, pointer arithmetic, casts, textual rendering)
//! goes through the [`Inspector`] trait, which a debugger integration or the
//! offline [`snapshot::Snapshot`] backend implements.

pub mod memory;
pub mod snapshot;
pub mod stdcxx;
pub mod types;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Broad classification of a type, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCode {
    Void,
    Int,
    Char,
    Bool,
    Float,
    Enum,
    Pointer,
    Array,
    Struct,
    Union,
    Typedef,
}

/// Handle to a named type in the inspected program.
///
/// Pointer types are spelled the way a C++ debugger prints them
/// (`int *`, `char **`), so they can be derived without consulting the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    name: String,
}

impl Type {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type `T *` for this type `T`.
    pub fn pointer(&self) -> Type {
        Type::new(types::pointer_name(&self.name))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where a value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// An object in target memory at this address
    Address(u64),
    /// A computed scalar (pointer arithmetic result, address-of, ...)
    Scalar(u64),
}

/// Opaque handle to a typed region of target memory.
///
/// Views read through values but never mutate them. Values are cheap to
/// clone and are discarded when the command that produced them finishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    ty: Type,
    location: Location,
}

impl Value {
    pub fn new(ty: Type, location: Location) -> Self {
        Self { ty, location }
    }

    pub fn at(ty: Type, address: u64) -> Self {
        Self::new(ty, Location::Address(address))
    }

    pub fn scalar(ty: Type, bits: u64) -> Self {
        Self::new(ty, Location::Scalar(bits))
    }

    /// Declared (static) type of the value.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Target address of the object, if it lives in memory.
    pub fn address(&self) -> Option<u64> {
        match self.location {
            Location::Address(a) => Some(a),
            Location::Scalar(_) => None,
        }
    }
}

/// Capabilities consumed from an inspection backend.
///
/// All operations are blocking reads against a stationary target. Failures
/// are reported as the backend sees them; views propagate them unchanged.
pub trait Inspector {
    /// Resolve a symbol in the current scope. Missing symbols are
    /// [`crate::error::ViewError::Symbol`].
    fn lookup_symbol(&self, name: &str) -> Result<Value>;

    fn lookup_type(&self, name: &str) -> Result<Type>;

    /// Code of the type itself; typedefs report [`TypeCode::Typedef`].
    fn type_code(&self, ty: &Type) -> Result<TypeCode>;

    fn strip_typedefs(&self, ty: &Type) -> Result<Type>;

    /// The `n`th template argument of a (possibly typedef'd) class type.
    fn template_argument(&self, ty: &Type, n: usize) -> Result<Type>;

    fn sizeof(&self, ty: &Type) -> Result<u64>;

    /// Project a struct or union member by name.
    fn field(&self, value: &Value, name: &str) -> Result<Value>;

    /// Pointer arithmetic in element units.
    fn add(&self, pointer: &Value, offset: i64) -> Result<Value>;

    /// `lhs - rhs` in element units of `lhs`'s pointee.
    fn pointer_diff(&self, lhs: &Value, rhs: &Value) -> Result<i64>;

    fn dereference(&self, pointer: &Value) -> Result<Value>;

    fn address_of(&self, value: &Value) -> Result<Value>;

    /// Reinterpret a value as another type without conversion.
    fn cast(&self, value: &Value, ty: &Type) -> Result<Value>;

    fn to_int(&self, value: &Value) -> Result<i128>;

    /// Raw address held by a pointer value.
    fn pointer_value(&self, pointer: &Value) -> Result<u64> {
        Ok(self.to_int(pointer)? as u64)
    }

    /// The backend's own textual rendering of a value.
    fn to_text(&self, value: &Value) -> Result<String>;
}
