//! Type table for the offline backend.
//!
//! Describes the types of the inspected program: primitives, pointers,
//! arrays, structs and unions with byte offsets, and typedefs. Pointer types
//! are not stored; any name ending in `*` is resolved structurally.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::TypeCode;
use crate::error::BackendError;

/// Typedef chains longer than this are treated as cycles.
const MAX_TYPEDEF_DEPTH: usize = 32;

/// A field in a struct or union.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Name of the field's type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Offset from the start of the struct/union in bytes
    #[serde(default)]
    pub offset: u64,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, offset: u64) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            offset,
        }
    }
}

/// A named enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

/// Kind-specific data of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Void,
    Int {
        signed: bool,
    },
    Char,
    Bool,
    Float,
    Enum {
        #[serde(default)]
        members: Vec<EnumMember>,
    },
    Pointer {
        target: String,
    },
    Array {
        element: String,
        count: u64,
    },
    Struct {
        fields: Vec<Field>,
        #[serde(default)]
        template_args: Vec<String>,
    },
    Union {
        fields: Vec<Field>,
    },
    Typedef {
        target: String,
    },
}

impl TypeKind {
    pub fn code(&self) -> TypeCode {
        match self {
            TypeKind::Void => TypeCode::Void,
            TypeKind::Int { .. } => TypeCode::Int,
            TypeKind::Char => TypeCode::Char,
            TypeKind::Bool => TypeCode::Bool,
            TypeKind::Float => TypeCode::Float,
            TypeKind::Enum { .. } => TypeCode::Enum,
            TypeKind::Pointer { .. } => TypeCode::Pointer,
            TypeKind::Array { .. } => TypeCode::Array,
            TypeKind::Struct { .. } => TypeCode::Struct,
            TypeKind::Union { .. } => TypeCode::Union,
            TypeKind::Typedef { .. } => TypeCode::Typedef,
        }
    }
}

/// A type in the inspected program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    /// Name as the debugger prints it, template arguments included
    pub name: String,
    /// Size in bytes; ignored for pointers, arrays and typedefs
    #[serde(default)]
    pub size: u64,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl DataType {
    pub fn new(name: impl Into<String>, size: u64, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            size,
            kind,
        }
    }

    pub fn int(name: impl Into<String>, size: u64, signed: bool) -> Self {
        Self::new(name, size, TypeKind::Int { signed })
    }

    pub fn typedef(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            0,
            TypeKind::Typedef {
                target: target.into(),
            },
        )
    }

    pub fn structure(name: impl Into<String>, size: u64, fields: Vec<Field>) -> Self {
        Self::new(
            name,
            size,
            TypeKind::Struct {
                fields,
                template_args: Vec::new(),
            },
        )
    }

    /// A class template instantiation.
    pub fn template(
        name: impl Into<String>,
        size: u64,
        fields: Vec<Field>,
        template_args: Vec<String>,
    ) -> Self {
        Self::new(
            name,
            size,
            TypeKind::Struct {
                fields,
                template_args,
            },
        )
    }

    pub fn array(name: impl Into<String>, element: impl Into<String>, count: u64) -> Self {
        Self::new(
            name,
            0,
            TypeKind::Array {
                element: element.into(),
                count,
            },
        )
    }

    pub fn fields(&self) -> Option<&[Field]> {
        match &self.kind {
            TypeKind::Struct { fields, .. } | TypeKind::Union { fields } => Some(fields),
            _ => None,
        }
    }
}

/// The pointee name of a pointer type name, if it is one.
pub fn pointee_name(name: &str) -> Option<&str> {
    name.trim_end()
        .strip_suffix('*')
        .map(str::trim_end)
        .filter(|s| !s.is_empty())
}

/// The pointer type name for `name`.
pub fn pointer_name(name: &str) -> String {
    if name.ends_with('*') {
        format!("{}*", name)
    } else {
        format!("{} *", name)
    }
}

/// All types known for one inspected program.
#[derive(Debug, Clone)]
pub struct TypeTable {
    pointer_size: u64,
    types: HashMap<String, DataType>,
}

impl TypeTable {
    pub fn new(pointer_size: u64) -> Self {
        Self {
            pointer_size,
            types: HashMap::new(),
        }
    }

    /// A table pre-populated with the fundamental C++ types of an LP64 or
    /// ILP32 target.
    pub fn with_builtins(pointer_size: u64) -> Self {
        let mut table = Self::new(pointer_size);
        let long = pointer_size;
        for ty in [
            DataType::new("void", 1, TypeKind::Void),
            DataType::new("bool", 1, TypeKind::Bool),
            DataType::new("char", 1, TypeKind::Char),
            DataType::int("signed char", 1, true),
            DataType::int("unsigned char", 1, false),
            DataType::int("short", 2, true),
            DataType::int("unsigned short", 2, false),
            DataType::int("int", 4, true),
            DataType::int("unsigned int", 4, false),
            DataType::int("long", long, true),
            DataType::int("unsigned long", long, false),
            DataType::int("long long", 8, true),
            DataType::int("unsigned long long", 8, false),
            DataType::typedef("size_t", "unsigned long"),
            DataType::new("float", 4, TypeKind::Float),
            DataType::new("double", 8, TypeKind::Float),
        ] {
            table.insert(ty);
        }
        table
    }

    pub fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    /// Add or replace a type definition.
    pub fn insert(&mut self, ty: DataType) {
        self.types.insert(ty.name.clone(), ty);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataType> {
        self.types.values()
    }

    /// Look up a type by name, synthesizing pointer types on demand.
    pub fn get(&self, name: &str) -> Result<Cow<'_, DataType>, BackendError> {
        if let Some(target) = pointee_name(name) {
            return Ok(Cow::Owned(DataType::new(
                name,
                self.pointer_size,
                TypeKind::Pointer {
                    target: target.to_string(),
                },
            )));
        }
        self.types
            .get(name.trim())
            .map(Cow::Borrowed)
            .ok_or_else(|| BackendError::UnknownType(name.to_string()))
    }

    /// Look up a type and follow typedefs to the underlying definition.
    pub fn resolve(&self, name: &str) -> Result<Cow<'_, DataType>, BackendError> {
        let mut ty = self.get(name)?;
        for _ in 0..MAX_TYPEDEF_DEPTH {
            let target = match &ty.kind {
                TypeKind::Typedef { target } => target.clone(),
                _ => return Ok(ty),
            };
            ty = self.get(&target)?;
        }
        Err(BackendError::UnknownType(format!("{} (typedef cycle)", name)))
    }

    pub fn sizeof(&self, name: &str) -> Result<u64, BackendError> {
        let ty = self.resolve(name)?;
        match &ty.kind {
            TypeKind::Pointer { .. } => Ok(self.pointer_size),
            TypeKind::Array { element, count } => Ok(self.sizeof(element)?.saturating_mul(*count)),
            _ => Ok(ty.size),
        }
    }
}
