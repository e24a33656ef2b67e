//! Offline inspection backend.
//!
//! A [`Snapshot`] captures everything a view needs from a paused process:
//! the type table, symbol addresses and the mapped memory regions. It can be
//! saved as JSON, loaded back, or assembled programmatically with
//! [`SnapshotBuilder`].

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::memory::{Endianness, MemoryError, MemoryView, Region, RegionMemory};
use super::types::{DataType, TypeKind, TypeTable};
use super::{Inspector, Location, Type, TypeCode, Value};
use crate::error::{BackendError, Result, ViewError};

/// Longest C string rendered after a `char *`.
const MAX_C_STRING: usize = 200;
/// Nesting depth beyond which aggregates render as `{...}`.
const MAX_RENDER_DEPTH: usize = 8;

/// A symbol visible in the inspected scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub address: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default = "default_pointer_size")]
    pointer_size: u64,
    #[serde(default)]
    endianness: Endianness,
    #[serde(default)]
    types: Vec<DataType>,
    #[serde(default)]
    symbols: Vec<SymbolEntry>,
    #[serde(default)]
    regions: Vec<Region>,
}

fn default_pointer_size() -> u64 {
    8
}

/// Errors loading or saving a snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

/// Frozen image of a paused process.
#[derive(Debug, Clone)]
pub struct Snapshot {
    endianness: Endianness,
    types: TypeTable,
    symbols: HashMap<String, SymbolEntry>,
    memory: RegionMemory,
}

impl Snapshot {
    pub fn from_json(json: &str) -> std::result::Result<Self, SnapshotError> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> std::result::Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn from_file(file: SnapshotFile) -> std::result::Result<Self, SnapshotError> {
        if !matches!(file.pointer_size, 4 | 8) {
            return Err(SnapshotError::Invalid(format!(
                "pointer size must be 4 or 8, got {}",
                file.pointer_size
            )));
        }
        let mut types = TypeTable::with_builtins(file.pointer_size);
        for ty in file.types {
            types.insert(ty);
        }
        let mut memory = RegionMemory::new();
        for region in file.regions {
            memory
                .map(region)
                .map_err(|e| SnapshotError::Invalid(e.to_string()))?;
        }
        let symbols = file
            .symbols
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect::<HashMap<_, _>>();
        debug!(
            types = types.len(),
            symbols = symbols.len(),
            regions = memory.regions().len(),
            "Loaded snapshot"
        );
        Ok(Self {
            endianness: file.endianness,
            types,
            symbols,
            memory,
        })
    }

    pub fn to_json(&self) -> std::result::Result<String, SnapshotError> {
        let mut symbols: Vec<SymbolEntry> = self.symbols.values().cloned().collect();
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        let mut types: Vec<DataType> = self.types.iter().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        let file = SnapshotFile {
            pointer_size: self.types.pointer_size(),
            endianness: self.endianness,
            types,
            symbols,
            regions: self.memory.regions().to_vec(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn symbol_names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    fn resolved(&self, ty: &Type) -> Result<DataType> {
        Ok(self.types.resolve(ty.name())?.into_owned())
    }

    /// Raw bits of a scalar of `width` bytes.
    fn bits(&self, value: &Value, width: u64) -> Result<u64> {
        match value.location() {
            Location::Scalar(bits) => Ok(bits),
            Location::Address(addr) => Ok(self.memory.read_uint(
                addr,
                width as usize,
                self.endianness,
            )?),
        }
    }

    fn pointee(&self, pointer: &Value) -> Result<String> {
        match self.resolved(pointer.ty())?.kind {
            TypeKind::Pointer { target } => Ok(target),
            _ => Err(BackendError::NotAPointer(pointer.ty().name().to_string()).into()),
        }
    }

    /// Stride of pointer arithmetic; `void *` steps by one byte.
    fn stride(&self, target: &str) -> Result<u64> {
        let ty = self.types.resolve(target)?;
        Ok(match ty.kind {
            TypeKind::Void => 1,
            _ => self.types.sizeof(target)?.max(1),
        })
    }

    fn is_char(&self, name: &str) -> bool {
        self.types
            .resolve(name)
            .map(|t| t.kind == TypeKind::Char)
            .unwrap_or(false)
    }

    fn render(&self, value: &Value, depth: usize) -> Result<String> {
        let ty = self.resolved(value.ty())?;
        match &ty.kind {
            TypeKind::Void => Ok("void".to_string()),
            TypeKind::Int { .. } => Ok(self.to_int(value)?.to_string()),
            TypeKind::Bool => Ok((self.to_int(value)? != 0).to_string()),
            TypeKind::Char => {
                let c = self.to_int(value)?;
                let escaped: String = (c as u8).escape_ascii().to_string();
                Ok(format!("{} '{}'", c, escaped))
            }
            TypeKind::Float => {
                let bits = self.bits(value, ty.size)?;
                Ok(match ty.size {
                    4 => f32::from_bits(bits as u32).to_string(),
                    _ => f64::from_bits(bits).to_string(),
                })
            }
            TypeKind::Enum { members } => {
                let n = self.to_int(value)?;
                Ok(members
                    .iter()
                    .find(|m| i128::from(m.value) == n)
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| n.to_string()))
            }
            TypeKind::Pointer { target } => {
                let p = self.pointer_value(value)?;
                if p != 0 && self.is_char(target) {
                    let s = self.memory.read_c_string(p, MAX_C_STRING)?;
                    Ok(format!("{:#x} \"{}\"", p, s.escape_ascii()))
                } else {
                    Ok(format!("{:#x}", p))
                }
            }
            TypeKind::Array { element, count } => {
                let addr = value
                    .address()
                    .ok_or_else(|| BackendError::NotAnLvalue(value.ty().name().to_string()))?;
                if self.is_char(element) {
                    let s = self.memory.read_c_string(addr, *count as usize)?;
                    return Ok(format!("\"{}\"", s.escape_ascii()));
                }
                if depth >= MAX_RENDER_DEPTH {
                    return Ok("{...}".to_string());
                }
                let stride = self.types.sizeof(element)?;
                let items = (0..*count)
                    .map(|i| {
                        let item = Value::at(Type::new(element.clone()), addr + i * stride);
                        self.render(&item, depth + 1)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{{{}}}", items.join(", ")))
            }
            TypeKind::Struct { fields, .. } | TypeKind::Union { fields } => {
                if depth >= MAX_RENDER_DEPTH {
                    return Ok("{...}".to_string());
                }
                let parts = fields
                    .iter()
                    .map(|f| {
                        let member = self.field(value, &f.name)?;
                        Ok(format!("{} = {}", f.name, self.render(&member, depth + 1)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{{{}}}", parts.join(", ")))
            }
            TypeKind::Typedef { target } => Err(BackendError::UnknownType(target.clone()).into()),
        }
    }
}

impl Inspector for Snapshot {
    fn lookup_symbol(&self, name: &str) -> Result<Value> {
        let sym = self
            .symbols
            .get(name)
            .ok_or_else(|| ViewError::Symbol(name.to_string()))?;
        Ok(Value::at(Type::new(sym.type_name.clone()), sym.address))
    }

    fn lookup_type(&self, name: &str) -> Result<Type> {
        let ty = self.types.get(name)?;
        Ok(Type::new(ty.name.clone()))
    }

    fn type_code(&self, ty: &Type) -> Result<TypeCode> {
        Ok(self.types.get(ty.name())?.kind.code())
    }

    fn strip_typedefs(&self, ty: &Type) -> Result<Type> {
        Ok(Type::new(self.types.resolve(ty.name())?.name.clone()))
    }

    fn template_argument(&self, ty: &Type, n: usize) -> Result<Type> {
        match self.resolved(ty)?.kind {
            TypeKind::Struct { template_args, .. } => template_args
                .get(n)
                .map(|a| Type::new(a.clone()))
                .ok_or_else(|| BackendError::NoTemplateArgument(ty.name().to_string(), n).into()),
            _ => Err(BackendError::NoTemplateArgument(ty.name().to_string(), n).into()),
        }
    }

    fn sizeof(&self, ty: &Type) -> Result<u64> {
        Ok(self.types.sizeof(ty.name())?)
    }

    fn field(&self, value: &Value, name: &str) -> Result<Value> {
        let ty = self.resolved(value.ty())?;
        let field = ty
            .fields()
            .and_then(|fields| fields.iter().find(|f| f.name == name))
            .ok_or_else(|| BackendError::NoSuchField {
                ty: value.ty().name().to_string(),
                field: name.to_string(),
            })?;
        let base = value
            .address()
            .ok_or_else(|| BackendError::NotAnLvalue(value.ty().name().to_string()))?;
        Ok(Value::at(
            Type::new(field.type_name.clone()),
            base.wrapping_add(field.offset),
        ))
    }

    fn add(&self, pointer: &Value, offset: i64) -> Result<Value> {
        let stride = self.stride(&self.pointee(pointer)?)?;
        let bits = self
            .pointer_value(pointer)?
            .wrapping_add((offset as u64).wrapping_mul(stride));
        Ok(Value::scalar(pointer.ty().clone(), bits))
    }

    fn pointer_diff(&self, lhs: &Value, rhs: &Value) -> Result<i64> {
        let stride = self.stride(&self.pointee(lhs)?)?;
        self.pointee(rhs)?;
        let delta = self.pointer_value(lhs)?.wrapping_sub(self.pointer_value(rhs)?) as i64;
        Ok(delta / stride as i64)
    }

    fn dereference(&self, pointer: &Value) -> Result<Value> {
        let target = self.pointee(pointer)?;
        Ok(Value::at(Type::new(target), self.pointer_value(pointer)?))
    }

    fn address_of(&self, value: &Value) -> Result<Value> {
        let addr = value
            .address()
            .ok_or_else(|| BackendError::NotAnLvalue(value.ty().name().to_string()))?;
        Ok(Value::scalar(value.ty().pointer(), addr))
    }

    fn cast(&self, value: &Value, ty: &Type) -> Result<Value> {
        let target = self.resolved(ty)?;
        let aggregate = matches!(
            target.kind,
            TypeKind::Struct { .. } | TypeKind::Union { .. } | TypeKind::Array { .. }
        );
        if aggregate && value.address().is_none() {
            return Err(BackendError::InvalidCast {
                from: value.ty().name().to_string(),
                to: ty.name().to_string(),
            }
            .into());
        }
        Ok(Value::new(ty.clone(), value.location()))
    }

    fn to_int(&self, value: &Value) -> Result<i128> {
        let ty = self.resolved(value.ty())?;
        let signed = match ty.kind {
            TypeKind::Int { signed } => signed,
            TypeKind::Char | TypeKind::Enum { .. } => true,
            TypeKind::Bool | TypeKind::Pointer { .. } => false,
            _ => return Err(BackendError::NotAnInteger(value.ty().name().to_string()).into()),
        };
        let width = self.types.sizeof(value.ty().name())?;
        let bits = self.bits(value, width)?;
        if !signed || width >= 8 {
            return Ok(if signed {
                i128::from(bits as i64)
            } else {
                i128::from(bits)
            });
        }
        let shift = 64 - width * 8;
        Ok(i128::from(((bits << shift) as i64) >> shift))
    }

    fn pointer_value(&self, pointer: &Value) -> Result<u64> {
        self.bits(pointer, self.types.pointer_size())
    }

    fn to_text(&self, value: &Value) -> Result<String> {
        self.render(value, 0)
    }
}

/// Assembles a snapshot from type definitions, symbols and a bump-allocated
/// heap.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    endianness: Endianness,
    types: TypeTable,
    symbols: Vec<SymbolEntry>,
    base: u64,
    heap: Vec<u8>,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new(8, Endianness::Little)
    }
}

impl SnapshotBuilder {
    /// Start address of the synthesized heap.
    pub const DEFAULT_BASE: u64 = 0x60_2000;

    pub fn new(pointer_size: u64, endianness: Endianness) -> Self {
        Self {
            endianness,
            types: TypeTable::with_builtins(pointer_size),
            symbols: Vec::new(),
            base: Self::DEFAULT_BASE,
            heap: Vec::new(),
        }
    }

    pub fn pointer_size(&self) -> u64 {
        self.types.pointer_size()
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn sizeof(&self, type_name: &str) -> Result<u64> {
        Ok(self.types.sizeof(type_name)?)
    }

    pub fn define(&mut self, ty: DataType) -> &mut Self {
        self.types.insert(ty);
        self
    }

    /// Copy `bytes` into the heap at the next `align`-aligned address.
    pub fn alloc(&mut self, bytes: &[u8], align: u64) -> u64 {
        let align = align.max(1);
        let offset = (self.heap.len() as u64).div_ceil(align) * align;
        self.heap.resize(offset as usize, 0);
        self.heap.extend_from_slice(bytes);
        self.base + offset
    }

    pub fn alloc_zeroed(&mut self, len: usize, align: u64) -> u64 {
        self.alloc(&vec![0; len], align)
    }

    /// Overwrite previously allocated bytes.
    pub fn write(&mut self, addr: u64, bytes: &[u8]) -> Result<()> {
        let start = addr
            .checked_sub(self.base)
            .ok_or(MemoryError::Unmapped(addr))? as usize;
        let end = start + bytes.len();
        if end > self.heap.len() {
            return Err(MemoryError::Unmapped(addr).into());
        }
        self.heap[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Encode an integer of `width` bytes in target byte order.
    pub fn encode(&self, value: u64, width: u64) -> Vec<u8> {
        self.endianness.encode(value, width as usize)
    }

    /// Encode a pointer-sized word.
    pub fn word(&self, value: u64) -> Vec<u8> {
        self.encode(value, self.pointer_size())
    }

    pub fn symbol(&mut self, name: &str, type_name: &str, address: u64) -> &mut Self {
        self.symbols.push(SymbolEntry {
            name: name.to_string(),
            type_name: type_name.to_string(),
            address,
        });
        self
    }

    pub fn build(self) -> Snapshot {
        let mut memory = RegionMemory::new();
        if !self.heap.is_empty() {
            // A single fresh region cannot overlap anything.
            let _ = memory.map(Region::new(self.base, self.heap));
        }
        Snapshot {
            endianness: self.endianness,
            types: self.types,
            symbols: self
                .symbols
                .into_iter()
                .map(|s| (s.name.clone(), s))
                .collect(),
            memory,
        }
    }
}
