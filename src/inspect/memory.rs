//! Bounded reads of target memory.
//!
//! [`MemoryView`] is the read primitive the offline backend is built on.
//! Implementations must enforce bounds and report unmapped addresses as
//! errors rather than panicking.

use serde::{Deserialize, Serialize};

/// Errors that can occur during memory reads.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("cannot access memory at address {0:#x}")]
    Unmapped(u64),
    #[error("address out of range: {0}")]
    OutOfRange(String),
    #[error("unsupported read width: {0}")]
    Width(usize),
    #[error("overlapping region at {0:#x}")]
    Overlap(u64),
}

/// Byte order of the inspected target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    /// Encode the low `width` bytes of `value`.
    pub fn encode(self, value: u64, width: usize) -> Vec<u8> {
        match self {
            Endianness::Little => value.to_le_bytes()[..width].to_vec(),
            Endianness::Big => value.to_be_bytes()[8 - width..].to_vec(),
        }
    }

    fn decode(self, bytes: &[u8]) -> u64 {
        let mut buf = [0u8; 8];
        match self {
            Endianness::Little => {
                buf[..bytes.len()].copy_from_slice(bytes);
                u64::from_le_bytes(buf)
            }
            Endianness::Big => {
                buf[8 - bytes.len()..].copy_from_slice(bytes);
                u64::from_be_bytes(buf)
            }
        }
    }
}

/// Bounded memory reads by address.
pub trait MemoryView {
    /// Read `len` bytes starting at `addr`.
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, MemoryError>;

    /// Read an unsigned integer of `width` bytes (1, 2, 4 or 8).
    fn read_uint(&self, addr: u64, width: usize, endian: Endianness) -> Result<u64, MemoryError> {
        if !matches!(width, 1 | 2 | 4 | 8) {
            return Err(MemoryError::Width(width));
        }
        let b = self.read_bytes(addr, width)?;
        Ok(endian.decode(&b))
    }

    /// Read a NUL-terminated byte string of at most `max` bytes.
    fn read_c_string(&self, addr: u64, max: usize) -> Result<Vec<u8>, MemoryError> {
        let mut out = Vec::new();
        for i in 0..max as u64 {
            let b = self.read_bytes(addr.wrapping_add(i), 1)?[0];
            if b == 0 {
                break;
            }
            out.push(b);
        }
        Ok(out)
    }
}

/// A mapped span of target memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub base: u64,
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

impl Region {
    pub fn new(base: u64, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    fn end(&self) -> u64 {
        self.base.saturating_add(self.bytes.len() as u64)
    }

    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }
}

/// Sparse memory made of non-overlapping regions.
#[derive(Debug, Clone, Default)]
pub struct RegionMemory {
    regions: Vec<Region>,
}

impl RegionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a region. Regions are kept sorted by base address.
    pub fn map(&mut self, region: Region) -> Result<(), MemoryError> {
        if self
            .regions
            .iter()
            .any(|r| region.base < r.end() && r.base < region.end())
        {
            return Err(MemoryError::Overlap(region.base));
        }
        let pos = self.regions.partition_point(|r| r.base < region.base);
        self.regions.insert(pos, region);
        Ok(())
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    fn region_for(&self, addr: u64) -> Option<&Region> {
        let pos = self.regions.partition_point(|r| r.base <= addr);
        pos.checked_sub(1)
            .map(|i| &self.regions[i])
            .filter(|r| r.contains(addr))
    }
}

impl MemoryView for RegionMemory {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let region = self.region_for(addr).ok_or(MemoryError::Unmapped(addr))?;
        let start = (addr - region.base) as usize;
        let end = start.saturating_add(len);
        if end > region.bytes.len() {
            return Err(MemoryError::OutOfRange(format!(
                "{:#x}..{:#x} (len={}) crosses end of region at {:#x}",
                addr,
                addr.saturating_add(len as u64),
                len,
                region.end()
            )));
        }
        Ok(region.bytes[start..end].to_vec())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T: AsRef<[u8]>>(bytes: T, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s.trim()).map_err(serde::de::Error::custom)
    }
}
