//! Mapped memory backing store and access views
//!
//! [`UnitMemory`] owns one zero-initialized buffer per declared mapping.
//! Handlers never touch it directly: the dispatcher mints memory
//! capabilities over it each invocation, and those resolve to [`ReadView`]
//! and [`WriteView`] accessors with hard bounds checks. Every access
//! beyond a mapping's declared length is a reported fault, never a clamp.

use crate::caps::{MemCap, MemoryCaps, ReadMemCap, WriteMemCap};
use crate::error::MemoryFault;
use crate::ledger::CapLedger;
use crate::profile::UnitProfile;

#[derive(Debug)]
struct MappedBuffer {
    name: String,
    writable: bool,
    data: Vec<u8>,
}

/// The backing store for a unit's declared memory mappings.
#[derive(Debug)]
pub struct UnitMemory {
    buffers: Vec<MappedBuffer>,
}

impl UnitMemory {
    /// Allocates a zeroed buffer for every mapping in the profile.
    pub fn from_profile(profile: &UnitProfile) -> Self {
        let buffers = profile
            .mappings()
            .iter()
            .map(|m| MappedBuffer {
                name: m.name.clone(),
                writable: m.writable,
                data: vec![0; m.length as usize],
            })
            .collect();
        Self { buffers }
    }

    /// Seeds a mapping's contents, for wiring up test scenarios.
    pub fn load(&mut self, mapping: &str, offset: u64, bytes: &[u8]) -> Result<(), MemoryFault> {
        let buffer = self.buffer_mut(mapping)?;
        let range = checked_range(&buffer.name, offset, bytes.len() as u64, buffer.data.len())?;
        buffer.data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Reads a mapping's current contents without a capability. Intended
    /// for assertions outside the dispatch loop.
    pub fn inspect(&self, mapping: &str) -> Result<&[u8], MemoryFault> {
        self.buffers
            .iter()
            .find(|b| b.name == mapping)
            .map(|b| b.data.as_slice())
            .ok_or_else(|| MemoryFault::UnknownMapping {
                mapping: mapping.to_string(),
            })
    }

    /// Mints one capability per mapping, recording each in the ledger.
    pub(crate) fn mint_caps<'a>(&'a mut self, ledger: &mut CapLedger) -> MemoryCaps<'a> {
        let caps = self
            .buffers
            .iter_mut()
            .map(|buffer| {
                let mint = ledger.mint(format!("memory:{}", buffer.name));
                if buffer.writable {
                    MemCap::Write(WriteMemCap::new(&buffer.name, &mut buffer.data, mint))
                } else {
                    MemCap::Read(ReadMemCap::new(&buffer.name, &buffer.data, mint))
                }
            })
            .collect();
        MemoryCaps::new(caps)
    }

    fn buffer_mut(&mut self, mapping: &str) -> Result<&mut MappedBuffer, MemoryFault> {
        self.buffers
            .iter_mut()
            .find(|b| b.name == mapping)
            .ok_or_else(|| MemoryFault::UnknownMapping {
                mapping: mapping.to_string(),
            })
    }
}

/// A bounds-checked read accessor over one mapping.
///
/// Read views are freely copyable; taking one does not discharge the
/// capability it came from.
#[derive(Debug, Clone, Copy)]
pub struct ReadView<'a> {
    mapping: &'a str,
    data: &'a [u8],
}

impl<'a> ReadView<'a> {
    pub(crate) fn new(mapping: &'a str, data: &'a [u8]) -> Self {
        Self { mapping, data }
    }

    /// The mapping this view covers.
    pub fn mapping(&self) -> &'a str {
        self.mapping
    }

    /// Declared length of the mapping in bytes.
    pub fn length(&self) -> u64 {
        self.data.len() as u64
    }

    /// Reads `len` bytes starting at `offset`.
    pub fn read(&self, offset: u64, len: u64) -> Result<&'a [u8], MemoryFault> {
        let range = checked_range(self.mapping, offset, len, self.data.len())?;
        Ok(&self.data[range])
    }
}

/// A bounds-checked read-write accessor over one mapping.
///
/// Obtained exactly once per invocation by consuming the mapping's write
/// capability.
#[derive(Debug)]
pub struct WriteView<'a> {
    mapping: &'a str,
    data: &'a mut [u8],
}

impl<'a> WriteView<'a> {
    pub(crate) fn new(mapping: &'a str, data: &'a mut [u8]) -> Self {
        Self { mapping, data }
    }

    /// The mapping this view covers.
    pub fn mapping(&self) -> &'a str {
        self.mapping
    }

    /// Declared length of the mapping in bytes.
    pub fn length(&self) -> u64 {
        self.data.len() as u64
    }

    /// Reads `len` bytes starting at `offset`.
    pub fn read(&self, offset: u64, len: u64) -> Result<&[u8], MemoryFault> {
        let range = checked_range(self.mapping, offset, len, self.data.len())?;
        Ok(&self.data[range])
    }

    /// Writes `bytes` starting at `offset`.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<(), MemoryFault> {
        let range = checked_range(self.mapping, offset, bytes.len() as u64, self.data.len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }
}

fn checked_range(
    mapping: &str,
    offset: u64,
    len: u64,
    length: usize,
) -> Result<std::ops::Range<usize>, MemoryFault> {
    let end = offset.checked_add(len).filter(|&end| end <= length as u64);
    match end {
        Some(end) => Ok(offset as usize..end as usize),
        None => Err(MemoryFault::OutOfBounds {
            mapping: mapping.to_string(),
            offset,
            len,
            length: length as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> UnitMemory {
        let profile = UnitProfile::new("auth")
            .with_write_mapping("mailbox", 16)
            .with_read_mapping("config", 8);
        UnitMemory::from_profile(&profile)
    }

    #[test]
    fn test_buffers_start_zeroed() {
        let memory = memory();
        assert_eq!(memory.inspect("mailbox").unwrap(), &[0u8; 16]);
        assert_eq!(memory.inspect("config").unwrap(), &[0u8; 8]);
    }

    #[test]
    fn test_load_then_inspect() {
        let mut memory = memory();
        memory.load("mailbox", 4, &[1, 2, 3]).unwrap();
        assert_eq!(&memory.inspect("mailbox").unwrap()[4..7], &[1, 2, 3]);
    }

    #[test]
    fn test_load_out_of_bounds() {
        let mut memory = memory();
        let err = memory.load("config", 6, &[0; 4]).unwrap_err();
        assert_eq!(
            err,
            MemoryFault::OutOfBounds {
                mapping: "config".to_string(),
                offset: 6,
                len: 4,
                length: 8,
            }
        );
    }

    #[test]
    fn test_unknown_mapping() {
        let memory = memory();
        assert_eq!(
            memory.inspect("missing").unwrap_err(),
            MemoryFault::UnknownMapping {
                mapping: "missing".to_string(),
            }
        );
    }

    #[test]
    fn test_read_view_bounds() {
        let data = [9u8, 8, 7, 6];
        let view = ReadView::new("config", &data);
        assert_eq!(view.read(1, 2).unwrap(), &[8, 7]);
        assert!(view.read(3, 2).is_err());
        assert_eq!(view.read(4, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_read_view_offset_overflow() {
        let data = [0u8; 4];
        let view = ReadView::new("config", &data);
        assert!(view.read(u64::MAX, 1).is_err());
    }

    #[test]
    fn test_write_view_round_trip() {
        let mut data = [0u8; 8];
        let mut view = WriteView::new("mailbox", &mut data);
        view.write(2, &[0xaa, 0xbb]).unwrap();
        assert_eq!(view.read(2, 2).unwrap(), &[0xaa, 0xbb]);
        assert!(view.write(7, &[0, 0]).is_err());
    }
}
