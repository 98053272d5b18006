//! Linear memory
//!
//! A byte-addressed buffer with a page-granular size. Every access is bounds
//! checked against the current length; an access that does not fit traps with
//! [`RuntimeError::MemoryOutOfBounds`] and never extends the buffer. Only
//! [`Memory::grow`] changes the size.

use byteorder::{ByteOrder, LittleEndian};

use super::RuntimeError;

/// Page size in bytes (64 KiB)
pub const PAGE_SIZE: usize = 65536;

/// Largest page count addressable with 32-bit addresses
pub const MAX_PAGES: u32 = 65536;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    data: Vec<u8>,
    max_pages: Option<u32>,
}

impl Memory {
    /// Zeroed memory of `initial_pages` pages
    pub fn new(initial_pages: u32, max_pages: Option<u32>) -> Result<Self, RuntimeError> {
        if initial_pages > MAX_PAGES {
            return Err(RuntimeError::MemoryError(format!(
                "initial size {initial_pages} pages exceeds {MAX_PAGES} pages"
            )));
        }
        if let Some(max) = max_pages {
            if initial_pages > max {
                return Err(RuntimeError::MemoryError(format!(
                    "initial size {initial_pages} pages exceeds maximum {max} pages"
                )));
            }
        }

        Ok(Memory {
            data: vec![0u8; initial_pages as usize * PAGE_SIZE],
            max_pages,
        })
    }

    /// Memory backed by a host-supplied buffer. The buffer length need not be
    /// a multiple of the page size; accesses are checked against its exact
    /// length.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Memory {
            data: bytes.into(),
            max_pages: None,
        }
    }

    /// Current size in pages, rounding a partial trailing page up
    pub fn size(&self) -> u32 {
        ((self.data.len() + PAGE_SIZE - 1) / PAGE_SIZE) as u32
    }

    /// Current size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn max_pages(&self) -> Option<u32> {
        self.max_pages
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Grows by `delta_pages`, zero filling the new pages. Returns the
    /// previous size in pages, or -1 when the limit would be exceeded.
    ///
    /// A host buffer with a partial trailing page grows by whole pages from
    /// its exact length, so the partial page stays partial.
    pub fn grow(&mut self, delta_pages: u32) -> i32 {
        let current = self.size();
        if delta_pages == 0 {
            return current as i32;
        }
        let Some(new_pages) = current.checked_add(delta_pages) else {
            return -1;
        };
        if new_pages > self.max_pages.unwrap_or(MAX_PAGES) {
            return -1;
        }

        let added = delta_pages as usize * PAGE_SIZE;
        match self.data.try_reserve(added) {
            Ok(()) => {
                self.data.resize(self.data.len() + added, 0);
                current as i32
            }
            Err(_) => -1,
        }
    }

    /// Resolves `addr..addr + len` to a range within the buffer.
    #[inline]
    fn range(&self, addr: u64, len: usize) -> Result<std::ops::Range<usize>, RuntimeError> {
        let end = addr.checked_add(len as u64);
        match end {
            Some(end) if end <= self.data.len() as u64 => Ok(addr as usize..end as usize),
            _ => Err(RuntimeError::MemoryOutOfBounds { addr, len }),
        }
    }

    pub fn read(&self, addr: u64, len: usize) -> Result<&[u8], RuntimeError> {
        let range = self.range(addr, len)?;
        Ok(&self.data[range])
    }

    pub fn write(&mut self, addr: u64, bytes: &[u8]) -> Result<(), RuntimeError> {
        let range = self.range(addr, bytes.len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_u8(&self, addr: u64) -> Result<u8, RuntimeError> {
        Ok(self.read(addr, 1)?[0])
    }

    pub fn read_u16(&self, addr: u64) -> Result<u16, RuntimeError> {
        Ok(LittleEndian::read_u16(self.read(addr, 2)?))
    }

    pub fn read_u32(&self, addr: u64) -> Result<u32, RuntimeError> {
        Ok(LittleEndian::read_u32(self.read(addr, 4)?))
    }

    pub fn read_u64(&self, addr: u64) -> Result<u64, RuntimeError> {
        Ok(LittleEndian::read_u64(self.read(addr, 8)?))
    }

    pub fn read_f32(&self, addr: u64) -> Result<f32, RuntimeError> {
        Ok(LittleEndian::read_f32(self.read(addr, 4)?))
    }

    pub fn read_f64(&self, addr: u64) -> Result<f64, RuntimeError> {
        Ok(LittleEndian::read_f64(self.read(addr, 8)?))
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> Result<(), RuntimeError> {
        self.write(addr, &[value])
    }

    pub fn write_u16(&mut self, addr: u64, value: u16) -> Result<(), RuntimeError> {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.write(addr, &buf)
    }

    pub fn write_u32(&mut self, addr: u64, value: u32) -> Result<(), RuntimeError> {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.write(addr, &buf)
    }

    pub fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), RuntimeError> {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        self.write(addr, &buf)
    }

    pub fn write_f32(&mut self, addr: u64, value: f32) -> Result<(), RuntimeError> {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, value);
        self.write(addr, &buf)
    }

    pub fn write_f64(&mut self, addr: u64, value: f64) -> Result<(), RuntimeError> {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, value);
        self.write(addr, &buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_creation() {
        let mem = Memory::new(1, None).unwrap();
        assert_eq!(mem.size(), 1);
        assert_eq!(mem.len(), PAGE_SIZE);

        let mem = Memory::new(1, Some(10)).unwrap();
        assert_eq!(mem.max_pages(), Some(10));

        assert!(Memory::new(10, Some(5)).is_err());
        assert!(Memory::new(MAX_PAGES + 1, None).is_err());
    }

    #[test]
    fn test_memory_grow() {
        let mut mem = Memory::new(1, Some(3)).unwrap();
        assert_eq!(mem.grow(2), 1);
        assert_eq!(mem.size(), 3);
        assert_eq!(mem.len(), 3 * PAGE_SIZE);
        assert_eq!(mem.grow(1), -1);
        assert_eq!(mem.size(), 3);
        assert_eq!(mem.grow(u32::MAX), -1);
    }

    #[test]
    fn test_from_bytes() {
        let mem = Memory::from_bytes(vec![1, 2, 3]);
        assert_eq!(mem.len(), 3);
        assert_eq!(mem.size(), 1);
        assert_eq!(mem.read_u8(2).unwrap(), 3);
        assert!(matches!(
            mem.read_u8(3),
            Err(RuntimeError::MemoryOutOfBounds { addr: 3, len: 1 })
        ));
    }

    #[test]
    fn test_read_write_le() {
        let mut mem = Memory::new(1, None).unwrap();
        mem.write_u32(100, 0x12345678).unwrap();
        assert_eq!(mem.read(100, 4).unwrap(), &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(mem.read_u16(100).unwrap(), 0x5678);

        mem.write_f64(8, -1.5).unwrap();
        assert_eq!(mem.read_f64(8).unwrap(), -1.5);
        mem.write_u64(16, u64::MAX).unwrap();
        assert_eq!(mem.read_u64(16).unwrap(), u64::MAX);
    }

    #[test]
    fn test_bounds() {
        let mut mem = Memory::new(1, None).unwrap();
        let last = PAGE_SIZE as u64 - 4;
        assert!(mem.write_u32(last, 1).is_ok());
        assert!(mem.write_u32(last + 1, 1).is_err());
        assert!(mem.read_u64(u64::MAX).is_err());
        // a failed write leaves the buffer unchanged in size
        assert_eq!(mem.len(), PAGE_SIZE);
    }

    #[test]
    fn test_grow_host_buffer() {
        let mut mem = Memory::from_bytes(vec![0; 10]);
        assert_eq!(mem.grow(0), 1);
        assert_eq!(mem.len(), 10);
        assert!(matches!(
            mem.read_u8(10),
            Err(RuntimeError::MemoryOutOfBounds { addr: 10, len: 1 })
        ));

        assert_eq!(mem.grow(1), 1);
        assert_eq!(mem.len(), 10 + PAGE_SIZE);
        assert_eq!(mem.size(), 2);
        assert!(mem.read_u8(9 + PAGE_SIZE as u64).is_ok());
        assert!(mem.read_u8(10 + PAGE_SIZE as u64).is_err());
    }
}
