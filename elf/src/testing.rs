//! Synthetic ELF images for tests.
//!
//! Images are little-endian executables with a program header table and no sections.
#![allow(clippy::cast_possible_truncation, clippy::missing_panics_doc)]
use crate::parser::{Class, Target};
use alloc::{vec, vec::Vec};
use core::ops::{Deref, DerefMut};

pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;
pub const PT_INTERP: u32 = 3;
pub const PT_NOTE: u32 = 4;

pub const ET_REL: u16 = 1;
pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;

pub const PF_X: u32 = 1;
pub const PF_W: u32 = 2;
pub const PF_R: u32 = 4;

/// Description of a program header and its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpec {
    pub kind: u32,
    pub flags: u32,
    pub paddr: u64,
    pub data: Vec<u8>,
    pub mem_size: u64,
    /// Fixed file offset of the data, placed after the tables if `None`
    pub offset: Option<u64>,
}

impl SegmentSpec {
    #[must_use]
    /// A `PT_LOAD` segment.
    pub fn load(paddr: u64, data: &[u8], mem_size: u64) -> Self {
        Self {
            kind: PT_LOAD,
            flags: PF_R | PF_X,
            paddr,
            data: data.to_vec(),
            mem_size,
            offset: None,
        }
    }

    #[must_use]
    /// A segment that is not loaded.
    pub fn other(kind: u32, data: &[u8]) -> Self {
        Self {
            kind,
            flags: PF_R,
            paddr: 0,
            data: data.to_vec(),
            mem_size: data.len() as u64,
            offset: None,
        }
    }

    #[must_use]
    pub const fn at_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Builder for synthetic ELF images.
#[derive(Debug, Clone)]
pub struct ElfBuilder {
    target: Target,
    entry: u64,
    elf_type: u16,
    ph_offset: Option<u64>,
    segments: Vec<SegmentSpec>,
}

impl ElfBuilder {
    #[must_use]
    pub const fn new(target: Target, entry: u64) -> Self {
        Self {
            target,
            entry,
            elf_type: ET_EXEC,
            ph_offset: None,
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub const fn elf_type(mut self, elf_type: u16) -> Self {
        self.elf_type = elf_type;
        self
    }

    #[must_use]
    /// Place the program header table at `offset` instead of right after the header.
    pub const fn ph_offset(mut self, offset: u64) -> Self {
        self.ph_offset = Some(offset);
        self
    }

    #[must_use]
    pub fn segment(mut self, segment: SegmentSpec) -> Self {
        self.segments.push(segment);
        self
    }

    #[must_use]
    pub fn build(&self) -> ImageBytes {
        let class = self.target.class;
        let header_size = class.header_size() as u64;
        let entry_size = class.program_header_size() as u64;
        let phnum = self.segments.len() as u16;

        let phoff = self.ph_offset.unwrap_or(header_size);
        let table_end = phoff + entry_size * u64::from(phnum);

        let mut cursor = table_end.max(header_size).next_multiple_of(16);
        let mut offsets = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            if let Some(offset) = segment.offset {
                offsets.push(offset);
            } else {
                offsets.push(cursor);
                cursor = (cursor + segment.data.len() as u64).next_multiple_of(16);
            }
        }

        let len = offsets
            .iter()
            .zip(&self.segments)
            .map(|(offset, segment)| offset + segment.data.len() as u64)
            .fold(table_end.max(header_size), u64::max);
        let mut image = ImageBytes::zeroed(len as usize);

        image[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
        image[4] = match class {
            Class::Elf32 => 1,
            Class::Elf64 => 2,
        };
        image[5] = 1; // little-endian
        image[6] = 1; // version
        image.write_u16(0x10, self.elf_type);
        image.write_u16(0x12, self.target.machine.as_u16());
        image.write_u32(0x14, 1);

        match class {
            Class::Elf32 => {
                image.write_u32(0x18, self.entry as u32);
                image.write_u32(0x1C, phoff as u32);
                image.write_u16(0x28, 52);
                image.write_u16(0x2A, 32);
                image.write_u16(0x2C, phnum);
            }
            Class::Elf64 => {
                image.write_u64(0x18, self.entry);
                image.write_u64(0x20, phoff);
                image.write_u16(0x34, 64);
                image.write_u16(0x36, 56);
                image.write_u16(0x38, phnum);
            }
        }

        for (index, (segment, offset)) in self.segments.iter().zip(offsets).enumerate() {
            let base = (phoff + index as u64 * entry_size) as usize;
            let file_size = segment.data.len() as u64;

            match class {
                Class::Elf32 => {
                    image.write_u32(base, segment.kind);
                    image.write_u32(base + 4, offset as u32);
                    image.write_u32(base + 8, segment.paddr as u32);
                    image.write_u32(base + 12, segment.paddr as u32);
                    image.write_u32(base + 16, file_size as u32);
                    image.write_u32(base + 20, segment.mem_size as u32);
                    image.write_u32(base + 24, segment.flags);
                    image.write_u32(base + 28, 4);
                }
                Class::Elf64 => {
                    image.write_u32(base, segment.kind);
                    image.write_u32(base + 4, segment.flags);
                    image.write_u64(base + 8, offset);
                    image.write_u64(base + 16, segment.paddr);
                    image.write_u64(base + 24, segment.paddr);
                    image.write_u64(base + 32, file_size);
                    image.write_u64(base + 40, segment.mem_size);
                    image.write_u64(base + 48, 8);
                }
            }

            let start = offset as usize;
            image[start..start + segment.data.len()].copy_from_slice(&segment.data);
        }

        image
    }
}

/// A byte buffer aligned for ELF64 headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
    words: Vec<u64>,
    len: usize,
}

impl ImageBytes {
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(8)],
            len,
        }
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut image = Self::zeroed(bytes.len());
        image.copy_from_slice(bytes);
        image
    }

    /// Shortens the buffer, keeping the first `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn write_u16(&mut self, offset: usize, value: u16) {
        self[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, offset: usize, value: u64) {
        self[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }
}

impl Deref for ImageBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // Safety:
        // `words` holds at least `len` initialized bytes and `u8` has no alignment requirement.
        unsafe { core::slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.len) }
    }
}

impl DerefMut for ImageBytes {
    fn deref_mut(&mut self) -> &mut [u8] {
        // Safety:
        // `words` holds at least `len` initialized bytes and `u8` has no alignment requirement.
        unsafe { core::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast::<u8>(), self.len) }
    }
}
