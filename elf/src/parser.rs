//! ELF container parsing and structural validation.
use crate::{
    Result,
    error::ElfLoadError,
    segments::{MAX_SEGMENTS, Segment, Segments},
};
use handoff_core::arch::PhysAddr;
use xmas_elf::{
    ElfFile, header,
    program::{ProgramHeader, Type},
};

const MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
/// Size of `e_ident`
const IDENT_SIZE: usize = 16;

const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const EI_VERSION: usize = 6;
const E_MACHINE: usize = 0x12;

const ELFDATA2LSB: u8 = 1;
const EV_CURRENT: u8 = 1;

const EM_ARM: u16 = 0x28;
const EM_X86_64: u16 = 0x3E;
const EM_AARCH64: u16 = 0xB7;

/// ELF file class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

impl Class {
    const fn from_ident(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Elf32),
            2 => Some(Self::Elf64),
            _ => None,
        }
    }

    #[must_use]
    #[inline]
    /// Size of the ELF header.
    pub const fn header_size(self) -> usize {
        match self {
            Self::Elf32 => 52,
            Self::Elf64 => 64,
        }
    }

    #[must_use]
    #[inline]
    /// Size of a program header table entry.
    pub const fn program_header_size(self) -> usize {
        match self {
            Self::Elf32 => 32,
            Self::Elf64 => 56,
        }
    }

    #[must_use]
    #[inline]
    /// Natural alignment of the header structures.
    pub const fn alignment(self) -> usize {
        match self {
            Self::Elf32 => 4,
            Self::Elf64 => 8,
        }
    }
}

/// Processor architecture an image is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    Arm,
    X86_64,
    AArch64,
}

impl Machine {
    #[must_use]
    #[inline]
    /// `e_machine` value of the architecture.
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Arm => EM_ARM,
            Self::X86_64 => EM_X86_64,
            Self::AArch64 => EM_AARCH64,
        }
    }
}

/// The kind of image the parser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub class: Class,
    pub machine: Machine,
}

impl Target {
    pub const ARM: Self = Self {
        class: Class::Elf32,
        machine: Machine::Arm,
    };
    pub const X86_64: Self = Self {
        class: Class::Elf64,
        machine: Machine::X86_64,
    };
    pub const AARCH64: Self = Self {
        class: Class::Elf64,
        machine: Machine::AArch64,
    };

    #[cfg(target_arch = "x86_64")]
    /// The architecture this code runs on.
    pub const NATIVE: Self = Self::X86_64;
    #[cfg(target_arch = "aarch64")]
    /// The architecture this code runs on.
    pub const NATIVE: Self = Self::AARCH64;
    #[cfg(target_arch = "arm")]
    /// The architecture this code runs on.
    pub const NATIVE: Self = Self::ARM;
}

/// A structurally valid ELF executable.
///
/// Every segment described here has its file data within the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedImage<'a> {
    raw: &'a [u8],
    class: Class,
    entry: PhysAddr,
    segments: Segments,
}

impl<'a> ParsedImage<'a> {
    /// Parse and validate `raw` as an executable for `target`.
    ///
    /// # Errors
    ///
    /// - `MalformedContainer` if the identification, machine or table layout is wrong,
    ///   or if there is nothing to load
    /// - `TruncatedContainer` if a header, the program header table or segment data
    ///   extends past the end of `raw`
    /// - `UnsupportedFeature` for anything but a static executable
    /// - `UnalignedBuffer` if `raw` is not aligned for the header structures
    pub fn parse(raw: &'a [u8], target: Target) -> Result<Self> {
        let class = Self::check_ident(raw, target)?;

        if raw.as_ptr().addr() % class.alignment() != 0 {
            return Err(ElfLoadError::UnalignedBuffer);
        }

        let elf = ElfFile::new(raw).map_err(|_| ElfLoadError::MalformedContainer)?;
        Self::check_header(&elf, raw, target)?;

        let segments = Self::collect_segments(&elf)?;
        if segments.loadable().next().is_none() {
            return Err(ElfLoadError::MalformedContainer);
        }

        let entry = PhysAddr::try_new(elf.header.pt2.entry_point())
            .ok_or(ElfLoadError::MalformedContainer)?;

        Ok(Self {
            raw,
            class,
            entry,
            segments,
        })
    }

    /// Check `e_ident` before handing the buffer to `xmas-elf`.
    fn check_ident(raw: &[u8], target: Target) -> Result<Class> {
        let ident = raw
            .get(..IDENT_SIZE)
            .ok_or(ElfLoadError::TruncatedContainer)?;

        if ident[..MAGIC.len()] != MAGIC {
            return Err(ElfLoadError::MalformedContainer);
        }

        let class = Class::from_ident(ident[EI_CLASS]).ok_or(ElfLoadError::MalformedContainer)?;
        if class != target.class
            || ident[EI_DATA] != ELFDATA2LSB
            || ident[EI_VERSION] != EV_CURRENT
        {
            return Err(ElfLoadError::MalformedContainer);
        }

        if raw.len() < class.header_size() {
            return Err(ElfLoadError::TruncatedContainer);
        }

        Ok(class)
    }

    fn check_header(elf: &ElfFile, raw: &[u8], target: Target) -> Result<()> {
        let pt2 = &elf.header.pt2;

        if !matches!(pt2.type_().as_type(), header::Type::Executable) {
            return Err(ElfLoadError::UnsupportedFeature);
        }

        let machine = u16::from_le_bytes([raw[E_MACHINE], raw[E_MACHINE + 1]]);
        if machine != target.machine.as_u16() {
            return Err(ElfLoadError::MalformedContainer);
        }

        if usize::from(pt2.header_size()) != target.class.header_size()
            || usize::from(pt2.ph_entry_size()) != target.class.program_header_size()
        {
            return Err(ElfLoadError::MalformedContainer);
        }

        let count = usize::from(pt2.ph_count());
        if count > MAX_SEGMENTS {
            return Err(ElfLoadError::UnsupportedFeature);
        }

        let table_offset =
            usize::try_from(pt2.ph_offset()).map_err(|_| ElfLoadError::TruncatedContainer)?;
        // The entries are read in place
        if table_offset % target.class.alignment() != 0 {
            return Err(ElfLoadError::MalformedContainer);
        }
        let table_end = count
            .checked_mul(target.class.program_header_size())
            .and_then(|size| table_offset.checked_add(size))
            .ok_or(ElfLoadError::TruncatedContainer)?;
        if table_end > raw.len() {
            return Err(ElfLoadError::TruncatedContainer);
        }

        Ok(())
    }

    fn collect_segments(elf: &ElfFile) -> Result<Segments> {
        let mut segments = Segments::new();

        for index in 0..elf.header.pt2.ph_count() {
            let ph = elf
                .program_header(index)
                .map_err(|_| ElfLoadError::MalformedContainer)?;
            let segment = Self::parse_segment(&ph, elf.input.len())?;
            segments
                .push(segment)
                .map_err(|_| ElfLoadError::UnsupportedFeature)?;
        }

        Ok(segments)
    }

    fn parse_segment(ph: &ProgramHeader, input_len: usize) -> Result<Segment> {
        // Unknown types carry nothing to load
        let loadable = match ph.get_type() {
            Ok(Type::Load) => true,
            Ok(Type::Interp | Type::Dynamic) => return Err(ElfLoadError::UnsupportedFeature),
            _ => false,
        };

        let file_offset = ph.offset();
        let file_size = ph.file_size();
        let file_end = file_offset
            .checked_add(file_size)
            .ok_or(ElfLoadError::TruncatedContainer)?;
        if file_end > input_len as u64 {
            return Err(ElfLoadError::TruncatedContainer);
        }

        let memory_size = ph.mem_size();
        let physical_address = if loadable {
            if memory_size < file_size {
                return Err(ElfLoadError::MalformedContainer);
            }
            let paddr = PhysAddr::try_new(ph.physical_addr())
                .ok_or(ElfLoadError::MalformedContainer)?;
            if paddr.checked_add(memory_size).is_none() {
                return Err(ElfLoadError::MalformedContainer);
            }
            paddr
        } else {
            // Only used for loading, which skips these segments
            PhysAddr::try_new(ph.physical_addr()).unwrap_or_default()
        };

        Ok(Segment {
            physical_address,
            file_offset,
            file_size,
            memory_size,
            loadable,
        })
    }

    #[must_use]
    #[inline]
    pub const fn raw(&self) -> &'a [u8] {
        self.raw
    }

    #[must_use]
    #[inline]
    pub const fn class(&self) -> Class {
        self.class
    }

    #[must_use]
    #[inline]
    /// Entry point declared by the header, not yet checked against the segments.
    pub const fn entry(&self) -> PhysAddr {
        self.entry
    }

    #[must_use]
    #[inline]
    pub const fn segments(&self) -> &Segments {
        &self.segments
    }

    #[must_use]
    /// File data of `segment`.
    pub fn segment_data(&self, segment: &Segment) -> Option<&'a [u8]> {
        let start = usize::try_from(segment.file_offset).ok()?;
        let size = usize::try_from(segment.file_size).ok()?;
        self.raw.get(start..start.checked_add(size)?)
    }
}
