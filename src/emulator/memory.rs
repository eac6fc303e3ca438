use std::fmt;
use std::ops::RangeInclusive;

use rustc_hash::FxHashMap as HashMap;

use super::error::EmulatorError;

/// Named windows of the 68HC05 address map.
///
/// These are labels for diagnostics only, memory does not enforce any
/// read/write permission per region (ROM is writable here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    IoRegisters,
    UserEprom,
    Ram,
    StackWindow,
    Unused,
    ProgramEprom,
    SelfCheckRom,
    Vectors,
}

impl MemoryRegion {
    pub const ALL: [MemoryRegion; 8] = [
        MemoryRegion::IoRegisters,
        MemoryRegion::UserEprom,
        MemoryRegion::Ram,
        MemoryRegion::StackWindow,
        MemoryRegion::Unused,
        MemoryRegion::ProgramEprom,
        MemoryRegion::SelfCheckRom,
        MemoryRegion::Vectors,
    ];

    pub fn range(&self) -> RangeInclusive<u16> {
        match self {
            MemoryRegion::IoRegisters => 0x0000..=0x001F,
            MemoryRegion::UserEprom => 0x0020..=0x004F,
            MemoryRegion::Ram => 0x0050..=0x00BF,
            MemoryRegion::StackWindow => 0x00C0..=0x00FF,
            MemoryRegion::Unused => 0x0100..=0x0FFF,
            MemoryRegion::ProgramEprom => 0x1000..=0x3EFF,
            MemoryRegion::SelfCheckRom => 0x3F00..=0x3FEF,
            MemoryRegion::Vectors => 0x3FF0..=0x3FFF,
        }
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemoryRegion::IoRegisters => "I/O registers",
            MemoryRegion::UserEprom => "user EPROM",
            MemoryRegion::Ram => "RAM",
            MemoryRegion::StackWindow => "stack window",
            MemoryRegion::Unused => "unused",
            MemoryRegion::ProgramEprom => "program EPROM",
            MemoryRegion::SelfCheckRom => "self-check ROM",
            MemoryRegion::Vectors => "interrupt vectors",
        };
        write!(f, "{name}")
    }
}

/// Anything that can be normalized into a 16 bit address.
///
/// Integers are taken as-is, two byte sequences are big endian and strings are
/// hex text with an optional `0x`/`$` prefix.
pub trait IntoAddress {
    fn into_address(self) -> Result<u16, EmulatorError>;
}

fn address_from_wide(value: u64) -> Result<u16, EmulatorError> {
    u16::try_from(value).map_err(|_| EmulatorError::OperandOutOfRange {
        value: u32::try_from(value).unwrap_or(u32::MAX),
        max: u16::MAX as u32,
    })
}

impl IntoAddress for u16 {
    fn into_address(self) -> Result<u16, EmulatorError> {
        Ok(self)
    }
}

impl IntoAddress for u8 {
    fn into_address(self) -> Result<u16, EmulatorError> {
        Ok(self as u16)
    }
}

impl IntoAddress for u32 {
    fn into_address(self) -> Result<u16, EmulatorError> {
        address_from_wide(self as u64)
    }
}

impl IntoAddress for usize {
    fn into_address(self) -> Result<u16, EmulatorError> {
        address_from_wide(self as u64)
    }
}

impl IntoAddress for i32 {
    fn into_address(self) -> Result<u16, EmulatorError> {
        if self < 0 {
            return Err(EmulatorError::InvalidAddressFormat(format!(
                "negative address {self}"
            )));
        }
        address_from_wide(self as u64)
    }
}

impl IntoAddress for [u8; 2] {
    fn into_address(self) -> Result<u16, EmulatorError> {
        Ok(u16::from_be_bytes(self))
    }
}

impl IntoAddress for &[u8] {
    fn into_address(self) -> Result<u16, EmulatorError> {
        let bytes: [u8; 2] = self.try_into().map_err(|_| {
            EmulatorError::InvalidAddressFormat(format!(
                "expected 2 address bytes, got {}",
                self.len()
            ))
        })?;
        bytes.into_address()
    }
}

impl IntoAddress for &str {
    fn into_address(self) -> Result<u16, EmulatorError> {
        let trimmed = self.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .or_else(|| trimmed.strip_prefix('$'))
            .unwrap_or(trimmed);

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EmulatorError::InvalidAddressFormat(format!(
                "'{self}' is not a hex address"
            )));
        }

        let value = u64::from_str_radix(digits, 16).map_err(|_| {
            // only reachable with absurdly long digit strings
            EmulatorError::OperandOutOfRange {
                value: u32::MAX,
                max: u16::MAX as u32,
            }
        })?;
        address_from_wide(value)
    }
}

impl IntoAddress for &String {
    fn into_address(self) -> Result<u16, EmulatorError> {
        self.as_str().into_address()
    }
}

impl IntoAddress for String {
    fn into_address(self) -> Result<u16, EmulatorError> {
        self.as_str().into_address()
    }
}

#[derive(Debug, Clone)]
/// Sparse byte addressable memory.
///
/// Unwritten cells read back the fill byte, the value an idle bus floats to on
/// the real part, not zero.
pub struct Memory {
    cells: HashMap<u16, u8>,
    fill_byte: u8,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(0x9D)
    }
}

impl Memory {
    pub fn new(fill_byte: u8) -> Self {
        Self {
            cells: HashMap::default(),
            fill_byte,
        }
    }

    pub fn fill_byte(&self) -> u8 {
        self.fill_byte
    }

    pub fn read(&self, address: impl IntoAddress) -> Result<u8, EmulatorError> {
        let address = address.into_address()?;
        Ok(self.read_byte(address))
    }

    pub fn write(&mut self, address: impl IntoAddress, value: u8) -> Result<(), EmulatorError> {
        let address = address.into_address()?;
        self.write_byte(address, value);
        Ok(())
    }

    /// Read with an already normalized address.
    pub fn read_byte(&self, address: u16) -> u8 {
        self.cells.get(&address).copied().unwrap_or(self.fill_byte)
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        tracing::trace!(
            address = format!("0x{address:04X}"),
            value = format!("0x{value:02X}"),
            "memory write"
        );
        self.cells.insert(address, value);
    }

    /// Big endian 16 bit read, the byte order of vectors and extended operands.
    /// The second byte wraps around to `$0000` at the top of memory.
    pub fn read_word(&self, address: impl IntoAddress) -> Result<u16, EmulatorError> {
        let address = address.into_address()?;
        let high = self.read_byte(address);
        let low = self.read_byte(address.wrapping_add(1));
        Ok(u16::from_be_bytes([high, low]))
    }

    /// Copy `program` into memory starting at `start_address`.
    pub fn load_program(
        &mut self,
        start_address: impl IntoAddress,
        program: &[u8],
    ) -> Result<(), EmulatorError> {
        let start = start_address.into_address()?;
        let span = tracing::info_span!(
            "load_program",
            start_address = format!("0x{start:04X}"),
            program_size = program.len()
        );
        let _guard = span.enter();

        if program.len() > u16::MAX as usize + 1 - start as usize {
            return Err(EmulatorError::OperandOutOfRange {
                value: start as u32 + program.len() as u32 - 1,
                max: u16::MAX as u32,
            });
        }

        for (offset, &byte) in program.iter().enumerate() {
            self.write_byte(start + offset as u16, byte);
        }

        tracing::info!("Loaded {} bytes at 0x{:04X}", program.len(), start);
        Ok(())
    }

    pub fn region_of(&self, address: u16) -> MemoryRegion {
        MemoryRegion::ALL
            .into_iter()
            .find(|region| region.range().contains(&address))
            // everything above the vectors is unpopulated on the real part
            .unwrap_or(MemoryRegion::Unused)
    }

    /// Written cells in ascending address order.
    pub fn cells(&self) -> Vec<(u16, u8)> {
        let mut cells: Vec<_> = self.cells.iter().map(|(&a, &v)| (a, v)).collect();
        cells.sort_unstable_by_key(|(address, _)| *address);
        cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (address, value) in self.cells() {
            writeln!(f, "0x{address:04X}: 0x{value:02X}")?;
        }
        Ok(())
    }
}
