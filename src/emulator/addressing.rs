use std::fmt;

use super::error::EmulatorError;
use super::memory::Memory;

/// How the bytes after an opcode turn into an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand bytes; the operation names its register (NEGA, CLC, RTS ...)
    Inherent,
    /// `#ii`, the operand is the byte itself
    Immediate,
    /// `dd`, an address in page zero
    Direct,
    /// `hh ll`, a full 16 bit address
    Extended,
    /// `,X`, the address is X
    Indexed,
    /// `ff,X`, X plus an unsigned 8 bit offset
    Indexed8,
    /// `ee ff,X`, X plus a 16 bit offset
    Indexed16,
    /// `rr`, signed offset from the next instruction
    Relative,
    /// `dd rr`, direct address then a branch offset (BRSET/BRCLR)
    DirectRelative,
}

impl AddressingMode {
    /// Operand bytes this mode consumes after the opcode.
    pub fn operand_bytes(&self) -> u16 {
        match self {
            AddressingMode::Inherent | AddressingMode::Indexed => 0,
            AddressingMode::Immediate
            | AddressingMode::Direct
            | AddressingMode::Indexed8
            | AddressingMode::Relative => 1,
            AddressingMode::Extended
            | AddressingMode::Indexed16
            | AddressingMode::DirectRelative => 2,
        }
    }

    /// The mode encoded by the opcode's column (high nibble) of the 68HC05 map.
    pub fn from_opcode(opcode: u8) -> Self {
        match opcode >> 4 {
            0x0 => AddressingMode::DirectRelative,
            0x1 => AddressingMode::Direct,
            0x2 => AddressingMode::Relative,
            0x3 => AddressingMode::Direct,
            0x4 | 0x5 => AddressingMode::Inherent,
            0x6 => AddressingMode::Indexed8,
            0x7 => AddressingMode::Indexed,
            0x8 | 0x9 => AddressingMode::Inherent,
            // BSR sits in the immediate column
            0xA if opcode == 0xAD => AddressingMode::Relative,
            0xA => AddressingMode::Immediate,
            0xB => AddressingMode::Direct,
            0xC => AddressingMode::Extended,
            0xD => AddressingMode::Indexed16,
            0xE => AddressingMode::Indexed8,
            _ => AddressingMode::Indexed,
        }
    }
}

/// A decoded operand, ready for an instruction handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    Immediate(u8),
    /// Effective address of a memory operand
    Address(u16),
    /// Branch destination, already offset from the next instruction
    Relative { target: u16 },
    /// BRSET/BRCLR: tested location and branch destination
    BitBranch { address: u16, target: u16 },
}

impl Operand {
    pub fn address(&self) -> Result<u16, EmulatorError> {
        match self {
            Operand::Address(address) | Operand::BitBranch { address, .. } => Ok(*address),
            other => Err(EmulatorError::InvalidAddressFormat(format!(
                "{other:?} has no effective address"
            ))),
        }
    }

    pub fn target(&self) -> Result<u16, EmulatorError> {
        match self {
            Operand::Relative { target } | Operand::BitBranch { target, .. } => Ok(*target),
            Operand::Address(address) => Ok(*address),
            other => Err(EmulatorError::InvalidAddressFormat(format!(
                "{other:?} has no branch target"
            ))),
        }
    }

    /// The 8 bit value the operand denotes, reading memory if needed.
    pub fn value(&self, memory: &Memory) -> Result<u8, EmulatorError> {
        match self {
            Operand::Immediate(value) => Ok(*value),
            Operand::Address(address) | Operand::BitBranch { address, .. } => {
                Ok(memory.read_byte(*address))
            }
            other => Err(EmulatorError::InvalidAddressFormat(format!(
                "{other:?} has no value"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of operand resolution: the operand, the raw bytes it came from and
/// where the next sequential instruction starts.
pub struct ResolvedOperand {
    pub mode: AddressingMode,
    pub operand: Operand,
    pub raw: [u8; 2],
    /// Opcode plus operand bytes
    pub length: u16,
    pub next_pc: u16,
}

impl ResolvedOperand {
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw[..(self.length - 1) as usize]
    }
}

fn relative(next_pc: u16, offset: u8) -> u16 {
    next_pc.wrapping_add(offset as i8 as u16)
}

fn indexed(x: u8, offset: u16) -> Result<u16, EmulatorError> {
    let address = x as u32 + offset as u32;
    u16::try_from(address).map_err(|_| EmulatorError::OperandOutOfRange {
        value: address,
        max: u16::MAX as u32,
    })
}

/// Read the operand bytes of the instruction at `pc` and work out the operand.
/// Nothing is mutated, so this doubles as the decoder for trace output.
pub fn resolve(
    mode: AddressingMode,
    pc: u16,
    memory: &Memory,
    x: u8,
) -> Result<ResolvedOperand, EmulatorError> {
    let span = tracing::trace_span!("resolve", mode = ?mode, pc = format!("0x{pc:04X}"));
    let _guard = span.enter();

    let count = mode.operand_bytes();
    let mut raw = [0u8; 2];
    for (i, byte) in raw.iter_mut().enumerate().take(count as usize) {
        *byte = memory.read_byte(pc.wrapping_add(1 + i as u16));
    }
    let length = 1 + count;
    let next_pc = pc.wrapping_add(length);
    let word = u16::from_be_bytes(raw);

    let operand = match mode {
        AddressingMode::Inherent => Operand::None,
        AddressingMode::Immediate => Operand::Immediate(raw[0]),
        AddressingMode::Direct => Operand::Address(raw[0] as u16),
        AddressingMode::Extended => Operand::Address(word),
        AddressingMode::Indexed => Operand::Address(x as u16),
        AddressingMode::Indexed8 => Operand::Address(indexed(x, raw[0] as u16)?),
        AddressingMode::Indexed16 => Operand::Address(indexed(x, word)?),
        AddressingMode::Relative => Operand::Relative {
            target: relative(next_pc, raw[0]),
        },
        AddressingMode::DirectRelative => Operand::BitBranch {
            address: raw[0] as u16,
            target: relative(next_pc, raw[1]),
        },
    };

    tracing::trace!(?operand, length, "resolved operand");
    Ok(ResolvedOperand {
        mode,
        operand,
        raw,
        length,
        next_pc,
    })
}

impl fmt::Display for ResolvedOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mode, self.operand) {
            (_, Operand::None) => Ok(()),
            (_, Operand::Immediate(value)) => write!(f, "#${value:02X}"),
            (AddressingMode::Direct, Operand::Address(address)) => write!(f, "${address:02X}"),
            (AddressingMode::Extended, Operand::Address(address)) => write!(f, "${address:04X}"),
            (AddressingMode::Indexed, _) => write!(f, ",x"),
            (AddressingMode::Indexed8, _) => write!(f, "${:02X},x", self.raw[0]),
            (AddressingMode::Indexed16, _) => {
                write!(f, "${:04X},x", u16::from_be_bytes(self.raw))
            }
            (_, Operand::Relative { target }) => write!(f, "${target:04X}"),
            (_, Operand::BitBranch { address, target }) => {
                write!(f, "${address:02X},${target:04X}")
            }
            (_, Operand::Address(address)) => write!(f, "${address:04X}"),
        }
    }
}
