use std::fmt;

use thiserror::Error;

/// Names the register a width check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterName {
    A,
    X,
    Pc,
}

impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterName::A => write!(f, "A"),
            RegisterName::X => write!(f, "X"),
            RegisterName::Pc => write!(f, "PC"),
        }
    }
}

/// Everything the core can fail with. None of these are recovered locally,
/// they all propagate to whoever called `step`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmulatorError {
    /// An address arrived in an encoding we cannot normalize.
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    /// A register write outside the register's width. The core never truncates,
    /// so hitting this means a handler forgot to mask.
    #[error("register {register} cannot hold 0x{value:X} (max 0x{max:X})")]
    RegisterWidthViolation {
        register: RegisterName,
        value: u32,
        max: u32,
    },

    /// The opcode byte has no entry in the opcode table.
    #[error("unknown opcode 0x{opcode:02X} at 0x{pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },

    /// A resolved address or value does not fit its range.
    #[error("operand 0x{value:X} out of range (max 0x{max:X})")]
    OperandOutOfRange { value: u32, max: u32 },

    /// The opcode table resource could not be loaded.
    #[error("opcode table line {line}: {reason}")]
    InvalidOpcodeTable { line: usize, reason: String },
}

impl EmulatorError {
    pub(crate) fn width(register: RegisterName, value: u32, max: u32) -> Self {
        EmulatorError::RegisterWidthViolation {
            register,
            value,
            max,
        }
    }

    pub(crate) fn table(line: usize, reason: impl Into<String>) -> Self {
        EmulatorError::InvalidOpcodeTable {
            line,
            reason: reason.into(),
        }
    }
}
