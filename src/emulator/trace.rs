//! Decoding without executing, for listings and step-by-step diagnostics.

use std::fmt;

use super::addressing::{self, AddressingMode, ResolvedOperand};
use super::error::EmulatorError;
use super::ops::Instruction;
use super::Emulator;

#[derive(Debug, Clone)]
/// One instruction as it sits in memory.
pub struct DecodedInstruction {
    pub address: u16,
    pub opcode: u8,
    /// Opcode followed by its operand bytes
    pub bytes: Vec<u8>,
    pub instruction: Instruction,
    pub operand: ResolvedOperand,
}

impl DecodedInstruction {
    pub fn length(&self) -> u16 {
        self.operand.length
    }

    /// Where the next sequential instruction starts.
    pub fn next_address(&self) -> u16 {
        self.operand.next_pc
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instruction)?;
        match self.instruction.mode {
            AddressingMode::Inherent => Ok(()),
            // the bit number is part of the opcode, show it like an operand
            AddressingMode::DirectRelative => {
                write!(f, " {},{}", self.instruction.bit, self.operand)
            }
            AddressingMode::Direct if self.opcode >> 4 == 0x1 => {
                write!(f, " {},{}", self.instruction.bit, self.operand)
            }
            _ => write!(f, " {}", self.operand),
        }
    }
}

impl Emulator {
    fn decode_at(&self, address: u16) -> Result<DecodedInstruction, EmulatorError> {
        let opcode = self.memory.read_byte(address);
        let descriptor = self.opcode_table().get(opcode).ok_or(EmulatorError::UnknownOpcode {
            opcode,
            pc: address,
        })?;
        let instruction = descriptor.instruction;
        let operand =
            addressing::resolve(instruction.mode, address, &self.memory, self.registers.x())?;

        let mut bytes = vec![opcode];
        bytes.extend_from_slice(operand.raw_bytes());

        Ok(DecodedInstruction {
            address,
            opcode,
            bytes,
            instruction,
            operand,
        })
    }

    /// Fetch, decode and resolve the instruction at PC without executing it.
    pub fn trace_step(&self) -> Result<DecodedInstruction, EmulatorError> {
        let pc = self.registers.pc();
        let span = tracing::debug_span!("trace_step", pc = format!("0x{pc:04X}"));
        let _guard = span.enter();

        let decoded = self.decode_at(pc)?;
        tracing::debug!("0x{:04X}: {}", pc, decoded);
        Ok(decoded)
    }

    /// Decode `count` consecutive instructions starting at `start`.
    ///
    /// Indexed operands are resolved against the current X.
    pub fn disassemble(
        &self,
        start: u16,
        count: usize,
    ) -> Result<Vec<DecodedInstruction>, EmulatorError> {
        let span = tracing::debug_span!("disassemble", start = format!("0x{start:04X}"), count);
        let _guard = span.enter();

        let mut listing = Vec::with_capacity(count);
        let mut address = start;
        for _ in 0..count {
            let decoded = self.decode_at(address)?;
            address = decoded.next_address();
            listing.push(decoded);
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(program: &[u8]) -> Vec<String> {
        let mut emulator = Emulator::new();
        emulator.load_program(0x0100, program).unwrap();
        emulator
            .disassemble(0x0100, 1)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn assembler_style_text() {
        assert_eq!(listing(&[0xA0, 0x05]), ["sub #$05"]);
        assert_eq!(listing(&[0xC6, 0x00, 0x80]), ["lda $0080"]);
        assert_eq!(listing(&[0xE7, 0x10]), ["sta $10,x"]);
        assert_eq!(listing(&[0x06, 0x20, 0x02]), ["brset 3,$20,$0105"]);
        assert_eq!(listing(&[0x16, 0x20]), ["bset 3,$20"]);
        assert_eq!(listing(&[0x4F]), ["clra"]);
        assert_eq!(listing(&[0xF6]), ["lda ,x"]);
    }

    #[test]
    fn disassemble_walks_instruction_lengths() {
        let mut emulator = Emulator::new();
        emulator
            .load_program(0x0200, &[0xA6, 0x01, 0xC7, 0x00, 0x80, 0x9D, 0x20, 0xF8])
            .unwrap();
        let listing = emulator.disassemble(0x0200, 4).unwrap();
        let addresses: Vec<u16> = listing.iter().map(|line| line.address).collect();
        assert_eq!(addresses, [0x0200, 0x0202, 0x0205, 0x0206]);
        assert_eq!(listing[1].bytes, [0xC7, 0x00, 0x80]);
        assert_eq!(listing[3].to_string(), "bra $0200");
        assert_eq!(listing[3].length(), 2);
    }

    #[test]
    fn unknown_opcode_reports_its_address() {
        let mut emulator = Emulator::new();
        emulator.load_program(0x0300, &[0x9D, 0x31]).unwrap();
        assert_eq!(
            emulator.disassemble(0x0300, 2).unwrap_err(),
            EmulatorError::UnknownOpcode {
                opcode: 0x31,
                pc: 0x0301
            }
        );
    }
}
