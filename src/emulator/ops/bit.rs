//! Single bit manipulation on page zero. The bit number is part of the
//! opcode and already sits in `Instruction::bit`.

use super::{Flow, Instruction};
use crate::emulator::addressing::ResolvedOperand;
use crate::emulator::error::EmulatorError;
use crate::emulator::registers::FlagUpdate;
use crate::emulator::Emulator;

fn mask(instruction: &Instruction) -> u8 {
    1 << instruction.bit
}

pub(super) fn bset(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let address = resolved.operand.address()?;
    let value = emulator.memory.read_byte(address) | mask(instruction);
    emulator.memory.write_byte(address, value);
    Ok(Flow::Next)
}

pub(super) fn bclr(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let address = resolved.operand.address()?;
    let value = emulator.memory.read_byte(address) & !mask(instruction);
    emulator.memory.write_byte(address, value);
    Ok(Flow::Next)
}

/// Test the bit, copy it into C and branch if it equals `branch_if`.
fn test_and_branch(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
    branch_if: bool,
) -> Result<Flow, EmulatorError> {
    let value = resolved.operand.value(&emulator.memory)?;
    let bit_set = value & mask(instruction) != 0;
    emulator.registers.update_flags(FlagUpdate::new().c(bit_set));

    if bit_set == branch_if {
        let target = resolved.operand.target()?;
        tracing::trace!(bit = instruction.bit, target, "bit test branch taken");
        emulator.registers.set_pc(target as u32)?;
        return Ok(Flow::Jump);
    }
    Ok(Flow::Next)
}

pub(super) fn brset(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    test_and_branch(emulator, instruction, resolved, true)
}

pub(super) fn brclr(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    test_and_branch(emulator, instruction, resolved, false)
}
