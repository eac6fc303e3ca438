//! Single bit shifts and rotates. C always receives the bit pushed out.

use super::{read_target, write_target, Flow, Instruction};
use crate::emulator::addressing::ResolvedOperand;
use crate::emulator::error::EmulatorError;
use crate::emulator::registers::FlagUpdate;
use crate::emulator::Emulator;

/// Shared read-shift-write: `op` returns the result and the bit shifted out.
fn shift_target(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
    op: fn(u8) -> (u8, bool),
) -> Result<(u8, bool), EmulatorError> {
    let value = read_target(emulator, instruction, resolved)?;
    let (result, carry) = op(value);
    write_target(emulator, instruction, resolved, result)?;
    tracing::trace!(value, result, carry, mnemonic = %instruction.mnemonic, "shift");
    Ok((result, carry))
}

/// ASL and LSL are the same operation.
pub(super) fn asl(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let (result, carry) = shift_target(emulator, instruction, resolved, |v| {
        (v << 1, v & 0x80 != 0)
    })?;
    emulator
        .registers
        .update_flags(FlagUpdate::nz(result).c(carry));
    Ok(Flow::Next)
}

/// Bit 7 is kept, so the sign survives.
pub(super) fn asr(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let (result, carry) = shift_target(emulator, instruction, resolved, |v| {
        ((v >> 1) | (v & 0x80), v & 0x01 != 0)
    })?;
    emulator
        .registers
        .update_flags(FlagUpdate::nz(result).c(carry));
    Ok(Flow::Next)
}

pub(super) fn lsr(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let (result, carry) = shift_target(emulator, instruction, resolved, |v| {
        (v >> 1, v & 0x01 != 0)
    })?;
    // a zero always comes in at the top
    emulator
        .registers
        .update_flags(FlagUpdate::new().n(false).z(result == 0).c(carry));
    Ok(Flow::Next)
}

/// Rotates the operand onto itself, the old C is not rotated in.
pub(super) fn rol(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let (result, carry) = shift_target(emulator, instruction, resolved, |v| {
        (v.rotate_left(1), v & 0x80 != 0)
    })?;
    emulator
        .registers
        .update_flags(FlagUpdate::nz(result).c(carry));
    Ok(Flow::Next)
}

pub(super) fn ror(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let (result, carry) = shift_target(emulator, instruction, resolved, |v| {
        (v.rotate_right(1), v & 0x01 != 0)
    })?;
    emulator
        .registers
        .update_flags(FlagUpdate::nz(result).c(carry));
    Ok(Flow::Next)
}
