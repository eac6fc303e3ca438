//! Bitwise operations, compares and tests. None of these touch H.

use super::{read_target, Flow, Instruction};
use crate::emulator::addressing::ResolvedOperand;
use crate::emulator::error::EmulatorError;
use crate::emulator::registers::FlagUpdate;
use crate::emulator::Emulator;

fn combine_accumulator(
    emulator: &mut Emulator,
    resolved: &ResolvedOperand,
    op: fn(u8, u8) -> u8,
) -> Result<Flow, EmulatorError> {
    let operand = resolved.operand.value(&emulator.memory)?;
    let result = op(emulator.registers.a(), operand);
    emulator.registers.set_a(result as u16)?;
    emulator.registers.update_flags(FlagUpdate::nz(result));
    Ok(Flow::Next)
}

/// `register - operand` for flags only.
fn compare(register: u8, operand: u8) -> FlagUpdate {
    let difference = register.wrapping_sub(operand);
    tracing::trace!(register, operand, difference, "compare");
    FlagUpdate::nz(difference).c(register < operand)
}

pub(super) fn and(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    combine_accumulator(emulator, resolved, |a, m| a & m)
}

pub(super) fn ora(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    combine_accumulator(emulator, resolved, |a, m| a | m)
}

pub(super) fn eor(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    combine_accumulator(emulator, resolved, |a, m| a ^ m)
}

/// AND without storing the result.
pub(super) fn bit(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let operand = resolved.operand.value(&emulator.memory)?;
    let result = emulator.registers.a() & operand;
    emulator.registers.update_flags(FlagUpdate::nz(result));
    Ok(Flow::Next)
}

pub(super) fn cmp(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let operand = resolved.operand.value(&emulator.memory)?;
    let flags = compare(emulator.registers.a(), operand);
    emulator.registers.update_flags(flags);
    Ok(Flow::Next)
}

pub(super) fn cpx(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let operand = resolved.operand.value(&emulator.memory)?;
    let flags = compare(emulator.registers.x(), operand);
    emulator.registers.update_flags(flags);
    Ok(Flow::Next)
}

pub(super) fn tst(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = read_target(emulator, instruction, resolved)?;
    emulator.registers.update_flags(FlagUpdate::nz(value));
    Ok(Flow::Next)
}
