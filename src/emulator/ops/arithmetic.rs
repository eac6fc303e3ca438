//! ADD/ADC/SUB/SBC, MUL and the NEG/COM/INC/DEC read-modify-write group.

use super::{read_target, write_target, Flow, Instruction};
use crate::emulator::addressing::ResolvedOperand;
use crate::emulator::error::EmulatorError;
use crate::emulator::registers::{Flag, FlagUpdate};
use crate::emulator::Emulator;

/// A + operand + carry_in, with C and H taken from the unmasked sums.
fn add_to_accumulator(
    emulator: &mut Emulator,
    operand: u8,
    carry_in: bool,
) -> Result<Flow, EmulatorError> {
    let a = emulator.registers.a();
    let carry = carry_in as u16;
    let sum = a as u16 + operand as u16 + carry;
    let half_sum = (a & 0x0F) as u16 + (operand & 0x0F) as u16 + carry;
    let result = (sum & 0xFF) as u8;

    emulator.registers.set_a(result as u16)?;
    emulator
        .registers
        .update_flags(FlagUpdate::nz(result).c(sum > 0xFF).h(half_sum > 0x0F));

    tracing::trace!(a, operand, carry_in, result, "add");
    Ok(Flow::Next)
}

/// A - operand - borrow_in. C is set when the minuend was smaller, H is untouched.
fn subtract_from_accumulator(
    emulator: &mut Emulator,
    operand: u8,
    borrow_in: bool,
) -> Result<Flow, EmulatorError> {
    let a = emulator.registers.a();
    let subtrahend = operand as u16 + borrow_in as u16;
    let result = (a as u16).wrapping_sub(subtrahend) as u8;

    emulator.registers.set_a(result as u16)?;
    emulator
        .registers
        .update_flags(FlagUpdate::nz(result).c((a as u16) < subtrahend));

    tracing::trace!(a, operand, borrow_in, result, "subtract");
    Ok(Flow::Next)
}

pub(super) fn add(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let operand = resolved.operand.value(&emulator.memory)?;
    add_to_accumulator(emulator, operand, false)
}

pub(super) fn adc(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let operand = resolved.operand.value(&emulator.memory)?;
    let carry = emulator.registers.flag(Flag::C);
    add_to_accumulator(emulator, operand, carry)
}

pub(super) fn sub(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let operand = resolved.operand.value(&emulator.memory)?;
    subtract_from_accumulator(emulator, operand, false)
}

pub(super) fn sbc(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let operand = resolved.operand.value(&emulator.memory)?;
    let borrow = emulator.registers.flag(Flag::C);
    subtract_from_accumulator(emulator, operand, borrow)
}

/// Low byte of A * X into A. Not part of every family member, so flags are
/// left alone.
pub(super) fn mul(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let product = emulator.registers.a() as u16 * emulator.registers.x() as u16;
    emulator.registers.set_a(product & 0xFF)?;
    tracing::trace!(product, "mul");
    Ok(Flow::Next)
}

/// Two's complement. C is the borrow out of `0 - m`, so it is set for any
/// non-zero result.
pub(super) fn neg(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = read_target(emulator, instruction, resolved)?;
    let result = 0u8.wrapping_sub(value);
    write_target(emulator, instruction, resolved, result)?;
    emulator
        .registers
        .update_flags(FlagUpdate::nz(result).c(result != 0));
    Ok(Flow::Next)
}

/// One's complement, C is always set.
pub(super) fn com(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = read_target(emulator, instruction, resolved)?;
    let result = !value;
    write_target(emulator, instruction, resolved, result)?;
    emulator
        .registers
        .update_flags(FlagUpdate::nz(result).c(true));
    Ok(Flow::Next)
}

pub(super) fn inc(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = read_target(emulator, instruction, resolved)?;
    let result = ((value as u16 + 1) & 0xFF) as u8;
    write_target(emulator, instruction, resolved, result)?;
    emulator.registers.update_flags(FlagUpdate::nz(result));
    Ok(Flow::Next)
}

pub(super) fn dec(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = read_target(emulator, instruction, resolved)?;
    let result = value.wrapping_sub(1);
    write_target(emulator, instruction, resolved, result)?;
    emulator.registers.update_flags(FlagUpdate::nz(result));
    Ok(Flow::Next)
}
