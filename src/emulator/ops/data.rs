use super::{write_target, Flow, Instruction};
use crate::emulator::addressing::ResolvedOperand;
use crate::emulator::error::EmulatorError;
use crate::emulator::registers::FlagUpdate;
use crate::emulator::Emulator;

pub(super) fn lda(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = resolved.operand.value(&emulator.memory)?;
    emulator.registers.set_a(value as u16)?;
    emulator.registers.update_flags(FlagUpdate::nz(value));
    Ok(Flow::Next)
}

pub(super) fn ldx(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = resolved.operand.value(&emulator.memory)?;
    emulator.registers.set_x(value as u16)?;
    emulator.registers.update_flags(FlagUpdate::nz(value));
    Ok(Flow::Next)
}

pub(super) fn sta(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let address = resolved.operand.address()?;
    let value = emulator.registers.a();
    emulator.memory.write_byte(address, value);
    emulator.registers.update_flags(FlagUpdate::nz(value));
    Ok(Flow::Next)
}

pub(super) fn stx(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let address = resolved.operand.address()?;
    let value = emulator.registers.x();
    emulator.memory.write_byte(address, value);
    emulator.registers.update_flags(FlagUpdate::nz(value));
    Ok(Flow::Next)
}

pub(super) fn tax(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = emulator.registers.a();
    emulator.registers.set_x(value as u16)?;
    emulator.registers.update_flags(FlagUpdate::nz(value));
    Ok(Flow::Next)
}

pub(super) fn txa(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let value = emulator.registers.x();
    emulator.registers.set_a(value as u16)?;
    emulator.registers.update_flags(FlagUpdate::nz(value));
    Ok(Flow::Next)
}

/// N=0, Z=1 whatever was there before.
pub(super) fn clr(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    write_target(emulator, instruction, resolved, 0)?;
    emulator
        .registers
        .update_flags(FlagUpdate::new().n(false).z(true));
    Ok(Flow::Next)
}
