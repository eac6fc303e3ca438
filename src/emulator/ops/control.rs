//! Jumps, subroutine and interrupt linkage, and the CCR control instructions.

use super::{Flow, Instruction};
use crate::emulator::addressing::ResolvedOperand;
use crate::emulator::error::EmulatorError;
use crate::emulator::registers::{ConditionCodes, Flag};
use crate::emulator::Emulator;

/// Stack the machine state the way SWI and hardware interrupts do
/// (PCL, PCH, X, A, CCR), mask interrupts and load PC from `vector`.
pub(crate) fn enter_interrupt(
    emulator: &mut Emulator,
    return_address: u16,
    vector: u16,
) -> Result<(), EmulatorError> {
    let span = tracing::debug_span!("enter_interrupt", vector = format!("0x{vector:04X}"));
    let _guard = span.enter();

    emulator.check_stack_room(5)?;
    let registers = &mut emulator.registers;
    registers.push_word(return_address);
    let (x, a, ccr) = (registers.x(), registers.a(), registers.ccr());
    registers.push(x);
    registers.push(a);
    registers.push(ccr.to_byte());
    registers.set_flag(Flag::I);

    let handler = emulator.memory.read_word(vector)?;
    emulator.registers.set_pc(handler as u32)?;
    tracing::debug!(
        return_address = format!("0x{return_address:04X}"),
        handler = format!("0x{handler:04X}"),
        "Entered interrupt"
    );
    Ok(())
}

pub(super) fn jmp(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let target = resolved.operand.address()?;
    emulator.registers.set_pc(target as u32)?;
    Ok(Flow::Jump)
}

/// Push the address after the whole JSR, then jump.
pub(super) fn jsr(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let target = resolved.operand.address()?;
    emulator.check_stack_room(2)?;
    emulator.registers.push_word(resolved.next_pc);
    emulator.registers.set_pc(target as u32)?;
    Ok(Flow::Jump)
}

pub(super) fn bsr(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let target = resolved.operand.target()?;
    emulator.check_stack_room(2)?;
    emulator.registers.push_word(resolved.next_pc);
    emulator.registers.set_pc(target as u32)?;
    Ok(Flow::Jump)
}

pub(super) fn rts(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let address = emulator.registers.pop_word();
    emulator.registers.set_pc(address as u32)?;
    Ok(Flow::Jump)
}

pub(super) fn swi(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let vector = emulator.config().swi_vector;
    enter_interrupt(emulator, resolved.next_pc, vector)?;
    Ok(Flow::Jump)
}

/// Unstack CCR, A, X and PC, the reverse of [`enter_interrupt`].
pub(super) fn rti(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let registers = &mut emulator.registers;
    let ccr = ConditionCodes::from_byte(registers.pop());
    registers.set_ccr(ccr);
    let a = registers.pop();
    registers.set_a(a as u16)?;
    let x = registers.pop();
    registers.set_x(x as u16)?;
    let address = registers.pop_word();
    registers.set_pc(address as u32)?;
    tracing::debug!(pc = format!("0x{address:04X}"), "Returned from interrupt");
    Ok(Flow::Jump)
}

pub(super) fn clc(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    emulator.registers.clear_flag(Flag::C);
    Ok(Flow::Next)
}

pub(super) fn sec(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    emulator.registers.set_flag(Flag::C);
    Ok(Flow::Next)
}

pub(super) fn cli(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    emulator.registers.clear_flag(Flag::I);
    Ok(Flow::Next)
}

pub(super) fn sei(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    emulator.registers.set_flag(Flag::I);
    Ok(Flow::Next)
}

pub(super) fn rsp(
    emulator: &mut Emulator,
    _instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let top = emulator.config().stack_top;
    emulator.registers.reset_stack_pointer(top)?;
    Ok(Flow::Next)
}

/// NOP, and WAIT/STOP: low power modes are not modelled, they only step over
/// their encoding.
pub(super) fn nop(
    _emulator: &mut Emulator,
    instruction: &Instruction,
    _resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    tracing::trace!(mnemonic = %instruction.mnemonic, "no operation");
    Ok(Flow::Next)
}
