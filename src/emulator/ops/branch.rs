use super::{Flow, Instruction, Mnemonic};
use crate::emulator::addressing::ResolvedOperand;
use crate::emulator::error::EmulatorError;
use crate::emulator::registers::ConditionCodes;
use crate::emulator::Emulator;

/// Whether a conditional branch is taken for the given flags and IRQ pin level.
pub fn condition_holds(mnemonic: Mnemonic, ccr: &ConditionCodes, irq_pin_high: bool) -> bool {
    match mnemonic {
        Mnemonic::Bra => true,
        Mnemonic::Brn => false,
        Mnemonic::Bhi => !(ccr.c || ccr.z),
        Mnemonic::Bls => ccr.c || ccr.z,
        Mnemonic::Bcc | Mnemonic::Bhs => !ccr.c,
        Mnemonic::Bcs | Mnemonic::Blo => ccr.c,
        Mnemonic::Bne => !ccr.z,
        Mnemonic::Beq => ccr.z,
        Mnemonic::Bhcc => !ccr.h,
        Mnemonic::Bhcs => ccr.h,
        Mnemonic::Bpl => !ccr.n,
        Mnemonic::Bmi => ccr.n,
        Mnemonic::Bmc => !ccr.i,
        Mnemonic::Bms => ccr.i,
        Mnemonic::Bil => !irq_pin_high,
        Mnemonic::Bih => irq_pin_high,
        _ => false,
    }
}

/// All relative branches. BRN still consumed its offset byte, the dispatcher
/// steps over it like any other operand.
pub(super) fn branch(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<Flow, EmulatorError> {
    let ccr = emulator.registers.ccr();
    if !condition_holds(instruction.mnemonic, &ccr, emulator.irq_pin_high) {
        tracing::trace!(mnemonic = %instruction.mnemonic, "branch not taken");
        return Ok(Flow::Next);
    }

    let target = resolved.operand.target()?;
    tracing::trace!(
        mnemonic = %instruction.mnemonic,
        target = format!("0x{target:04X}"),
        "branch taken"
    );
    emulator.registers.set_pc(target as u32)?;
    Ok(Flow::Jump)
}
