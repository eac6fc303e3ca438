use std::fmt;
use std::str::FromStr;

use super::addressing::{AddressingMode, ResolvedOperand};
use super::error::EmulatorError;
use super::Emulator;

mod arithmetic;
mod bit;
mod branch;
mod control;
mod data;
mod logic;
mod shift;

pub(crate) use control::enter_interrupt;

/// What a handler did with the program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Fall through, the dispatcher advances PC past the instruction
    Next,
    /// The handler already wrote PC
    Jump,
}

/// Where a read-modify-write instruction reads from and writes back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Accumulator,
    Index,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Every mnemonic the instruction set knows. Register variants of the
/// read-modify-write group (`NEGA`, `CLRX` ...) share the base mnemonic and
/// differ in [`Instruction::target`].
pub enum Mnemonic {
    Add,
    Adc,
    Sub,
    Sbc,
    Mul,
    And,
    Ora,
    Eor,
    Neg,
    Com,
    Asl,
    Lsl,
    Asr,
    Lsr,
    Rol,
    Ror,
    Inc,
    Dec,
    Tst,
    Clr,
    Lda,
    Ldx,
    Sta,
    Stx,
    Tax,
    Txa,
    Cmp,
    Cpx,
    Bit,
    Bset,
    Bclr,
    Brset,
    Brclr,
    Bra,
    Brn,
    Bhi,
    Bls,
    Bcc,
    Bcs,
    Bhs,
    Blo,
    Bne,
    Beq,
    Bhcc,
    Bhcs,
    Bpl,
    Bmi,
    Bmc,
    Bms,
    Bil,
    Bih,
    Bsr,
    Jmp,
    Jsr,
    Rts,
    Rti,
    Swi,
    Clc,
    Sec,
    Cli,
    Sei,
    Rsp,
    Nop,
    Wait,
    Stop,
}

impl FromStr for Mnemonic {
    type Err = ();

    fn from_str(s: &str) -> Result<Mnemonic, ()> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "add" => Mnemonic::Add,
            "adc" => Mnemonic::Adc,
            "sub" => Mnemonic::Sub,
            "sbc" => Mnemonic::Sbc,
            "mul" => Mnemonic::Mul,
            "and" => Mnemonic::And,
            "ora" => Mnemonic::Ora,
            "eor" => Mnemonic::Eor,
            "neg" => Mnemonic::Neg,
            "com" => Mnemonic::Com,
            "asl" => Mnemonic::Asl,
            "lsl" => Mnemonic::Lsl,
            "asr" => Mnemonic::Asr,
            "lsr" => Mnemonic::Lsr,
            "rol" => Mnemonic::Rol,
            "ror" => Mnemonic::Ror,
            "inc" => Mnemonic::Inc,
            "dec" => Mnemonic::Dec,
            "tst" => Mnemonic::Tst,
            "clr" => Mnemonic::Clr,
            "lda" => Mnemonic::Lda,
            "ldx" => Mnemonic::Ldx,
            "sta" => Mnemonic::Sta,
            "stx" => Mnemonic::Stx,
            "tax" => Mnemonic::Tax,
            "txa" => Mnemonic::Txa,
            "cmp" => Mnemonic::Cmp,
            "cpx" => Mnemonic::Cpx,
            "bit" => Mnemonic::Bit,
            "bset" => Mnemonic::Bset,
            "bclr" => Mnemonic::Bclr,
            "brset" => Mnemonic::Brset,
            "brclr" => Mnemonic::Brclr,
            "bra" => Mnemonic::Bra,
            "brn" => Mnemonic::Brn,
            "bhi" => Mnemonic::Bhi,
            "bls" => Mnemonic::Bls,
            "bcc" => Mnemonic::Bcc,
            "bcs" => Mnemonic::Bcs,
            "bhs" => Mnemonic::Bhs,
            "blo" => Mnemonic::Blo,
            "bne" => Mnemonic::Bne,
            "beq" => Mnemonic::Beq,
            "bhcc" => Mnemonic::Bhcc,
            "bhcs" => Mnemonic::Bhcs,
            "bpl" => Mnemonic::Bpl,
            "bmi" => Mnemonic::Bmi,
            "bmc" => Mnemonic::Bmc,
            "bms" => Mnemonic::Bms,
            "bil" => Mnemonic::Bil,
            "bih" => Mnemonic::Bih,
            "bsr" => Mnemonic::Bsr,
            "jmp" => Mnemonic::Jmp,
            "jsr" => Mnemonic::Jsr,
            "rts" => Mnemonic::Rts,
            "rti" => Mnemonic::Rti,
            "swi" => Mnemonic::Swi,
            "clc" => Mnemonic::Clc,
            "sec" => Mnemonic::Sec,
            "cli" => Mnemonic::Cli,
            "sei" => Mnemonic::Sei,
            "rsp" => Mnemonic::Rsp,
            "nop" => Mnemonic::Nop,
            "wait" => Mnemonic::Wait,
            "stop" => Mnemonic::Stop,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("{self:?}").to_ascii_lowercase();
        write!(f, "{name}")
    }
}

/// Which operand shapes a mnemonic accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// No operand at all
    Inherent,
    /// Register (inherent) or memory operand, read-modify-write
    ReadModifyWrite,
    /// A value: immediate or memory
    Value,
    /// A memory address, no immediates
    Address,
    Relative,
    BitDirect,
    BitBranch,
}

fn is_memory_mode(mode: AddressingMode) -> bool {
    matches!(
        mode,
        AddressingMode::Direct
            | AddressingMode::Extended
            | AddressingMode::Indexed
            | AddressingMode::Indexed8
            | AddressingMode::Indexed16
    )
}

impl Mnemonic {
    fn shape(&self) -> Shape {
        use Mnemonic::*;
        match self {
            Add | Adc | Sub | Sbc | And | Ora | Eor | Lda | Ldx | Cmp | Cpx | Bit => Shape::Value,
            Neg | Com | Asl | Lsl | Asr | Lsr | Rol | Ror | Inc | Dec | Tst | Clr => {
                Shape::ReadModifyWrite
            }
            Sta | Stx | Jmp | Jsr => Shape::Address,
            Bset | Bclr => Shape::BitDirect,
            Brset | Brclr => Shape::BitBranch,
            Bra | Brn | Bhi | Bls | Bcc | Bcs | Bhs | Blo | Bne | Beq | Bhcc | Bhcs | Bpl | Bmi
            | Bmc | Bms | Bil | Bih | Bsr => Shape::Relative,
            Mul | Tax | Txa | Rts | Rti | Swi | Clc | Sec | Cli | Sei | Rsp | Nop | Wait
            | Stop => Shape::Inherent,
        }
    }

    /// Does the mnemonic take an `a`/`x` suffix for its register forms.
    pub fn is_read_modify_write(&self) -> bool {
        self.shape() == Shape::ReadModifyWrite
    }

    /// Resolve the handler for this mnemonic. Done once when the opcode table
    /// is built, never per step.
    fn handler(&self) -> Handler {
        use Mnemonic::*;
        match self {
            Add => arithmetic::add,
            Adc => arithmetic::adc,
            Sub => arithmetic::sub,
            Sbc => arithmetic::sbc,
            Mul => arithmetic::mul,
            Neg => arithmetic::neg,
            Com => arithmetic::com,
            Inc => arithmetic::inc,
            Dec => arithmetic::dec,
            And => logic::and,
            Ora => logic::ora,
            Eor => logic::eor,
            Bit => logic::bit,
            Cmp => logic::cmp,
            Cpx => logic::cpx,
            Tst => logic::tst,
            Asl | Lsl => shift::asl,
            Asr => shift::asr,
            Lsr => shift::lsr,
            Rol => shift::rol,
            Ror => shift::ror,
            Lda => data::lda,
            Ldx => data::ldx,
            Sta => data::sta,
            Stx => data::stx,
            Tax => data::tax,
            Txa => data::txa,
            Clr => data::clr,
            Bset => bit::bset,
            Bclr => bit::bclr,
            Brset => bit::brset,
            Brclr => bit::brclr,
            Bra | Brn | Bhi | Bls | Bcc | Bcs | Bhs | Blo | Bne | Beq | Bhcc | Bhcs | Bpl | Bmi
            | Bmc | Bms | Bil | Bih => branch::branch,
            Bsr => control::bsr,
            Jmp => control::jmp,
            Jsr => control::jsr,
            Rts => control::rts,
            Rti => control::rti,
            Swi => control::swi,
            Clc => control::clc,
            Sec => control::sec,
            Cli => control::cli,
            Sei => control::sei,
            Rsp => control::rsp,
            Nop | Wait | Stop => control::nop,
        }
    }
}

type Handler = fn(&mut Emulator, &Instruction, &ResolvedOperand) -> Result<Flow, EmulatorError>;

#[derive(Clone, Copy)]
/// A decoded opcode: mnemonic, addressing mode and the handler that runs it.
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Destination of read-modify-write instructions
    pub target: Target,
    /// Bit number for BSET/BCLR/BRSET/BRCLR, taken from the opcode byte
    pub bit: u8,
    handler: Handler,
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruction")
            .field("mnemonic", &self.mnemonic)
            .field("mode", &self.mode)
            .field("target", &self.target)
            .field("bit", &self.bit)
            .finish()
    }
}

impl Instruction {
    /// Build the instruction for `opcode` from its table mnemonic (`"nega"`,
    /// `"brset"`, `"lda"` ...). Fails if the mnemonic does not fit the
    /// addressing mode the opcode's column implies.
    pub fn decode(mnemonic_text: &str, opcode: u8) -> Result<Self, String> {
        let mode = AddressingMode::from_opcode(opcode);
        let text = mnemonic_text.trim().to_ascii_lowercase();

        let (mnemonic, suffix) = match text.parse::<Mnemonic>() {
            Ok(mnemonic) => (mnemonic, None),
            Err(()) => split_register_suffix(&text)
                .ok_or_else(|| format!("unknown mnemonic '{mnemonic_text}'"))?,
        };

        let shape = mnemonic.shape();
        let mut target = Target::Memory;
        let fits = match shape {
            Shape::Inherent => mode == AddressingMode::Inherent,
            Shape::ReadModifyWrite => match (mode, suffix) {
                (AddressingMode::Inherent, Some(register)) => {
                    target = register;
                    true
                }
                (mode, None) => is_memory_mode(mode),
                _ => false,
            },
            Shape::Value => mode == AddressingMode::Immediate || is_memory_mode(mode),
            Shape::Address => is_memory_mode(mode),
            Shape::Relative => mode == AddressingMode::Relative,
            Shape::BitDirect => mode == AddressingMode::Direct,
            Shape::BitBranch => mode == AddressingMode::DirectRelative,
        };
        if !fits {
            return Err(format!(
                "'{mnemonic_text}' cannot use {mode:?} addressing (opcode 0x{opcode:02x})"
            ));
        }

        let bit = match shape {
            Shape::BitDirect | Shape::BitBranch => (opcode >> 1) & 0b111,
            _ => 0,
        };

        Ok(Self {
            mnemonic,
            mode,
            target,
            bit,
            handler: mnemonic.handler(),
        })
    }

    pub fn execute(
        &self,
        emulator: &mut Emulator,
        resolved: &ResolvedOperand,
    ) -> Result<Flow, EmulatorError> {
        (self.handler)(emulator, self, resolved)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        match (self.mode, self.target) {
            (AddressingMode::Inherent, Target::Accumulator) => write!(f, "a"),
            (AddressingMode::Inherent, Target::Index) => write!(f, "x"),
            _ => Ok(()),
        }
    }
}

fn split_register_suffix(text: &str) -> Option<(Mnemonic, Option<Target>)> {
    let (base, register) = if let Some(base) = text.strip_suffix('a') {
        (base, Target::Accumulator)
    } else if let Some(base) = text.strip_suffix('x') {
        (base, Target::Index)
    } else {
        return None;
    };
    let mnemonic = base.parse::<Mnemonic>().ok()?;
    mnemonic
        .is_read_modify_write()
        .then_some((mnemonic, Some(register)))
}

/// Read the operand of a read-modify-write instruction.
fn read_target(
    emulator: &Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
) -> Result<u8, EmulatorError> {
    Ok(match instruction.target {
        Target::Accumulator => emulator.registers.a(),
        Target::Index => emulator.registers.x(),
        Target::Memory => resolved.operand.value(&emulator.memory)?,
    })
}

fn write_target(
    emulator: &mut Emulator,
    instruction: &Instruction,
    resolved: &ResolvedOperand,
    value: u8,
) -> Result<(), EmulatorError> {
    match instruction.target {
        Target::Accumulator => emulator.registers.set_a(value as u16),
        Target::Index => emulator.registers.set_x(value as u16),
        Target::Memory => {
            let address = resolved.operand.address()?;
            emulator.memory.write_byte(address, value);
            Ok(())
        }
    }
}
