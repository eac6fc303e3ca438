use std::fmt;

use super::error::{EmulatorError, RegisterName};
use super::stack::Stack;

/// One bit of the condition code register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Carry / borrow
    C,
    /// Zero
    Z,
    /// Negative
    N,
    /// Interrupt mask
    I,
    /// Half carry (out of bit 3)
    H,
}

impl Flag {
    pub const ALL: [Flag; 5] = [Flag::H, Flag::I, Flag::N, Flag::Z, Flag::C];

    /// Bit position in the stacked CCR byte.
    pub fn bit(&self) -> u8 {
        match self {
            Flag::C => 0,
            Flag::Z => 1,
            Flag::N => 2,
            Flag::I => 3,
            Flag::H => 4,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Flag::C => "C",
            Flag::Z => "Z",
            Flag::N => "N",
            Flag::I => "I",
            Flag::H => "H",
        };
        write!(f, "{letter}")
    }
}

/// Bits 7..5 of the CCR are unimplemented and always read as one.
pub const CCR_RESERVED: u8 = 0b1110_0000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// The condition code register as named bits.
pub struct ConditionCodes {
    pub c: bool,
    pub z: bool,
    pub n: bool,
    pub i: bool,
    pub h: bool,
}

impl ConditionCodes {
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::C => self.c,
            Flag::Z => self.z,
            Flag::N => self.n,
            Flag::I => self.i,
            Flag::H => self.h,
        }
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::C => self.c = value,
            Flag::Z => self.z = value,
            Flag::N => self.n = value,
            Flag::I => self.i = value,
            Flag::H => self.h = value,
        }
    }

    /// `111H_INZC`, the layout pushed by SWI and interrupts.
    pub fn to_byte(&self) -> u8 {
        Flag::ALL
            .into_iter()
            .filter(|flag| self.get(*flag))
            .fold(CCR_RESERVED, |byte, flag| byte | (1 << flag.bit()))
    }

    pub fn from_byte(byte: u8) -> Self {
        let mut ccr = Self::default();
        for flag in Flag::ALL {
            ccr.set(flag, byte & (1 << flag.bit()) != 0);
        }
        ccr
    }
}

impl fmt::Display for ConditionCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in Flag::ALL {
            if self.get(flag) {
                write!(f, "{flag}")?;
            } else {
                write!(f, "-")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// A partial set of flag writes. Flags left as `None` are not touched.
pub struct FlagUpdate {
    pub c: Option<bool>,
    pub z: Option<bool>,
    pub n: Option<bool>,
    pub i: Option<bool>,
    pub h: Option<bool>,
}

impl FlagUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// N and Z derived from an 8 bit result.
    pub fn nz(value: u8) -> Self {
        Self::new().n(value & 0x80 != 0).z(value == 0)
    }

    pub fn c(mut self, value: bool) -> Self {
        self.c = Some(value);
        self
    }

    pub fn z(mut self, value: bool) -> Self {
        self.z = Some(value);
        self
    }

    pub fn n(mut self, value: bool) -> Self {
        self.n = Some(value);
        self
    }

    pub fn i(mut self, value: bool) -> Self {
        self.i = Some(value);
        self
    }

    pub fn h(mut self, value: bool) -> Self {
        self.h = Some(value);
        self
    }
}

#[derive(Debug, Clone)]
/// CPU registers. The stack pointer is owned by the [`Stack`] and only
/// mirrored here through [`RegisterFile::sp`].
pub struct RegisterFile {
    a: u8,
    x: u8,
    pc: u16,
    ccr: ConditionCodes,
    stack: Stack,
}

impl RegisterFile {
    pub fn new(stack: Stack) -> Self {
        Self {
            a: 0,
            x: 0,
            pc: 0,
            ccr: ConditionCodes::default(),
            stack,
        }
    }

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.stack.sp()
    }

    pub fn ccr(&self) -> ConditionCodes {
        self.ccr
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.ccr.get(flag)
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Values wider than 8 bits are rejected, not truncated.
    pub fn set_a(&mut self, value: u16) -> Result<(), EmulatorError> {
        self.a = u8::try_from(value)
            .map_err(|_| EmulatorError::width(RegisterName::A, value as u32, 0xFF))?;
        tracing::trace!(a = format!("0x{:02X}", self.a), "set A");
        Ok(())
    }

    pub fn set_x(&mut self, value: u16) -> Result<(), EmulatorError> {
        self.x = u8::try_from(value)
            .map_err(|_| EmulatorError::width(RegisterName::X, value as u32, 0xFF))?;
        tracing::trace!(x = format!("0x{:02X}", self.x), "set X");
        Ok(())
    }

    pub fn set_pc(&mut self, value: u32) -> Result<(), EmulatorError> {
        self.pc = u16::try_from(value)
            .map_err(|_| EmulatorError::width(RegisterName::Pc, value, 0xFFFF))?;
        tracing::trace!(pc = format!("0x{:04X}", self.pc), "set PC");
        Ok(())
    }

    /// Load PC from an address that already has PC's width.
    pub(crate) fn jump(&mut self, address: u16) {
        self.pc = address;
        tracing::trace!(pc = format!("0x{:04X}", self.pc), "set PC");
    }

    pub fn set_ccr(&mut self, ccr: ConditionCodes) {
        self.ccr = ccr;
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.ccr.set(flag, true);
    }

    pub fn clear_flag(&mut self, flag: Flag) {
        self.ccr.set(flag, false);
    }

    pub fn toggle_flag(&mut self, flag: Flag) {
        self.ccr.set(flag, !self.ccr.get(flag));
    }

    /// Merge `update` into the CCR, leaving unmentioned flags alone.
    pub fn update_flags(&mut self, update: FlagUpdate) {
        let FlagUpdate { c, z, n, i, h } = update;
        for (flag, value) in [
            (Flag::C, c),
            (Flag::Z, z),
            (Flag::N, n),
            (Flag::I, i),
            (Flag::H, h),
        ] {
            if let Some(value) = value {
                self.ccr.set(flag, value);
            }
        }
        tracing::trace!(
            n = self.ccr.n,
            z = self.ccr.z,
            c = self.ccr.c,
            h = self.ccr.h,
            i = self.ccr.i,
            "Updated flags"
        );
    }

    pub fn push(&mut self, value: u8) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> u8 {
        self.stack.pop()
    }

    /// Push a 16 bit value low byte first, the order the CPU stacks the PC in.
    pub fn push_word(&mut self, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.push(low);
        self.push(high);
    }

    pub fn pop_word(&mut self) -> u16 {
        let high = self.pop();
        let low = self.pop();
        u16::from_be_bytes([high, low])
    }

    pub fn reset_stack_pointer(&mut self, address: u16) -> Result<(), EmulatorError> {
        self.stack.reset_pointer(address)
    }

    /// Back to architectural reset values: registers and flags cleared, SP at top.
    pub fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.pc = 0;
        self.ccr = ConditionCodes::default();
        self.stack.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registers() -> RegisterFile {
        RegisterFile::new(Stack::new(0x00FF, 64, 0x9D))
    }

    #[test]
    fn reset_values() {
        let regs = registers();
        assert_eq!((regs.a(), regs.x(), regs.pc(), regs.sp()), (0, 0, 0, 0x00FF));
        assert_eq!(regs.ccr(), ConditionCodes::default());
    }

    #[test]
    fn width_violations_are_signalled() {
        let mut regs = registers();
        assert!(regs.set_a(0xFF).is_ok());
        assert_eq!(
            regs.set_a(0x100),
            Err(EmulatorError::RegisterWidthViolation {
                register: RegisterName::A,
                value: 0x100,
                max: 0xFF
            })
        );
        assert_eq!(regs.a(), 0xFF);
        assert!(regs.set_x(0x1FF).is_err());
        assert!(regs.set_pc(0xFFFF).is_ok());
        assert!(regs.set_pc(0x1_0000).is_err());
        assert_eq!(regs.pc(), 0xFFFF);
    }

    #[test]
    fn update_flags_only_touches_named_flags() {
        let mut regs = registers();
        regs.set_flag(Flag::I);
        regs.set_flag(Flag::C);
        regs.update_flags(FlagUpdate::new().z(true).c(false));
        assert!(regs.flag(Flag::I));
        assert!(regs.flag(Flag::Z));
        assert!(!regs.flag(Flag::C));
        assert!(!regs.flag(Flag::N));
    }

    #[test]
    fn ccr_byte_layout() {
        let ccr = ConditionCodes {
            h: true,
            c: true,
            ..Default::default()
        };
        assert_eq!(ccr.to_byte(), 0b1111_0001);
        assert_eq!(ConditionCodes::from_byte(0b1111_0001), ccr);
        assert_eq!(ConditionCodes::default().to_byte(), CCR_RESERVED);
        assert_eq!(ccr.to_string(), "H---C");
    }

    #[test]
    fn reset_empties_the_stack() {
        let mut regs = registers();
        regs.jump(0x1234);
        regs.push_word(0xBEEF);
        regs.set_flag(Flag::C);
        regs.reset();
        assert_eq!((regs.pc(), regs.sp()), (0, 0x00FF));
        assert_eq!(regs.stack().live(), 0);
        assert!(!regs.flag(Flag::C));
    }

    #[test]
    fn words_are_stacked_low_byte_first() {
        let mut regs = registers();
        regs.push_word(0x1234);
        assert_eq!(regs.sp(), 0x00FD);
        assert_eq!(regs.pop_word(), 0x1234);
        assert_eq!(regs.sp(), 0x00FF);
    }
}
