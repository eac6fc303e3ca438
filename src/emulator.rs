pub mod addressing;
pub mod config;
pub mod error;
pub mod memory;
pub mod opcode_table;
pub mod ops;
pub mod registers;
pub mod stack;
pub mod trace;

use std::fmt;
use std::sync::Arc;

pub use addressing::{AddressingMode, Operand, ResolvedOperand};
pub use config::{ConfigError, EmulatorConfig};
pub use error::{EmulatorError, RegisterName};
pub use memory::{IntoAddress, Memory, MemoryRegion};
pub use opcode_table::{OpcodeDescriptor, OpcodeTable, DEFAULT_OPCODE_TABLE};
pub use ops::{Flow, Instruction, Mnemonic, Target};
pub use registers::{ConditionCodes, Flag, FlagUpdate, RegisterFile};
pub use stack::Stack;
pub use trace::DecodedInstruction;

/// External interrupt lines the host can signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptSource {
    /// The external IRQ pin
    Irq,
    /// The timer overflow/compare interrupt
    Timer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Register state at one point in time, for comparing runs.
pub struct CpuSnapshot {
    pub a: u8,
    pub x: u8,
    pub pc: u16,
    pub sp: u16,
    pub ccr: ConditionCodes,
}

impl fmt::Display for CpuSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A=0x{:02X} X=0x{:02X} PC=0x{:04X} SP=0x{:04X} CCR={}",
            self.a, self.x, self.pc, self.sp, self.ccr
        )
    }
}

#[derive(Debug, Clone)]
pub struct Emulator {
    pub registers: RegisterFile,
    pub memory: Memory,
    /// Level of the external IRQ pin, tested by BIH/BIL
    pub irq_pin_high: bool,
    /// Fail calls and interrupts that would wrap the stack onto live entries
    /// instead of letting the ring overwrite them. Off by default.
    pub debug_stack_checks: bool,

    // read only after construction
    opcodes: Arc<OpcodeTable>,
    config: EmulatorConfig,

    steps: u64,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    /// An emulator with the default configuration and the built in opcode map.
    pub fn new() -> Emulator {
        Self::build(EmulatorConfig::default(), Arc::clone(&DEFAULT_OPCODE_TABLE))
    }

    pub fn with_config(config: EmulatorConfig) -> Result<Emulator, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, Arc::clone(&DEFAULT_OPCODE_TABLE)))
    }

    /// Use a custom opcode table in place of the built in one.
    pub fn with_opcode_table(mut self, opcodes: Arc<OpcodeTable>) -> Emulator {
        tracing::debug!("Using opcode table with {} entries", opcodes.len());
        self.opcodes = opcodes;
        self
    }

    fn build(config: EmulatorConfig, opcodes: Arc<OpcodeTable>) -> Emulator {
        let stack = Stack::new(config.stack_top, config.stack_size, config.fill_byte);
        let mut registers = RegisterFile::new(stack);
        registers.jump(config.reset_pc);

        Self {
            registers,
            memory: Memory::new(config.fill_byte),
            irq_pin_high: true,
            debug_stack_checks: false,
            opcodes,
            config,
            steps: 0,
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn opcode_table(&self) -> &OpcodeTable {
        &self.opcodes
    }

    /// Instructions executed since construction or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            a: self.registers.a(),
            x: self.registers.x(),
            pc: self.registers.pc(),
            sp: self.registers.sp(),
            ccr: self.registers.ccr(),
        }
    }

    /// Registers, flags and SP back to their reset values. Memory is kept.
    pub fn reset(&mut self) {
        let span = tracing::info_span!("reset");
        let _guard = span.enter();

        self.registers.reset();
        self.registers.jump(self.config.reset_pc);
        self.steps = 0;
        tracing::info!("CPU reset, PC=0x{:04X}", self.registers.pc());
    }

    /// [`reset`](Self::reset), then take PC from the reset vector like a power-on.
    pub fn reset_from_vector(&mut self) -> Result<(), EmulatorError> {
        self.reset();
        let entry = self.memory.read_word(self.config.reset_vector)?;
        self.registers.set_pc(entry as u32)?;
        tracing::info!("Reset vector points at 0x{:04X}", entry);
        Ok(())
    }

    /// With [`debug_stack_checks`](Self::debug_stack_checks) on, errors if
    /// pushing `bytes` more would overwrite live stack entries.
    pub fn check_stack_room(&self, bytes: usize) -> Result<(), EmulatorError> {
        if !self.debug_stack_checks {
            return Ok(());
        }
        self.registers.stack().check_depth(bytes)
    }

    /// Write `program` at `start_address` and point PC at it.
    pub fn load_program(
        &mut self,
        start_address: impl IntoAddress,
        program: &[u8],
    ) -> Result<(), EmulatorError> {
        let start = start_address.into_address()?;
        self.memory.load_program(start, program)?;
        self.registers.set_pc(start as u32)?;
        tracing::debug!("PC set to start address 0x{:04X}", start);
        Ok(())
    }
}

// emulator logic core
impl Emulator {
    /// The opcode byte at PC.
    pub fn fetch(&self) -> u8 {
        let span = tracing::debug_span!("fetch");
        let _guard = span.enter();

        let pc = self.registers.pc();
        let opcode = self.memory.read_byte(pc);
        tracing::trace!("Fetched opcode 0x{:02X} at PC=0x{:04X}", opcode, pc);
        opcode
    }

    /// Look `opcode` up in the table.
    pub fn decode(&self, opcode: u8) -> Result<&OpcodeDescriptor, EmulatorError> {
        let span = tracing::debug_span!("decode", opcode = format!("0x{opcode:02X}"));
        let _guard = span.enter();

        match self.opcodes.get(opcode) {
            Some(descriptor) => {
                tracing::trace!("Decoded 0x{:02X} as {}", opcode, descriptor.instruction);
                Ok(descriptor)
            }
            None => {
                let pc = self.registers.pc();
                tracing::error!("Unknown opcode 0x{:02X} at PC=0x{:04X}", opcode, pc);
                Err(EmulatorError::UnknownOpcode { opcode, pc })
            }
        }
    }

    /// Run one whole instruction.
    ///
    /// On [`EmulatorError::UnknownOpcode`] nothing has changed. Any other error
    /// leaves whatever the instruction already wrote in place.
    pub fn step(&mut self) -> Result<(), EmulatorError> {
        let pc = self.registers.pc();
        let span = tracing::info_span!("step", pc = format!("0x{pc:04X}"));
        let _guard = span.enter();

        let opcode = self.fetch();
        let instruction = self.decode(opcode)?.instruction;
        let resolved = addressing::resolve(instruction.mode, pc, &self.memory, self.registers.x())?;

        let flow = {
            let span = tracing::debug_span!("execute", instruction = %instruction);
            let _guard = span.enter();
            tracing::debug!("Executing {} {}", instruction, resolved);
            instruction.execute(self, &resolved)?
        };

        if flow == Flow::Next {
            self.registers.set_pc(resolved.next_pc as u32)?;
        }
        self.steps += 1;

        tracing::debug!("Post-execution state: {}", self.snapshot());
        Ok(())
    }

    /// Step until `max_steps` instructions ran or one fails. Returns how many ran.
    pub fn run(&mut self, max_steps: usize) -> Result<usize, EmulatorError> {
        let span = tracing::info_span!("run", max_steps);
        let _guard = span.enter();

        for executed in 0..max_steps {
            if let Err(e) = self.step() {
                tracing::error!("Execution failed after {} steps: {}", executed, e);
                return Err(e);
            }
        }

        tracing::info!("Reached maximum steps ({}), stopping execution", max_steps);
        Ok(max_steps)
    }

    /// Take a pending external interrupt.
    ///
    /// Returns `Ok(false)` without touching anything while interrupts are
    /// masked. Otherwise stacks the CPU state like SWI, with the current PC
    /// as the return address, and jumps through the source's vector.
    pub fn service_interrupt(&mut self, source: InterruptSource) -> Result<bool, EmulatorError> {
        let span = tracing::info_span!("service_interrupt", source = ?source);
        let _guard = span.enter();

        if self.registers.flag(Flag::I) {
            tracing::debug!("Interrupt masked, not taken");
            return Ok(false);
        }

        let vector = match source {
            InterruptSource::Irq => self.config.irq_vector,
            InterruptSource::Timer => self.config.timer_vector,
        };
        let return_address = self.registers.pc();
        ops::enter_interrupt(self, return_address, vector)?;
        Ok(true)
    }
}
