use std::sync::Arc;

use lazy_static::lazy_static;
use rustc_hash::FxHashMap as HashMap;

use super::addressing::AddressingMode;
use super::error::EmulatorError;
use super::ops::Instruction;

lazy_static! {
    /// The 68HC05 map shipped with the crate, parsed once and shared by every
    /// emulator that does not bring its own table.
    pub static ref DEFAULT_OPCODE_TABLE: Arc<OpcodeTable> = Arc::new(
        OpcodeTable::parse(include_str!("../../assets/opcode_map.csv"))
            .expect("embedded opcode map is valid")
    );
}

#[derive(Debug, Clone)]
/// One table record: what an opcode byte means and how many operand bytes follow it.
pub struct OpcodeDescriptor {
    pub opcode: u8,
    /// Mnemonic as written in the table (`"nega"`, `"lda"` ...)
    pub mnemonic: String,
    /// Size of each operand field; empty for no operands
    pub operand_sizes: Vec<u8>,
    pub instruction: Instruction,
}

impl OpcodeDescriptor {
    pub fn mode(&self) -> AddressingMode {
        self.instruction.mode
    }

    pub fn operand_bytes(&self) -> u16 {
        self.operand_sizes.iter().map(|&size| size as u16).sum()
    }

    /// Lowercase `0x1a` style key, the form the table text uses.
    pub fn key(&self) -> String {
        OpcodeTable::key(self.opcode)
    }
}

#[derive(Debug, Clone, Default)]
/// Immutable opcode lookup, built once before execution starts.
pub struct OpcodeTable {
    entries: HashMap<u8, OpcodeDescriptor>,
}

fn parse_opcode(text: &str) -> Option<u8> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

impl OpcodeTable {
    /// Parse table text: one `mnemonic, opcode, sizes` record per line, sizes
    /// separated by `|`. Blank lines and `//` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, EmulatorError> {
        let span = tracing::debug_span!("parse_opcode_table", bytes = text.len());
        let _guard = span.enter();

        let mut entries = HashMap::default();

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let [mnemonic, opcode_text, sizes_text] = fields.as_slice() else {
                return Err(EmulatorError::table(
                    line_number,
                    format!("expected 3 fields, found {}", fields.len()),
                ));
            };

            let opcode = parse_opcode(opcode_text).ok_or_else(|| {
                EmulatorError::table(line_number, format!("bad opcode '{opcode_text}'"))
            })?;

            let mut operand_sizes = Vec::new();
            for size in sizes_text.split('|').map(str::trim) {
                let size = size.parse::<u8>().map_err(|_| {
                    EmulatorError::table(line_number, format!("bad operand size '{size}'"))
                })?;
                if size > 0 {
                    operand_sizes.push(size);
                }
            }

            let instruction = Instruction::decode(mnemonic, opcode)
                .map_err(|reason| EmulatorError::table(line_number, reason))?;

            let descriptor = OpcodeDescriptor {
                opcode,
                mnemonic: mnemonic.to_ascii_lowercase(),
                operand_sizes,
                instruction,
            };

            if descriptor.operand_bytes() != descriptor.mode().operand_bytes() {
                return Err(EmulatorError::table(
                    line_number,
                    format!(
                        "{} operand bytes given but {:?} addressing takes {}",
                        descriptor.operand_bytes(),
                        descriptor.mode(),
                        descriptor.mode().operand_bytes()
                    ),
                ));
            }

            if entries.insert(opcode, descriptor).is_some() {
                return Err(EmulatorError::table(
                    line_number,
                    format!("opcode {} defined twice", Self::key(opcode)),
                ));
            }
        }

        tracing::debug!("Loaded {} opcodes", entries.len());
        Ok(Self { entries })
    }

    pub fn key(opcode: u8) -> String {
        format!("{opcode:#04x}")
    }

    pub fn get(&self, opcode: u8) -> Option<&OpcodeDescriptor> {
        self.entries.get(&opcode)
    }

    /// Look up by hex text key (`"0x1a"`, case insensitive).
    pub fn get_by_key(&self, key: &str) -> Option<&OpcodeDescriptor> {
        parse_opcode(key.trim()).and_then(|opcode| self.get(opcode))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptors in opcode order.
    pub fn descriptors(&self) -> Vec<&OpcodeDescriptor> {
        let mut descriptors: Vec<_> = self.entries.values().collect();
        descriptors.sort_unstable_by_key(|descriptor| descriptor.opcode);
        descriptors
    }
}
