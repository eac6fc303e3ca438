use std::{fs, io, path::Path};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Architectural constants of the emulated part.
///
/// The defaults describe the 68HC05 layout: a 64 byte stack window ending at
/// `$00FF`, an idle bus that reads back `$9D` and vectors at the top of the
/// program EPROM.
pub struct EmulatorConfig {
    /// Highest address of the stack window, also the reset value of SP
    pub stack_top: u16,
    /// Number of bytes in the stack ring
    pub stack_size: u16,
    /// What an address that was never written reads as
    pub fill_byte: u8,
    /// PC after reset
    pub reset_pc: u16,
    pub swi_vector: u16,
    pub irq_vector: u16,
    pub timer_vector: u16,
    pub reset_vector: u16,
}

impl EmulatorConfig {
    fn hardcoded() -> Self {
        Self {
            stack_top: 0x00FF,
            stack_size: 64,
            fill_byte: 0x9D,
            reset_pc: 0x0000,
            swi_vector: 0x3FFC,
            irq_vector: 0x3FFA,
            timer_vector: 0x3FF8,
            reset_vector: 0x3FFE,
        }
    }

    /// Parse and validate a RON config.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, ConfigError> {
        let config = ron::de::from_str::<EmulatorConfig>(ron_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let span = tracing::info_span!("load_config", path = %path.as_ref().display());
        let _guard = span.enter();

        let text = fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// The stack window has to sit inside the 16 bit address space.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_size == 0 {
            return Err(ConfigError::Invalid("stack_size must be at least 1".into()));
        }
        if u32::from(self.stack_size) > u32::from(self.stack_top) + 1 {
            return Err(ConfigError::Invalid(format!(
                "stack of {} bytes does not fit below 0x{:04X}",
                self.stack_size, self.stack_top
            )));
        }
        Ok(())
    }

    /// Lowest address of the stack window.
    pub fn stack_bottom(&self) -> u16 {
        self.stack_top - (self.stack_size - 1)
    }
}

lazy_static! {
    // embedded config first, hardcoded values if somebody broke the asset
    static ref DEFAULT_CONFIG: EmulatorConfig = {
        let ron_str = include_str!("../../assets/config/default.ron");
        match EmulatorConfig::from_ron_str(ron_str) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load embedded default config ({e}): falling back");
                EmulatorConfig::hardcoded()
            }
        }
    };
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        *DEFAULT_CONFIG
    }
}
