//! State configuration.

use chronon_arena::BufferConfig;
use chronon_core::{BufferError, Byte, Integer};

/// Configuration for a [`State`](crate::State).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateConfig {
    /// Initial random seed. `None` draws one from the operating system.
    pub seed: Option<u64>,
    /// Integer buffer settings.
    pub integers: BufferConfig,
    /// Byte buffer settings.
    pub bytes: BufferConfig,
}

impl StateConfig {
    /// Configuration with a fixed seed and default buffers.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Check both buffer configurations.
    pub fn validate(&self) -> Result<(), BufferError> {
        self.integers.validate()?;
        self.bytes.validate()
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            seed: None,
            integers: BufferConfig::for_scalar::<Integer>(),
            bytes: BufferConfig::for_scalar::<Byte>(),
        }
    }
}
