//! Buffer configuration parameters.

use chronon_core::BufferError;

/// Configuration for a [`Buffer`](crate::Buffer).
///
/// Validated at construction; a buffer's chunk size may later be changed
/// through [`Buffer::set_chunk_size`](crate::Buffer::set_chunk_size), which
/// applies the same validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferConfig {
    /// Number of cells one [`adjust_chunk`](crate::Buffer::adjust_chunk)
    /// call commits.
    ///
    /// Default: [`DEFAULT_CHUNK_BYTES`](Self::DEFAULT_CHUNK_BYTES) divided
    /// by the scalar size. Must be non-zero.
    pub chunk_size: usize,
}

impl BufferConfig {
    /// Bytes of scalar data committed per chunk by default.
    pub const DEFAULT_CHUNK_BYTES: usize = 8000;

    /// Default configuration for a buffer of `T`.
    pub fn for_scalar<T>() -> Self {
        Self {
            chunk_size: (Self::DEFAULT_CHUNK_BYTES / std::mem::size_of::<T>().max(1)).max(1),
        }
    }

    /// Configuration with an explicit chunk size.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.chunk_size == 0 {
            return Err(BufferError::InvalidChunkSize {
                chunk_size: self.chunk_size,
            });
        }
        Ok(())
    }
}
