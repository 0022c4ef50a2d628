//! The heap descriptor record and the configuration it is written from.

use crate::{
  class::{MAX_SIZE_CLASS, block_size},
  error::{AllocError, Result},
};

/// Bytes taken by the descriptor at the very start of the region.
pub const DESCRIPTOR_SIZE: usize = 2;

/// Size classes chosen by the caller when a heap is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  /// Total payload capacity is `2^initial_size_class` bytes.
  pub initial_size_class: u8,
  /// Blocks are never split below `2^min_size_class` bytes.
  pub min_size_class: u8,
}

impl Default for HeapConfig {
  /// A 64 KiB heap with 1 KiB minimum blocks.
  fn default() -> Self {
    Self {
      initial_size_class: 16,
      min_size_class: 10,
    }
  }
}

impl HeapConfig {
  pub fn new(
    initial_size_class: u8,
    min_size_class: u8,
  ) -> Self {
    Self {
      initial_size_class,
      min_size_class,
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.initial_size_class > MAX_SIZE_CLASS {
      return Err(AllocError::Configuration(format!(
        "initial size class {} exceeds {}",
        self.initial_size_class, MAX_SIZE_CLASS
      )));
    }

    if self.min_size_class > self.initial_size_class {
      return Err(AllocError::Configuration(format!(
        "minimum size class {} exceeds initial size class {}",
        self.min_size_class, self.initial_size_class
      )));
    }

    Ok(())
  }

  /// Payload bytes managed by a heap with this configuration.
  pub fn heap_size(&self) -> Result<usize> {
    block_size(self.initial_size_class).ok_or_else(|| {
      AllocError::Configuration(format!(
        "a heap of 2^{} bytes is not addressable on this machine",
        self.initial_size_class
      ))
    })
  }

  /// Region bytes needed for the descriptor, the payload and one header.
  pub fn footprint(&self) -> Result<usize> {
    self
      .heap_size()?
      .checked_add(DESCRIPTOR_SIZE + crate::header::HEADER_WIDTH)
      .ok_or_else(|| AllocError::Configuration("heap footprint overflows usize".into()))
  }
}

/// The first record in the region: `[initial_size_class][min_size_class]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapDescriptor {
  pub initial_size_class: u8,
  pub min_size_class: u8,
}

impl HeapDescriptor {
  /// Reads the raw descriptor bytes without checking them.
  pub fn read(bytes: &[u8]) -> Option<Self> {
    match bytes {
      [initial_size_class, min_size_class, ..] => Some(Self {
        initial_size_class: *initial_size_class,
        min_size_class: *min_size_class,
      }),
      _ => None,
    }
  }

  pub fn write(
    &self,
    bytes: &mut [u8],
  ) {
    bytes[0] = self.initial_size_class;
    bytes[1] = self.min_size_class;
  }

  /// Payload size; only meaningful once the descriptor has been validated.
  pub fn heap_size(&self) -> usize {
    block_size(self.initial_size_class).unwrap_or(0)
  }

  /// Region offset where the block directory begins.
  pub fn directory_start(&self) -> usize {
    DESCRIPTOR_SIZE + self.heap_size()
  }
}

impl From<HeapConfig> for HeapDescriptor {
  fn from(config: HeapConfig) -> Self {
    Self {
      initial_size_class: config.initial_size_class,
      min_size_class: config.min_size_class,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_config() {
    let config = HeapConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.heap_size().unwrap(), 64 * 1024);
    assert_eq!(config.footprint().unwrap(), 64 * 1024 + 3);
  }

  #[test]
  fn test_config_rejects_min_above_initial() {
    let err = HeapConfig::new(10, 11).validate().unwrap_err();
    assert!(matches!(err, AllocError::Configuration(_)));
  }

  #[test]
  fn test_config_rejects_oversized_class() {
    assert!(HeapConfig::new(65, 10).validate().is_err());
    assert!(HeapConfig::new(64, 10).validate().is_ok());
    assert!(HeapConfig::new(64, 10).heap_size().is_err());
  }

  #[test]
  fn test_descriptor_layout() {
    let descriptor = HeapDescriptor::from(HeapConfig::new(11, 8));
    let mut bytes = [0u8; 4];

    descriptor.write(&mut bytes);
    assert_eq!(bytes[..2], [11, 8]);
    assert_eq!(HeapDescriptor::read(&bytes), Some(descriptor));
    assert_eq!(descriptor.directory_start(), 2 + 2048);

    assert_eq!(HeapDescriptor::read(&bytes[..1]), None);
  }
}
