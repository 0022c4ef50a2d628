use std::io;

use thiserror::Error;

use crate::directory::Address;

/// Failures reported by a [`GrowableRegion`](crate::region::GrowableRegion).
#[derive(Debug, Error)]
pub enum RegionError {
  #[error("region cannot grow by {requested} bytes ({available} available)")]
  NoSpace { requested: usize, available: usize },

  #[error("region cannot shrink by {requested} bytes (frontier at {frontier})")]
  Underflow { requested: usize, frontier: usize },

  #[error("failed to map region: {0}")]
  Map(#[source] io::Error),
}

/// Errors returned by [`BuddyAllocator`](crate::BuddyAllocator) operations.
///
/// None of these leave a half-applied change behind: the heap is exactly as it
/// was before the failing call.
#[derive(Debug, Error)]
pub enum AllocError {
  /// Bad size classes, or a heap that does not fit in the region.
  #[error("invalid heap configuration: {0}")]
  Configuration(String),

  #[error("out of memory: no free block can hold {requested} bytes")]
  OutOfMemory { requested: usize },

  #[error("zero-sized allocation request")]
  ZeroSize,

  #[error("no live block at address {0}")]
  InvalidPointer(Address),

  /// The heap metadata no longer satisfies the buddy invariants. Every
  /// operation refuses to run until the region is reset.
  #[error("heap corruption detected: {0}")]
  CorruptionDetected(String),

  #[error(transparent)]
  Region(#[from] RegionError),
}

pub type Result<T> = std::result::Result<T, AllocError>;
