//! Growable byte regions the allocator lives in.
//!
//! A region behaves like the program break moved by `sbrk(2)`: a span that starts
//! at offset zero and ends at a movable *frontier*. Growing returns the previous
//! frontier, i.e. the start of the newly available bytes.

use std::{io, ptr, slice};

use crate::error::RegionError;

/// The contract the allocator needs from its backing memory.
pub trait GrowableRegion {
  /// Moves the frontier by `delta` bytes and returns where it was before.
  ///
  /// Fails without moving anything if the region would exceed its capacity or
  /// shrink below zero.
  fn grow(
    &mut self,
    delta: isize,
  ) -> Result<usize, RegionError>;

  /// Current end of the usable span.
  fn frontier(&self) -> usize;

  /// Upper bound the frontier can never pass.
  fn capacity(&self) -> usize;

  fn available(&self) -> usize {
    self.capacity() - self.frontier()
  }

  /// The bytes in `[0, frontier)`.
  fn as_slice(&self) -> &[u8];

  fn as_mut_slice(&mut self) -> &mut [u8];
}

/// Computes the frontier after applying `delta`, or the reason it cannot move.
fn checked_frontier(
  frontier: usize,
  capacity: usize,
  delta: isize,
) -> Result<usize, RegionError> {
  let magnitude = delta.unsigned_abs();

  if delta >= 0 {
    let available = capacity - frontier;
    if magnitude > available {
      return Err(RegionError::NoSpace {
        requested: magnitude,
        available,
      });
    }
    Ok(frontier + magnitude)
  } else {
    frontier
      .checked_sub(magnitude)
      .ok_or(RegionError::Underflow {
        requested: magnitude,
        frontier,
      })
  }
}

/// A fixed-capacity region backed by a boxed byte buffer.
pub struct ArenaRegion {
  buf: Box<[u8]>,
  frontier: usize,
}

impl ArenaRegion {
  pub fn new(capacity: usize) -> Self {
    Self {
      buf: vec![0; capacity].into_boxed_slice(),
      frontier: 0,
    }
  }
}

impl GrowableRegion for ArenaRegion {
  fn grow(
    &mut self,
    delta: isize,
  ) -> Result<usize, RegionError> {
    let previous = self.frontier;
    self.frontier = checked_frontier(previous, self.buf.len(), delta)?;
    Ok(previous)
  }

  fn frontier(&self) -> usize {
    self.frontier
  }

  fn capacity(&self) -> usize {
    self.buf.len()
  }

  fn as_slice(&self) -> &[u8] {
    &self.buf[..self.frontier]
  }

  fn as_mut_slice(&mut self) -> &mut [u8] {
    &mut self.buf[..self.frontier]
  }
}

/// A region reserved from the OS with an anonymous private `mmap(2)`.
///
/// The whole capacity is mapped up front; growing only moves the frontier,
/// much like a program break inside a pre-sized data segment.
#[cfg(unix)]
pub struct MmapRegion {
  base: ptr::NonNull<u8>,
  capacity: usize,
  frontier: usize,
}

#[cfg(unix)]
impl MmapRegion {
  pub fn new(capacity: usize) -> Result<Self, RegionError> {
    if capacity == 0 {
      return Err(RegionError::Map(io::Error::new(
        io::ErrorKind::InvalidInput,
        "cannot map a zero-capacity region",
      )));
    }

    let addr = unsafe {
      libc::mmap(
        ptr::null_mut(),
        capacity,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANON,
        -1,
        0,
      )
    };

    if addr == libc::MAP_FAILED {
      return Err(RegionError::Map(io::Error::last_os_error()));
    }

    let base = ptr::NonNull::new(addr as *mut u8)
      .ok_or_else(|| RegionError::Map(io::Error::other("mmap returned a null mapping")))?;

    Ok(Self {
      base,
      capacity,
      frontier: 0,
    })
  }

  /// Start of the mapping, for callers that want raw addresses.
  pub fn base_ptr(&self) -> *mut u8 {
    self.base.as_ptr()
  }
}

#[cfg(unix)]
impl GrowableRegion for MmapRegion {
  fn grow(
    &mut self,
    delta: isize,
  ) -> Result<usize, RegionError> {
    let previous = self.frontier;
    self.frontier = checked_frontier(previous, self.capacity, delta)?;
    Ok(previous)
  }

  fn frontier(&self) -> usize {
    self.frontier
  }

  fn capacity(&self) -> usize {
    self.capacity
  }

  fn as_slice(&self) -> &[u8] {
    // SAFETY: the mapping covers `capacity` readable bytes and frontier <= capacity.
    unsafe { slice::from_raw_parts(self.base.as_ptr(), self.frontier) }
  }

  fn as_mut_slice(&mut self) -> &mut [u8] {
    // SAFETY: as above, and `&mut self` guarantees exclusive access.
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr(), self.frontier) }
  }
}

#[cfg(unix)]
impl Drop for MmapRegion {
  fn drop(&mut self) {
    unsafe {
      libc::munmap(self.base.as_ptr() as *mut libc::c_void, self.capacity);
    }
  }
}
