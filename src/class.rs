//! Size-class arithmetic.
//!
//! A size class `k` stands for a block of `2^k` bytes.

/// Largest size class a heap descriptor may name.
pub const MAX_SIZE_CLASS: u8 = 64;

/// Number of bytes in a block of the given class, or `None` if it does not fit
/// in a `usize` on this machine.
///
/// # Examples
///
/// ```rust
/// use rbuddy::class::block_size;
///
/// assert_eq!(block_size(10), Some(1024));
/// assert_eq!(block_size(0), Some(1));
/// assert_eq!(block_size(200), None);
/// ```
pub const fn block_size(class: u8) -> Option<usize> {
  1usize.checked_shl(class as u32)
}

/// Smallest class whose block holds `bytes` bytes.
///
/// # Examples
///
/// ```rust
/// use rbuddy::class::class_for;
///
/// assert_eq!(class_for(1022), 10);
/// assert_eq!(class_for(1024), 10);
/// assert_eq!(class_for(1025), 11);
/// ```
pub const fn class_for(bytes: usize) -> u8 {
  if bytes <= 1 {
    return 0;
  }
  (usize::BITS - (bytes - 1).leading_zeros()) as u8
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_class_for_matches_block_size() {
    for class in 0..20u8 {
      let size = block_size(class).unwrap();

      assert_eq!(class, class_for(size));
      if size > 1 {
        assert_eq!(class, class_for(size / 2 + 1));
        assert_eq!(class + 1, class_for(size + 1));
      }
    }
  }

  #[test]
  fn test_block_size_bounds() {
    assert_eq!(block_size((usize::BITS - 1) as u8), Some(1 << (usize::BITS - 1)));
    assert_eq!(block_size(usize::BITS as u8), None);
    assert_eq!(block_size(MAX_SIZE_CLASS + 1), None);
  }

  #[test]
  fn test_class_for_small_requests() {
    assert_eq!(class_for(0), 0);
    assert_eq!(class_for(1), 0);
    assert_eq!(class_for(2), 1);
    assert_eq!(class_for(3), 2);
  }
}
