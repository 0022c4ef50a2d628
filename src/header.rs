use std::fmt;

use crate::class::block_size;

/// Bytes taken by one header in the block directory.
pub const HEADER_WIDTH: usize = 1;

const STATUS_BIT: u8 = 0x80;
const CLASS_MASK: u8 = 0x7f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Free,
  InUse,
}

impl fmt::Display for Status {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Status::Free => f.write_str("free"),
      Status::InUse => f.write_str("allocated"),
    }
  }
}

/// One block's metadata, packed as `status << 7 | size_class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header(u8);

impl Header {
  pub const fn new(
    status: Status,
    size_class: u8,
  ) -> Self {
    let status_bit = match status {
      Status::Free => 0,
      Status::InUse => STATUS_BIT,
    };
    Self(status_bit | (size_class & CLASS_MASK))
  }

  pub const fn from_byte(byte: u8) -> Self {
    Self(byte)
  }

  pub const fn to_byte(self) -> u8 {
    self.0
  }

  pub const fn status(self) -> Status {
    if self.0 & STATUS_BIT == 0 {
      Status::Free
    } else {
      Status::InUse
    }
  }

  pub const fn is_free(self) -> bool {
    self.0 & STATUS_BIT == 0
  }

  pub const fn size_class(self) -> u8 {
    self.0 & CLASS_MASK
  }

  /// Block size in bytes; zero when the class cannot be represented, which
  /// only a corrupted header can produce.
  pub const fn size(self) -> usize {
    match block_size(self.size_class()) {
      Some(size) => size,
      None => 0,
    }
  }

  pub const fn with_status(
    self,
    status: Status,
  ) -> Self {
    Self::new(status, self.size_class())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_packing() {
    let header = Header::new(Status::InUse, 10);

    assert_eq!(header.to_byte(), 0x8a);
    assert_eq!(header.status(), Status::InUse);
    assert_eq!(header.size_class(), 10);
    assert_eq!(header.size(), 1024);

    let free = header.with_status(Status::Free);
    assert_eq!(free.to_byte(), 0x0a);
    assert!(free.is_free());
    assert_eq!(free.size_class(), 10);
  }

  #[test]
  fn test_header_from_raw_byte() {
    let header = Header::from_byte(0xff);

    assert_eq!(header.status(), Status::InUse);
    assert_eq!(header.size_class(), 127);
    assert_eq!(header.size(), 0);
  }

  #[test]
  fn test_status_display() {
    assert_eq!(Status::Free.to_string(), "free");
    assert_eq!(Status::InUse.to_string(), "allocated");
  }
}
