//! The block directory: one header byte per live block, stored in address
//! order at the tail of the region.
//!
//! Nothing here stores an address. A block's address is the sum of the sizes of
//! every block before it, so all lookups are folds over the header sequence.

use std::{fmt, slice};

use crate::{
  error::RegionError,
  header::{HEADER_WIDTH, Header},
  region::GrowableRegion,
};

/// Offset of a block's payload from the start of the payload region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(usize);

impl Address {
  pub const fn new(offset: usize) -> Self {
    Self(offset)
  }

  pub const fn offset(self) -> usize {
    self.0
  }
}

impl fmt::Display for Address {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{:#x}", self.0)
  }
}

/// A block reconstructed from its position in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  pub index: usize,
  pub address: Address,
  pub header: Header,
}

impl Block {
  pub fn size(&self) -> usize {
    self.header.size()
  }
}

/// A located block together with its directory neighbours.
#[derive(Debug, Clone, Copy)]
pub struct Located {
  pub block: Block,
  pub prev: Option<Block>,
  pub next: Option<Block>,
}

/// Read-only view over the directory bytes.
pub struct Directory<'a> {
  headers: &'a [u8],
}

impl<'a> Directory<'a> {
  /// Views the directory that starts at `start` inside `region_bytes`.
  pub fn new(
    region_bytes: &'a [u8],
    start: usize,
  ) -> Self {
    Self {
      headers: region_bytes.get(start..).unwrap_or(&[]),
    }
  }

  pub fn len(&self) -> usize {
    self.headers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.headers.is_empty()
  }

  pub fn as_bytes(&self) -> &'a [u8] {
    self.headers
  }

  pub fn header(
    &self,
    index: usize,
  ) -> Option<Header> {
    self.headers.get(index).copied().map(Header::from_byte)
  }

  /// Walks the blocks in address order.
  pub fn blocks(&self) -> Blocks<'a> {
    Blocks {
      headers: self.headers.iter(),
      index: 0,
      offset: 0,
    }
  }

  /// Finds the block whose payload starts at `address`.
  pub fn locate(
    &self,
    address: Address,
  ) -> Option<Located> {
    let mut prev = None;
    let mut blocks = self.blocks();

    while let Some(block) = blocks.next() {
      if block.address == address {
        return Some(Located {
          block,
          prev,
          next: blocks.next(),
        });
      }
      if block.address > address {
        return None;
      }
      prev = Some(block);
    }

    None
  }

  /// Index of the block among same-sized blocks, counted from the heap start.
  /// Its parity tells on which side the buddy lies.
  pub fn serial_of(
    &self,
    index: usize,
  ) -> Option<usize> {
    let block = self.blocks().nth(index)?;
    block.address.offset().checked_div(block.size())
  }
}

/// Iterator produced by [`Directory::blocks`].
pub struct Blocks<'a> {
  headers: slice::Iter<'a, u8>,
  index: usize,
  offset: usize,
}

impl Iterator for Blocks<'_> {
  type Item = Block;

  fn next(&mut self) -> Option<Block> {
    let header = Header::from_byte(*self.headers.next()?);
    let block = Block {
      index: self.index,
      address: Address(self.offset),
      header,
    };

    self.index += 1;
    self.offset = self.offset.saturating_add(header.size());

    Some(block)
  }
}

/// A sequence of headers that blocks can be merged in.
///
/// The live directory and a scratch copy both implement this, so the merge walk
/// can be run for real or only simulated.
pub trait HeaderSeq {
  fn header(
    &self,
    index: usize,
  ) -> Header;

  fn set_header(
    &mut self,
    index: usize,
    header: Header,
  );

  fn remove_at(
    &mut self,
    index: usize,
  ) -> Result<(), RegionError>;

  fn header_count(&self) -> usize;

  fn serial_of(
    &self,
    index: usize,
  ) -> usize {
    let offset: usize = (0..index).map(|i| self.header(i).size()).sum();
    offset / self.header(index).size()
  }
}

impl HeaderSeq for Vec<Header> {
  fn header(
    &self,
    index: usize,
  ) -> Header {
    self[index]
  }

  fn set_header(
    &mut self,
    index: usize,
    header: Header,
  ) {
    self[index] = header;
  }

  fn remove_at(
    &mut self,
    index: usize,
  ) -> Result<(), RegionError> {
    self.remove(index);
    Ok(())
  }

  fn header_count(&self) -> usize {
    self.len()
  }
}

/// Mutable access to the directory living at the tail of a region.
///
/// Inserting or removing a header moves the region frontier by exactly one
/// header width.
pub struct DirectoryMut<'r, R: GrowableRegion> {
  region: &'r mut R,
  start: usize,
}

impl<'r, R: GrowableRegion> DirectoryMut<'r, R> {
  pub fn new(
    region: &'r mut R,
    start: usize,
  ) -> Self {
    Self { region, start }
  }

  pub fn view(&self) -> Directory<'_> {
    Directory::new(self.region.as_slice(), self.start)
  }

  /// Opens an empty slot right after `index`, shifting later headers towards
  /// the frontier. The new slot reads as a free class-0 header.
  pub fn insert_after(
    &mut self,
    index: usize,
  ) -> Result<(), RegionError> {
    self.region.grow(HEADER_WIDTH as isize)?;

    let headers = &mut self.region.as_mut_slice()[self.start..];
    let len = headers.len();
    headers.copy_within(index + 1..len - 1, index + 2);
    headers[index + 1] = 0;

    Ok(())
  }

  /// Writes `headers` back as the whole directory, resizing the tail to fit.
  pub fn restore(
    &mut self,
    headers: &[u8],
  ) -> Result<(), RegionError> {
    let current = self.header_count();
    let delta = headers.len() as isize - current as isize;
    self.region.grow(delta * HEADER_WIDTH as isize)?;

    self.region.as_mut_slice()[self.start..].copy_from_slice(headers);
    Ok(())
  }
}

impl<R: GrowableRegion> HeaderSeq for DirectoryMut<'_, R> {
  fn header(
    &self,
    index: usize,
  ) -> Header {
    Header::from_byte(self.region.as_slice()[self.start + index])
  }

  fn set_header(
    &mut self,
    index: usize,
    header: Header,
  ) {
    self.region.as_mut_slice()[self.start + index] = header.to_byte();
  }

  fn remove_at(
    &mut self,
    index: usize,
  ) -> Result<(), RegionError> {
    let headers = &mut self.region.as_mut_slice()[self.start..];
    let len = headers.len();
    headers.copy_within(index + 1..len, index);

    self.region.grow(-(HEADER_WIDTH as isize))?;
    Ok(())
  }

  fn header_count(&self) -> usize {
    self.region.frontier().saturating_sub(self.start)
  }
}
