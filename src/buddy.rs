use std::{cmp, fmt};

use tracing::{debug, info, trace, warn};

use crate::{
  class::class_for,
  descriptor::{DESCRIPTOR_SIZE, HeapConfig, HeapDescriptor},
  directory::{Address, Block, Directory, DirectoryMut, HeaderSeq},
  error::{AllocError, RegionError, Result},
  header::{HEADER_WIDTH, Header, Status},
  region::GrowableRegion,
};

/// One line of [`BuddyAllocator::describe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub status: Status,
  pub size: usize,
}

impl fmt::Display for BlockInfo {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{} {}", self.status, self.size)
  }
}

/// A buddy allocator whose entire state lives inside its region.
///
/// Every call re-reads the descriptor and the directory and validates them
/// before touching anything.
pub struct BuddyAllocator<R: GrowableRegion> {
  region: R,
}

impl<R: GrowableRegion> BuddyAllocator<R> {
  /// Lays out a fresh heap in `region`: the descriptor, `2^initial_size_class`
  /// payload bytes and a single free block covering all of it.
  pub fn initialize(
    mut region: R,
    config: HeapConfig,
  ) -> Result<Self> {
    config.validate()?;
    let footprint = config.footprint()?;

    let delta = signed_delta(region.frontier(), footprint).ok_or_else(|| {
      AllocError::Configuration(format!("heap footprint of {footprint} bytes is too large"))
    })?;
    region.grow(delta).map_err(|err| {
      AllocError::Configuration(format!(
        "region cannot hold a 2^{} byte heap: {err}",
        config.initial_size_class
      ))
    })?;

    let descriptor = HeapDescriptor::from(config);
    let bytes = region.as_mut_slice();
    descriptor.write(bytes);
    bytes[descriptor.directory_start()] = Header::new(Status::Free, config.initial_size_class).to_byte();

    info!(
      heap_size = descriptor.heap_size(),
      min_block = 1usize << config.min_size_class,
      "initialized buddy heap"
    );

    Ok(Self { region })
  }

  /// Re-opens a region that already holds a heap.
  pub fn attach(region: R) -> Result<Self> {
    let allocator = Self { region };
    let descriptor = allocator.validate()?;

    info!(
      heap_size = descriptor.heap_size(),
      blocks = allocator.directory(&descriptor).len(),
      "attached to existing buddy heap"
    );

    Ok(allocator)
  }

  pub fn region(&self) -> &R {
    &self.region
  }

  pub fn region_mut(&mut self) -> &mut R {
    &mut self.region
  }

  pub fn into_region(self) -> R {
    self.region
  }

  fn directory(
    &self,
    descriptor: &HeapDescriptor,
  ) -> Directory<'_> {
    Directory::new(self.region.as_slice(), descriptor.directory_start())
  }

  /// Checks the descriptor and the directory against the buddy invariants and
  /// returns the descriptor if they hold.
  ///
  /// The block sizes must add up to exactly `2^initial_size_class`, each class
  /// must lie in `[min_size_class, initial_size_class]` and each block must
  /// start at a multiple of its own size.
  pub fn validate(&self) -> Result<HeapDescriptor> {
    let bytes = self.region.as_slice();

    let descriptor = HeapDescriptor::read(bytes)
      .ok_or_else(|| corruption("region is smaller than the heap descriptor".into()))?;
    let config = HeapConfig::new(descriptor.initial_size_class, descriptor.min_size_class);

    config.validate().map_err(|err| corruption(err.to_string()))?;
    let heap_size = config.heap_size().map_err(|err| corruption(err.to_string()))?;

    let start = heap_size
      .checked_add(DESCRIPTOR_SIZE)
      .ok_or_else(|| corruption("payload region overflows the address space".into()))?;
    if bytes.len() <= start {
      return Err(corruption("block directory is empty".into()));
    }

    let mut total = 0usize;
    for block in Directory::new(bytes, start).blocks() {
      let class = block.header.size_class();
      if class < descriptor.min_size_class || class > descriptor.initial_size_class {
        return Err(corruption(format!(
          "block {} has size class {class}",
          block.index
        )));
      }

      let size = block.size();
      if total % size != 0 {
        return Err(corruption(format!(
          "block {} at {} is not aligned to its size {size}",
          block.index, block.address
        )));
      }

      total += size;
      if total > heap_size {
        return Err(corruption(format!(
          "directory describes more than {heap_size} bytes"
        )));
      }
    }

    if total != heap_size {
      return Err(corruption(format!(
        "directory sums to {total} bytes, expected {heap_size}"
      )));
    }

    Ok(descriptor)
  }

  /// Allocates the smallest free block that holds `size` bytes, splitting it
  /// down to the smallest power of two that still fits (but never below the
  /// configured minimum).
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Address> {
    let descriptor = self.validate()?;
    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let best = self
      .directory(&descriptor)
      .blocks()
      .filter(|block| block.header.is_free() && block.size() >= size)
      .min_by_key(Block::size)
      .ok_or(AllocError::OutOfMemory { requested: size })?;

    let target = cmp::max(class_for(size), descriptor.min_size_class);
    let mut class = best.header.size_class();

    // Every split adds one header, so make sure the region can take all of
    // them before the first one lands.
    let splits = usize::from(class - target);
    if self.region.available() < splits * HEADER_WIDTH {
      debug!(
        requested = size,
        splits,
        available = self.region.available(),
        "region too small to split block"
      );
      return Err(AllocError::OutOfMemory { requested: size });
    }

    let mut directory = DirectoryMut::new(&mut self.region, descriptor.directory_start());
    while class > target {
      directory
        .insert_after(best.index)
        .map_err(|_| AllocError::OutOfMemory { requested: size })?;
      class -= 1;

      directory.set_header(best.index + 1, Header::new(Status::Free, class));
      directory.set_header(best.index, Header::new(Status::Free, class));
      trace!(index = best.index, size_class = class, "split block");
    }
    directory.set_header(best.index, Header::new(Status::InUse, class));

    debug!(
      requested = size,
      block = 1usize << class,
      address = %best.address,
      "allocated"
    );

    Ok(best.address)
  }

  /// Releases the block at `address` and merges it with its buddy for as long
  /// as the buddy is free and of the same size.
  pub fn free(
    &mut self,
    address: Address,
  ) -> Result<()> {
    let descriptor = self.validate()?;
    let start = descriptor.directory_start();

    let located = Directory::new(self.region.as_slice(), start)
      .locate(address)
      .ok_or(AllocError::InvalidPointer(address))?;

    let mut directory = DirectoryMut::new(&mut self.region, start);
    let block = located.block;
    directory.set_header(block.index, block.header.with_status(Status::Free));

    let merged = coalesce(&mut directory, block.index, descriptor.initial_size_class)?;

    debug!(
      %address,
      size = block.size(),
      merged_size = directory.header(merged).size(),
      "freed"
    );

    Ok(())
  }

  /// Moves the block at `address` into a block of `new_size` bytes.
  ///
  /// `None` allocates and a `new_size` of zero frees. Otherwise the request only
  /// goes ahead if either the largest free block or the block this one would
  /// merge into once freed is big enough; the first
  /// `min(old size, new_size)` bytes are carried over. On failure the original
  /// block and its contents are left as they were.
  pub fn resize(
    &mut self,
    address: Option<Address>,
    new_size: usize,
  ) -> Result<Option<Address>> {
    let Some(address) = address else {
      return self.allocate(new_size).map(Some);
    };

    if new_size == 0 {
      self.free(address)?;
      return Ok(None);
    }

    let descriptor = self.validate()?;
    let start = descriptor.directory_start();
    let directory = self.directory(&descriptor);

    let block = directory
      .locate(address)
      .map(|located| located.block)
      .filter(|block| !block.header.is_free())
      .ok_or(AllocError::InvalidPointer(address))?;

    let largest_free = directory
      .blocks()
      .filter(|block| block.header.is_free())
      .map(|block| block.size())
      .max()
      .unwrap_or(0);
    let merged = merged_size(&directory, block.index, descriptor.initial_size_class);

    if cmp::max(largest_free, merged) < new_size {
      debug!(%address, new_size, largest_free, merged, "resize cannot be satisfied");
      return Err(AllocError::OutOfMemory { requested: new_size });
    }

    let snapshot = directory.as_bytes().to_vec();

    self.free(address)?;
    let moved = match self.allocate(new_size) {
      Ok(moved) => moved,
      Err(err) => {
        DirectoryMut::new(&mut self.region, start).restore(&snapshot)?;
        return Err(err);
      }
    };

    // Freeing and allocating only rewrite the directory, so the old payload
    // is still intact here even if the new block overlaps it.
    if moved != address {
      let from = DESCRIPTOR_SIZE + address.offset();
      let count = cmp::min(block.size(), new_size);
      self
        .region
        .as_mut_slice()
        .copy_within(from..from + count, DESCRIPTOR_SIZE + moved.offset());
    }

    debug!(from = %address, to = %moved, new_size, "resized");

    Ok(Some(moved))
  }

  /// Status and size of every block, in address order.
  pub fn describe(&self) -> Result<Vec<BlockInfo>> {
    let descriptor = self.validate()?;

    Ok(
      self
        .directory(&descriptor)
        .blocks()
        .map(|block| BlockInfo {
          status: block.header.status(),
          size: block.size(),
        })
        .collect(),
    )
  }

  /// The full payload of the allocated block at `address`.
  pub fn payload(
    &self,
    address: Address,
  ) -> Result<&[u8]> {
    let descriptor = self.validate()?;
    let block = self.allocated_block(&descriptor, address)?;

    let from = DESCRIPTOR_SIZE + address.offset();
    Ok(&self.region.as_slice()[from..from + block.size()])
  }

  pub fn payload_mut(
    &mut self,
    address: Address,
  ) -> Result<&mut [u8]> {
    let descriptor = self.validate()?;
    let block = self.allocated_block(&descriptor, address)?;

    let from = DESCRIPTOR_SIZE + address.offset();
    Ok(&mut self.region.as_mut_slice()[from..from + block.size()])
  }

  fn allocated_block(
    &self,
    descriptor: &HeapDescriptor,
    address: Address,
  ) -> Result<Block> {
    self
      .directory(descriptor)
      .locate(address)
      .map(|located| located.block)
      .filter(|block| !block.header.is_free())
      .ok_or(AllocError::InvalidPointer(address))
  }
}

fn corruption(reason: String) -> AllocError {
  warn!(%reason, "heap validation failed");
  AllocError::CorruptionDetected(reason)
}

/// Signed frontier move that takes a region from `from` to `to` bytes.
fn signed_delta(
  from: usize,
  to: usize,
) -> Option<isize> {
  if to >= from {
    isize::try_from(to - from).ok()
  } else {
    isize::try_from(from - to).ok().map(|delta| -delta)
  }
}

/// Merges the free block at `index` with its buddy while the buddy is free and
/// the same size, stopping at the top-level block. Returns the index of the
/// block the walk ended on.
///
/// An odd serial means the buddy is the preceding block, an even one the
/// following block. The merged block always takes the left position.
fn coalesce<H: HeaderSeq>(
  headers: &mut H,
  mut index: usize,
  initial_size_class: u8,
) -> std::result::Result<usize, RegionError> {
  loop {
    let class = headers.header(index).size_class();
    if class >= initial_size_class {
      return Ok(index);
    }

    let (left, right) = if headers.serial_of(index) % 2 == 1 {
      match index.checked_sub(1) {
        Some(prev) => (prev, index),
        None => return Ok(index),
      }
    } else {
      if index + 1 >= headers.header_count() {
        return Ok(index);
      }
      (index, index + 1)
    };

    let buddy = headers.header(if left == index { right } else { left });
    if !buddy.is_free() || buddy.size_class() != class {
      return Ok(index);
    }

    headers.remove_at(right)?;
    headers.set_header(left, Header::new(Status::Free, class + 1));
    trace!(index = left, size_class = class + 1, "merged buddies");

    index = left;
  }
}

/// Size of the block `index` would end up in if it were freed right now,
/// worked out on a scratch copy of the headers.
fn merged_size(
  directory: &Directory<'_>,
  index: usize,
  initial_size_class: u8,
) -> usize {
  let mut scratch: Vec<Header> = directory.blocks().map(|block| block.header).collect();
  scratch[index] = scratch[index].with_status(Status::Free);

  coalesce(&mut scratch, index, initial_size_class)
    .map(|merged| scratch[merged].size())
    .unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::region::ArenaRegion;

  fn heap(
    initial_size_class: u8,
    min_size_class: u8,
  ) -> BuddyAllocator<ArenaRegion> {
    let config = HeapConfig::new(initial_size_class, min_size_class);
    let region = ArenaRegion::new(config.footprint().unwrap() + 64);
    BuddyAllocator::initialize(region, config).unwrap()
  }

  fn layout(allocator: &BuddyAllocator<ArenaRegion>) -> Vec<String> {
    allocator
      .describe()
      .unwrap()
      .iter()
      .map(|info| info.to_string())
      .collect()
  }

  #[test]
  fn test_initialize_lays_out_region() {
    let allocator = heap(11, 8);
    let bytes = allocator.region().as_slice();

    assert_eq!(bytes.len(), 2 + 2048 + 1);
    assert_eq!(bytes[..2], [11, 8]);
    assert_eq!(bytes[2 + 2048], 11);
    assert_eq!(layout(&allocator), vec!["free 2048"]);
  }

  #[test]
  fn test_initialize_accounts_for_grown_region() {
    let config = HeapConfig::new(10, 8);
    let mut region = ArenaRegion::new(2048);
    region.grow(100).unwrap();

    let allocator = BuddyAllocator::initialize(region, config).unwrap();
    assert_eq!(allocator.region().frontier(), config.footprint().unwrap());
  }

  #[test]
  fn test_initialize_fails_when_region_too_small() {
    let config = HeapConfig::new(12, 8);
    let region = ArenaRegion::new(1024);

    let err = BuddyAllocator::initialize(region, config).err().unwrap();
    assert!(matches!(err, AllocError::Configuration(_)));
  }

  #[test]
  fn test_initialize_rejects_min_above_initial() {
    let region = ArenaRegion::new(4096);

    let result = BuddyAllocator::initialize(region, HeapConfig::new(8, 9));
    assert!(matches!(result, Err(AllocError::Configuration(_))));
  }

  #[test]
  fn test_allocate_splits_down_to_request() {
    let mut allocator = heap(12, 8);

    let address = allocator.allocate(300).unwrap();

    assert_eq!(address, Address::new(0));
    assert_eq!(
      layout(&allocator),
      vec!["allocated 512", "free 512", "free 1024", "free 2048"]
    );
  }

  #[test]
  fn test_allocate_stops_at_min_class() {
    let mut allocator = heap(12, 10);

    allocator.allocate(1).unwrap();
    assert_eq!(
      layout(&allocator),
      vec!["allocated 1024", "free 1024", "free 2048"]
    );
  }

  #[test]
  fn test_allocate_prefers_smallest_then_earliest() {
    let mut allocator = heap(12, 10);

    let a = allocator.allocate(1024).unwrap();
    let _b = allocator.allocate(1024).unwrap();
    let _c = allocator.allocate(1024).unwrap();
    allocator.free(a).unwrap();
    assert_eq!(
      layout(&allocator),
      vec!["free 1024", "allocated 1024", "allocated 1024", "free 1024"]
    );

    assert_eq!(allocator.allocate(1000).unwrap(), Address::new(0));
    assert_eq!(allocator.allocate(1000).unwrap(), Address::new(3072));
  }

  #[test]
  fn test_allocate_skips_larger_blocks_for_best_fit() {
    let mut allocator = heap(12, 8);

    let a = allocator.allocate(256).unwrap();
    let _b = allocator.allocate(256).unwrap();
    let _c = allocator.allocate(512).unwrap();
    allocator.free(a).unwrap();

    // Free blocks: 256 at 0, 1024 at 1024, 2048 at 2048.
    assert_eq!(allocator.allocate(200).unwrap(), Address::new(0));
    assert_eq!(allocator.allocate(1000).unwrap(), Address::new(1024));
  }

  #[test]
  fn test_allocate_zero_is_rejected() {
    let mut allocator = heap(10, 8);

    assert!(matches!(allocator.allocate(0), Err(AllocError::ZeroSize)));
    assert_eq!(layout(&allocator), vec!["free 1024"]);
  }

  #[test]
  fn test_allocate_too_large() {
    let mut allocator = heap(10, 8);

    let err = allocator.allocate(1025).unwrap_err();
    assert!(matches!(err, AllocError::OutOfMemory { requested: 1025 }));
  }

  #[test]
  fn test_allocate_leaves_heap_untouched_when_split_cannot_fit() {
    let config = HeapConfig::new(12, 10);
    let region = ArenaRegion::new(config.footprint().unwrap() + 1);
    let mut allocator = BuddyAllocator::initialize(region, config).unwrap();

    let err = allocator.allocate(1024).unwrap_err();
    assert!(matches!(err, AllocError::OutOfMemory { .. }));
    assert_eq!(layout(&allocator), vec!["free 4096"]);

    // One split still fits.
    allocator.allocate(2048).unwrap();
    assert_eq!(layout(&allocator), vec!["allocated 2048", "free 2048"]);
  }

  #[test]
  fn test_free_cascades_to_top() {
    let mut allocator = heap(12, 8);

    let a = allocator.allocate(256).unwrap();
    assert_eq!(allocator.directory_len(), 5);

    allocator.free(a).unwrap();
    assert_eq!(layout(&allocator), vec!["free 4096"]);
    assert_eq!(allocator.directory_len(), 1);
  }

  #[test]
  fn test_free_merges_with_preceding_buddy() {
    let mut allocator = heap(11, 10);

    let a = allocator.allocate(1024).unwrap();
    let b = allocator.allocate(1024).unwrap();
    allocator.free(a).unwrap();
    assert_eq!(layout(&allocator), vec!["free 1024", "allocated 1024"]);

    allocator.free(b).unwrap();
    assert_eq!(layout(&allocator), vec!["free 2048"]);
  }

  #[test]
  fn test_free_does_not_merge_different_sizes() {
    let mut allocator = heap(12, 10);

    let a = allocator.allocate(1024).unwrap();
    let _b = allocator.allocate(1024).unwrap();
    let _c = allocator.allocate(2048).unwrap();

    allocator.free(a).unwrap();
    assert_eq!(
      layout(&allocator),
      vec!["free 1024", "allocated 1024", "allocated 2048"]
    );
  }

  #[test]
  fn test_free_unknown_address() {
    let mut allocator = heap(11, 10);
    allocator.allocate(1024).unwrap();

    let err = allocator.free(Address::new(512)).unwrap_err();
    assert!(matches!(err, AllocError::InvalidPointer(address) if address == Address::new(512)));
    assert_eq!(layout(&allocator), vec!["allocated 1024", "free 1024"]);
  }

  #[test]
  fn test_free_twice_is_harmless() {
    let mut allocator = heap(11, 10);
    let a = allocator.allocate(1024).unwrap();

    allocator.free(a).unwrap();
    allocator.free(a).unwrap();
    assert_eq!(layout(&allocator), vec!["free 2048"]);
  }

  #[test]
  fn test_coalesce_on_scratch_headers() {
    let mut headers = vec![
      Header::new(Status::Free, 8),
      Header::new(Status::Free, 8),
      Header::new(Status::Free, 9),
      Header::new(Status::InUse, 10),
    ];

    let index = coalesce(&mut headers, 1, 11).unwrap();

    assert_eq!(index, 0);
    assert_eq!(
      headers,
      vec![Header::new(Status::Free, 10), Header::new(Status::InUse, 10)]
    );
  }

  #[test]
  fn test_resize_grows_and_keeps_contents() {
    let mut allocator = heap(12, 8);

    let a = allocator.allocate(256).unwrap();
    let _b = allocator.allocate(256).unwrap();
    allocator.payload_mut(a).unwrap().fill(0x5A);

    let moved = allocator.resize(Some(a), 1024).unwrap().unwrap();
    assert_eq!(moved, Address::new(1024));

    let payload = allocator.payload(moved).unwrap();
    assert_eq!(payload.len(), 1024);
    assert!(payload[..256].iter().all(|&b| b == 0x5A));
  }

  #[test]
  fn test_resize_shrinks_in_place() {
    let mut allocator = heap(11, 8);

    let a = allocator.allocate(1024).unwrap();
    allocator.payload_mut(a).unwrap()[..4].copy_from_slice(b"budd");

    let moved = allocator.resize(Some(a), 256).unwrap().unwrap();
    assert_eq!(moved, a);
    assert_eq!(&allocator.payload(moved).unwrap()[..4], b"budd");
    assert_eq!(
      layout(&allocator),
      vec!["allocated 256", "free 256", "free 512", "free 1024"]
    );
  }

  #[test]
  fn test_resize_uses_merged_buddy() {
    let mut allocator = heap(11, 10);

    let a = allocator.allocate(1024).unwrap();
    allocator.payload_mut(a).unwrap().fill(7);

    let moved = allocator.resize(Some(a), 2048).unwrap().unwrap();
    assert_eq!(moved, a);
    assert_eq!(layout(&allocator), vec!["allocated 2048"]);
    assert!(allocator.payload(moved).unwrap()[..1024].iter().all(|&b| b == 7));
  }

  #[test]
  fn test_resize_failure_leaves_block_alone() {
    let mut allocator = heap(11, 10);

    let a = allocator.allocate(1024).unwrap();
    let _b = allocator.allocate(1024).unwrap();
    allocator.payload_mut(a).unwrap().fill(9);

    let err = allocator.resize(Some(a), 2048).unwrap_err();
    assert!(matches!(err, AllocError::OutOfMemory { requested: 2048 }));
    assert_eq!(layout(&allocator), vec!["allocated 1024", "allocated 1024"]);
    assert!(allocator.payload(a).unwrap().iter().all(|&b| b == 9));
  }

  #[test]
  fn test_resize_rolls_back_when_allocate_fails() {
    let config = HeapConfig::new(12, 10);
    let region = ArenaRegion::new(config.footprint().unwrap() + 1);
    let mut allocator = BuddyAllocator::initialize(region, config).unwrap();

    let a = allocator.allocate(2048).unwrap();
    let b = allocator.allocate(2048).unwrap();
    allocator.free(a).unwrap();
    allocator.payload_mut(b).unwrap().fill(3);

    // Freeing b merges the whole heap, but splitting it down to 1024 needs two
    // headers and the region only has room for one.
    let err = allocator.resize(Some(b), 1024).unwrap_err();
    assert!(matches!(err, AllocError::OutOfMemory { .. }));
    assert_eq!(layout(&allocator), vec!["free 2048", "allocated 2048"]);
    assert!(allocator.payload(b).unwrap().iter().all(|&x| x == 3));
  }

  #[test]
  fn test_resize_delegates() {
    let mut allocator = heap(11, 10);

    let a = allocator.resize(None, 100).unwrap().unwrap();
    assert_eq!(layout(&allocator), vec!["allocated 1024", "free 1024"]);

    assert_eq!(allocator.resize(Some(a), 0).unwrap(), None);
    assert_eq!(layout(&allocator), vec!["free 2048"]);
  }

  #[test]
  fn test_resize_free_block_is_invalid() {
    let mut allocator = heap(11, 10);
    allocator.allocate(1024).unwrap();

    let err = allocator.resize(Some(Address::new(1024)), 512).unwrap_err();
    assert!(matches!(err, AllocError::InvalidPointer(_)));
  }

  #[test]
  fn test_validate_detects_bad_sum() {
    let mut allocator = heap(11, 10);
    allocator.allocate(1024).unwrap();

    let start = 2 + 2048;
    allocator.region_mut().as_mut_slice()[start + 1] = 11;

    let err = allocator.validate().unwrap_err();
    assert!(matches!(err, AllocError::CorruptionDetected(_)));
  }

  #[test]
  fn test_validate_detects_misaligned_block() {
    let mut allocator = heap(12, 10);
    allocator.allocate(1024).unwrap();
    // [1024, 1024, 2048] rewritten as [1024, 2048, 1024]
    let start = 2 + 4096;
    let bytes = allocator.region_mut().as_mut_slice();
    bytes[start + 1] = 11;
    bytes[start + 2] = 10;

    assert!(matches!(
      allocator.validate(),
      Err(AllocError::CorruptionDetected(_))
    ));
  }

  #[test]
  fn test_validate_detects_bad_descriptor() {
    let mut allocator = heap(11, 10);
    allocator.region_mut().as_mut_slice()[1] = 12;

    assert!(matches!(
      allocator.describe(),
      Err(AllocError::CorruptionDetected(_))
    ));
  }

  #[test]
  fn test_attach_reads_existing_heap() {
    let mut allocator = heap(11, 10);
    let a = allocator.allocate(1024).unwrap();

    let reopened = BuddyAllocator::attach(allocator.into_region()).unwrap();
    assert_eq!(
      reopened.describe().unwrap(),
      vec![
        BlockInfo {
          status: Status::InUse,
          size: 1024
        },
        BlockInfo {
          status: Status::Free,
          size: 1024
        },
      ]
    );
    assert!(reopened.payload(a).is_ok());
  }

  #[test]
  fn test_attach_rejects_empty_region() {
    let result = BuddyAllocator::attach(ArenaRegion::new(16));
    assert!(matches!(result, Err(AllocError::CorruptionDetected(_))));
  }

  impl BuddyAllocator<ArenaRegion> {
    fn directory_len(&self) -> usize {
      let descriptor = self.validate().unwrap();
      self.directory(&descriptor).len()
    }
  }
}
