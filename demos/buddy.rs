use std::io::Read;

use rbuddy::{Address, BuddyAllocator, GrowableRegion, HeapConfig, MmapRegion};
use tracing_subscriber::EnvFilter;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect the mapping with tools like `pmap` or `gdb`
/// between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints every block in address order, followed by the region frontier.
fn print_heap(
  label: &str,
  heap: &BuddyAllocator<MmapRegion>,
) {
  println!("[{label}] frontier = {}", heap.region().frontier());
  match heap.describe() {
    Ok(blocks) => {
      for block in blocks {
        println!("    {block}");
      }
    }
    Err(err) => println!("    {err}"),
  }
}

fn print_alloc(
  size: usize,
  result: &rbuddy::Result<Address>,
) {
  match result {
    Ok(address) => println!("Allocated {size} bytes, address = {address}"),
    Err(err) => println!("Could not allocate {size} bytes: {err}"),
  }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .init();

  // 64 KiB heap, 1 KiB minimum block, and room for 64 directory headers.
  let config = HeapConfig::default();
  let region = MmapRegion::new(config.footprint()? + 64)?;
  println!("Mapped region at {:?}", region.base_ptr());

  let mut heap = BuddyAllocator::initialize(region, config)?;
  print_heap("start", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Three small requests. Each lands in its own 1 KiB block, so the
  //    addresses are exactly 1024 bytes apart.
  // --------------------------------------------------------------------
  let mut addresses = Vec::new();
  for size in [1022, 1024, 1000] {
    let result = heap.allocate(size);
    print_alloc(size, &result);
    addresses.push(result?);
  }
  print_heap("after small allocations", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Write into a block and grow it. The contents follow the block to
  //    its new address.
  // --------------------------------------------------------------------
  heap.payload_mut(addresses[0])?[..5].copy_from_slice(b"hello");
  if let Some(moved) = heap.resize(Some(addresses[0]), 4096)? {
    println!(
      "\n[2] Resized {} -> {}, payload starts with {:?}",
      addresses[0],
      moved,
      String::from_utf8_lossy(&heap.payload(moved)?[..5])
    );
    addresses[0] = moved;
  }
  print_heap("after resize", &heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Free everything. Buddies merge back together and the directory
  //    shrinks to a single header.
  // --------------------------------------------------------------------
  for address in addresses {
    heap.free(address)?;
    println!("\n[3] Freed {address}");
  }
  print_heap("after free", &heap);

  println!("\n[4] End of example. The mapping is released when the region is dropped.");
  Ok(())
}
