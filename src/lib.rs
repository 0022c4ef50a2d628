//! # rbuddy - A Buddy Allocator over a Growable Region
//!
//! This crate provides a **buddy-system allocator** that manages a single
//! contiguous region of bytes which grows and shrinks like a program break
//! moved by `sbrk(2)`.
//!
//! ## Overview
//!
//! The heap is `2^k` bytes. Blocks are always powers of two: a request is served
//! by the smallest free block that fits, halving it as often as possible, and a
//! freed block is merged back with its "buddy" (the other half of the split that
//! produced it) whenever both are free.
//!
//! ```text
//!   Splitting a 4 KiB heap for a 300 byte request:
//!
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                            4096                               │
//!   └───────────────────────────────────────────────────────────────┘
//!   ┌───────────────────────────────┬───────────────────────────────┐
//!   │             2048              │             2048              │
//!   └───────────────────────────────┴───────────────────────────────┘
//!   ┌───────────────┬───────────────┬───────────────────────────────┐
//!   │     1024      │     1024      │             2048              │
//!   └───────────────┴───────────────┴───────────────────────────────┘
//!   ┌───────┬───────┬───────────────┬───────────────────────────────┐
//!   │ 512 ▓ │  512  │     1024      │             2048              │
//!   └───────┴───────┴───────────────┴───────────────────────────────┘
//!       ▲
//!       └── returned to the caller
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rbuddy
//!   ├── region      - GrowableRegion trait, ArenaRegion, MmapRegion
//!   ├── class       - Size-class arithmetic
//!   ├── header      - One-byte block header encoding
//!   ├── descriptor  - HeapConfig and the on-region HeapDescriptor
//!   ├── directory   - Block directory views (locate, split, merge primitives)
//!   ├── buddy       - BuddyAllocator implementation
//!   └── error       - AllocError and RegionError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rbuddy::{ArenaRegion, BuddyAllocator, HeapConfig};
//!
//! let config = HeapConfig::new(16, 10);
//! let region = ArenaRegion::new(config.footprint().unwrap() + 64);
//! let mut heap = BuddyAllocator::initialize(region, config).unwrap();
//!
//! let first = heap.allocate(1022).unwrap();
//! let second = heap.allocate(1024).unwrap();
//! assert_eq!(second.offset() - first.offset(), 1024);
//!
//! heap.payload_mut(first).unwrap()[0] = 42;
//!
//! heap.free(first).unwrap();
//! heap.free(second).unwrap();
//! assert_eq!(heap.describe().unwrap().len(), 1);
//! ```
//!
//! ## How It Works
//!
//! All bookkeeping lives inside the region itself:
//!
//! ```text
//!   Region Layout:
//!
//!   offset 0                                                    frontier
//!   ┌──────┬──────┬───────────────────────────────────┬────┬────┬────┐
//!   │ init │ min  │        payload: 2^init bytes      │ h0 │ h1 │ .. │
//!   └──────┴──────┴───────────────────────────────────┴────┴────┴────┘
//!   └─ descriptor ┘                                   └─ directory ──┘
//!
//!   Header byte:  ┌────────┬──────────────────────┐
//!                 │ status │     size class       │
//!                 │ 1 bit  │       7 bits         │
//!                 └────────┴──────────────────────┘
//! ```
//!
//! The directory holds one header per block, in address order. No header stores
//! an address: a block's address is the sum of the sizes of the blocks before
//! it, and its *serial* (that address divided by its own size) tells whether its
//! buddy is the previous block (odd) or the next one (even).
//!
//! Splitting inserts one header and moves the frontier forward by one byte;
//! merging removes one header and moves it back.
//!
//! ## Guarantees
//!
//! - The block sizes always add up to exactly `2^init`.
//! - Every returned address is a multiple of its block's size.
//! - Before any operation runs, the metadata is checked against these invariants.
//!   A caller that scribbles over the directory gets
//!   [`AllocError::CorruptionDetected`] instead of a wrong answer.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Linear lookups**: Every operation walks the directory from the start

pub mod buddy;
pub mod class;
pub mod descriptor;
pub mod directory;
pub mod error;
pub mod header;
pub mod region;

pub use buddy::{BlockInfo, BuddyAllocator};
pub use descriptor::HeapConfig;
pub use directory::Address;
pub use error::{AllocError, RegionError, Result};
pub use header::Status;
#[cfg(unix)]
pub use region::MmapRegion;
pub use region::{ArenaRegion, GrowableRegion};
