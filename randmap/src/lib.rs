//! Hash map with O(1) uniform random sampling and randomized-order iteration.
//!
//! [`RandMap`] stores its entries in buckets of eight slots with overflow chains and resizes
//! incrementally, a few buckets per write. On top of the ordinary map operations it provides:
//!
//! - [`RandMap::sample_entry`] and friends, which return a uniformly random entry in O(1)
//!   expected time, including while a resize is in progress.
//! - [`RandMap::iter`], which visits every entry exactly once in an order that differs between
//!   traversals, and [`Cursor`], which does the same without borrowing the map.
//!
//! Every operation has a "fast" variant drawing from a per-thread xoshiro generator instead of a
//! cryptographically secure one.
//!
//! # Examples
//!
//! ```rust
//! use randmap::{RandMap, RandMapError};
//!
//! let mut peers: RandMap<&str, u16> = RandMap::new();
//! assert_eq!(peers.sample_key(), Err(RandMapError::EmptyCollection));
//!
//! peers.insert("alpha", 7001);
//! peers.insert("beta", 7002);
//! let (name, port) = peers.fast_sample_entry().unwrap();
//! assert_eq!(peers.get(name), Some(port));
//!
//! let mut ports: Vec<u16> = peers.values().copied().collect();
//! ports.sort();
//! assert_eq!(ports, vec![7001, 7002]);
//! ```
pub mod config;
pub mod hashing;
mod map;
mod random;
mod table;
pub mod utils;

pub use config::Config;
pub use map::*;
pub use randmap_core::{HashMap, RandMapError, Sample, Traverse};
