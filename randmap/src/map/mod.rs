//! The randomized hash map.
//!
//! The implementation follows the classic bucketized chaining layout with incremental resizing
//! and adds two read-only algorithms on top of it: rejection sampling of a uniformly random entry
//! and a randomized-order traversal that stays exactly-once while the table is being evacuated.
mod core;
pub use self::core::*;
mod ctors;
mod hash_map;
mod iter;
pub use iter::*;
mod resize;
pub use resize::ResizeKind;
mod sample;
