pub mod core;
pub mod error;

pub use crate::core::*;
pub use crate::error::*;
