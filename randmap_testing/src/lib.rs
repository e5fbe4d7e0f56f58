//! Test tooling shared by the crates of the workspace.
#![allow(dead_code)]

pub mod entropy;
pub use entropy::*;

pub mod generate;
pub use generate::*;

pub mod hashers;
pub use hashers::*;

pub mod map;
pub use map::*;

pub mod sampling;
pub use sampling::*;

pub mod stat;
pub use stat::*;

#[doc(hidden)]
pub use compose_idents::compose_idents;
