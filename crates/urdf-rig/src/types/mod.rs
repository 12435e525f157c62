//! Core type definitions

mod geometry;
mod joint;
mod material;
mod pose;

pub use geometry::*;
pub use joint::*;
pub use material::*;
pub use pose::*;
