//! Layout calculation for card sheets
//!
//! This module handles the geometric side of printing a deck:
//! - Card box size and auto-fit scaling
//! - Back-side ordering for duplex printing
//! - Assigning print slots to page cells

mod duplex;
mod geometry;
mod tiling;
mod types;

pub use duplex::*;
pub use geometry::*;
pub use tiling::*;
pub use types::*;
