//! Design bitmap codec
//!
//! This library converts between 4-bit palette-indexed tile bitmaps and RGBA
//! rasters:
//! - Decode packed design documents into layer, part and net images
//! - Quantize uploads to one shared palette of at most 15 colors
//! - Split oversized uploads into a grid of tiles under a tile budget
//! - Map numeric design ids to `XXXX-XXXX-XXXX` design codes and back

pub mod bitmap;
pub mod cli;
pub mod code;
pub mod compose;
pub mod config;
pub mod design;
pub mod document;
pub mod encode;
pub mod error;
pub mod output;
pub mod palette;
pub mod tiling;
pub mod variant;

pub use error::DesignError;
