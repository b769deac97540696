//! cxxdoc: build one documentation tree from C++ declaration and comment
//! streams produced by an external syntax analyzer.
//!
//! Each analysis pass is nested by source extent, has its comments bound,
//! and is organized into buckets; the passes are then merged into a master
//! tree that [`render`] and [`export`] hand to downstream tooling.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod tree;

pub use config::Config;
pub use error::{Diagnostic, Error, Result};
pub use model::{Entity, Kind, PassInput};
pub use pipeline::{run, Outcome};
