//! Renderer module: trait-based format dispatch.

pub mod json;
pub mod outline;
pub mod rows;

use crate::model::Entity;
use anyhow::{anyhow, Result};

/// Trait for rendering the merged tree into a specific output format.
pub trait Renderer {
    fn render(&self, tree: &Entity) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "json" => Ok(Box::new(json::JsonRenderer)),
        "outline" | "text" => Ok(Box::new(outline::OutlineRenderer)),
        "rows" | "jsonl" => Ok(Box::new(rows::RowsRenderer)),
        _ => Err(anyhow!(
            "unknown format: {}. Use json, outline, or rows",
            format
        )),
    }
}
