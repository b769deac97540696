//! Rows renderer: one JSON object per line, one line per node.

use crate::export;
use crate::model::Entity;
use crate::render::Renderer;
use anyhow::Result;

pub struct RowsRenderer;

impl Renderer for RowsRenderer {
    fn render(&self, tree: &Entity) -> Result<String> {
        let mut out = String::new();
        for row in export::flatten(tree) {
            out.push_str(&serde_json::to_string(&row)?);
            out.push('\n');
        }
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "jsonl"
    }
}
