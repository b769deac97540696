//! JSON renderer: the whole tree as one nested document.

use crate::model::Entity;
use crate::render::Renderer;
use anyhow::Result;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, tree: &Entity) -> Result<String> {
        let mut out = serde_json::to_string_pretty(tree)?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
