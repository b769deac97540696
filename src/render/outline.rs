//! Outline renderer: indented plain-text dump of the tree.
//!
//! One line per node: kind, name, signature, access and how many comment
//! blocks it carries. Meant for eyeballing a merge result in a terminal.

use crate::model::{Access, Entity, Kind};
use crate::render::Renderer;
use anyhow::Result;

pub struct OutlineRenderer;

impl Renderer for OutlineRenderer {
    fn render(&self, tree: &Entity) -> Result<String> {
        let mut out = String::new();
        write_node(&mut out, tree, 0);
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "txt"
    }
}

fn write_node(out: &mut String, entity: &Entity, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(entity.kind.as_str());

    let name = match (entity.kind, entity.name.as_str()) {
        (Kind::Global, _) => "::",
        (_, "") => "(anonymous)",
        (_, name) => name,
    };
    out.push(' ');
    out.push_str(name);

    if let Some(ref sig) = entity.signature {
        out.push_str(&format!(" `{}`", sig));
    }
    if entity.access != Access::None {
        out.push_str(&format!(" [{}]", entity.access.as_str()));
    }
    match entity.comments.len() {
        0 => {}
        1 => out.push_str(" (1 comment)"),
        n => out.push_str(&format!(" ({} comments)", n)),
    }
    out.push('\n');

    for child in &entity.children {
        write_node(out, child, depth + 1);
    }
}
