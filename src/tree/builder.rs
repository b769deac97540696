//! Extent tree builder: nest declaration records by source-range containment.
//!
//! Records arrive in any order. Each insertion walks down from the root:
//! a sibling that contains the new extent receives it, siblings the new
//! extent contains are re-parented under it, and a partial overlap aborts
//! the pass.

use crate::error::{Diagnostic, Error, Result};
use crate::model::{DeclRecord, Extent, Kind, Nesting, PassInput};
use crate::tree::{Forest, Node, NodeId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Build the extent forest for one pass.
pub fn build(pass: &PassInput) -> Result<(Forest, Vec<Diagnostic>)> {
    let mut forest = Forest::new(pass.file_id);
    let mut diagnostics = Vec::new();
    let mut warned: HashSet<String> = HashSet::new();

    for record in &pass.declarations {
        let kind = match Kind::parse(&record.kind) {
            Some(Kind::Global) => continue,
            Some(kind) => kind,
            None => {
                let extent = record_extent(record, pass.file_id);
                if warned.insert(record.kind.clone()) {
                    let diag = Diagnostic::UnknownKind {
                        tag: record.kind.clone(),
                        name: record.name.clone(),
                        extent,
                    };
                    warn!(file = %pass.file, "{}", diag);
                    diagnostics.push(diag);
                }
                Kind::Unknown
            }
        };

        let node = node_from_record(record, kind, pass.file_id)?;
        let id = forest.alloc(node);
        insert(&mut forest, Forest::ROOT, id)?;
    }

    debug!(
        file = %pass.file,
        nodes = forest.len() - 1,
        "built extent tree"
    );
    Ok((forest, diagnostics))
}

fn record_extent(record: &DeclRecord, file: u32) -> Extent {
    Extent::new(record.file.unwrap_or(file), record.start, record.end)
}

fn node_from_record(record: &DeclRecord, kind: Kind, file: u32) -> Result<Node> {
    let extent = record_extent(record, file);
    if extent.end < extent.start {
        return Err(Error::MalformedExtent {
            first: extent,
            second: extent,
        });
    }

    let mut node = Node::new(kind, record.name.clone(), extent);
    node.signature = record.signature.clone();
    node.access = record.access.unwrap_or_default();
    if let Some(comment) = record.comment.as_ref().filter(|c| !c.trim().is_empty()) {
        node.comments.push(comment.clone());
    }
    Ok(node)
}

/// Insert the detached node `id` somewhere below `scope`.
pub fn insert(forest: &mut Forest, scope: NodeId, id: NodeId) -> Result<()> {
    let extent = forest.node(id).extent;
    let kind = forest.node(id).kind;
    let mut adopted = Vec::new();

    let siblings = forest.children(scope).to_vec();
    for sibling in siblings {
        if forest.is_attached(sibling) {
            continue;
        }
        let (other, other_kind) = {
            let node = forest.node(sibling);
            (node.extent, node.kind)
        };
        match other.nesting(&extent) {
            Nesting::Contains => return insert(forest, sibling, id),
            // First one in wins as parent and keeps its members.
            Nesting::Equal if other_kind != kind => {
                forest.node_mut(id).parent = Some(sibling);
                forest.node_mut(sibling).children.push(id);
                forest.sort_children(sibling);
                return Ok(());
            }
            Nesting::Equal => return Err(Error::DuplicateExtent { kind, extent }),
            Nesting::Within => adopted.push(sibling),
            Nesting::Disjoint => {}
            Nesting::Overlap => {
                return Err(Error::MalformedExtent {
                    first: other,
                    second: extent,
                })
            }
        }
    }

    if !adopted.is_empty() {
        debug!(
            name = %forest.node(id).name,
            count = adopted.len(),
            "re-parenting earlier declarations"
        );
        forest
            .node_mut(scope)
            .children
            .retain(|c| !adopted.contains(c));
        for &child in &adopted {
            forest.node_mut(child).parent = Some(id);
        }
        forest.node_mut(id).children.extend(adopted);
        forest.sort_children(id);
    }

    forest.node_mut(id).parent = Some(scope);
    forest.node_mut(scope).children.push(id);
    forest.sort_children(scope);
    Ok(())
}
