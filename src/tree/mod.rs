//! Per-pass tree construction.
//!
//! A pass runs four stages in order:
//!
//! 1. **Build**: nest declaration records by extent containment
//! 2. **Bind**: inject group nodes, then attach comments to their targets
//! 3. **Convert**: turn the arena into an owned [`Entity`] tree with paths
//! 4. **Organize**: bucket scope members into display categories
//!
//! The [`merge`] stage then folds finished pass trees into one master tree.

pub mod binder;
pub mod builder;
pub mod merge;
pub mod organize;

use crate::model::{Access, Entity, Extent, Kind};

/// Index of a node inside a [`Forest`].
pub type NodeId = usize;

/// One arena slot. `parent` is a plain index used for path lookups only.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Kind,
    pub name: String,
    pub extent: Extent,
    pub signature: Option<String>,
    pub access: Access,
    pub comments: Vec<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: Kind, name: impl Into<String>, extent: Extent) -> Self {
        Self {
            kind,
            name: name.into(),
            extent,
            signature: None,
            access: Access::None,
            comments: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena holding one pass's declaration tree under a `Global` root.
///
/// Children of every node are kept sorted by extent start.
#[derive(Debug, Clone)]
pub struct Forest {
    nodes: Vec<Node>,
    file: u32,
}

impl Forest {
    pub const ROOT: NodeId = 0;

    pub fn new(file: u32) -> Self {
        let root = Node::new(Kind::Global, "", Extent::new(file, 0, usize::MAX));
        Self {
            nodes: vec![root],
            file,
        }
    }

    pub fn file(&self) -> u32 {
        self.file
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Top-level declarations.
    pub fn roots(&self) -> &[NodeId] {
        &self.nodes[Self::ROOT].children
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Add a detached node and return its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// True for a node spanning exactly its parent's extent, such as a
    /// template parameter reported over its whole template. Such a node
    /// belongs to the parent but never encloses the parent's other members.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.nodes[id]
            .parent
            .is_some_and(|p| p != Self::ROOT && self.nodes[p].extent == self.nodes[id].extent)
    }

    pub fn sort_children(&mut self, id: NodeId) {
        let mut children = std::mem::take(&mut self.nodes[id].children);
        children.sort_by_key(|&c| (self.nodes[c].extent.start, self.nodes[c].extent.end));
        self.nodes[id].children = children;
    }

    /// Qualified path reconstructed from parent links. Containers and the
    /// root do not contribute.
    pub fn qualified_path(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current];
            if node.kind != Kind::Global && (current == id || !node.kind.is_container()) {
                path.push(node.name.clone());
            }
            cursor = node.parent;
        }
        path.reverse();
        path
    }

    /// Convert into an owned tree, assigning qualified paths on the way down.
    pub fn into_entity(self) -> Entity {
        let mut slots: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        convert(&mut slots, Self::ROOT, &[]).unwrap_or_else(Entity::global)
    }
}

fn convert(slots: &mut [Option<Node>], id: NodeId, enclosing: &[String]) -> Option<Entity> {
    let node = slots.get_mut(id)?.take()?;

    let mut entity = Entity::new(node.kind, node.name);
    entity.signature = node.signature;
    entity.access = node.access;
    entity.comments = node.comments;
    if node.kind != Kind::Global {
        entity.extent = Some(node.extent);
        entity.path = enclosing.to_vec();
        entity.path.push(entity.name.clone());
    }

    let scope = entity.scope_path(enclosing);
    entity.children = node
        .children
        .iter()
        .filter_map(|&child| convert(slots, child, &scope))
        .collect();
    Some(entity)
}
