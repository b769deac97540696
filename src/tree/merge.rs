//! Cross-pass merge: fold organized pass trees into one master tree.
//!
//! Children are matched by name inside the same container, so a redeclared
//! namespace or class from a later pass lands on the node the first pass
//! created. A declaration whose path already exists under a different
//! container (a group in one pass, a bucket in another) is set aside and
//! merged at the existing node once the pass has been walked. Same-named
//! declarations whose signatures disagree are kept apart under an
//! [`Kind::OverloadSet`] placeholder; [`Merger::finish`] resolves those sets
//! once every pass has been folded.

use crate::error::{display_path, Diagnostic, Error, Result};
use crate::model::{Access, Entity, Kind};
use crate::tree::organize::{scheme, Bucket};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Accumulates pass trees. Passes must be folded in a stable order: the
/// first pass to introduce a node decides where it sits.
#[derive(Debug)]
pub struct Merger {
    master: Entity,
    state: MergeState,
    passes: usize,
}

#[derive(Debug, Default)]
struct MergeState {
    /// Kind of the first declaration seen at each path.
    index: HashMap<Vec<String>, Kind>,
    /// Declarations whose path lives under another container of the master tree.
    displaced: Vec<Entity>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

impl Merger {
    pub fn new() -> Self {
        Self {
            master: Entity::global(),
            state: MergeState::default(),
            passes: 0,
        }
    }

    pub fn master(&self) -> &Entity {
        &self.master
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Fold one organized pass tree into the master tree.
    ///
    /// The tree is checked before anything is touched, so a rejected pass
    /// leaves the master tree as it was.
    pub fn fold(&mut self, tree: Entity) -> Result<()> {
        validate_paths(&tree)?;

        let Entity {
            comments, children, ..
        } = tree;
        self.master.absorb_comments(comments);
        self.state.merge_children(&mut self.master, children);
        // Unifying a displaced node can displace its own members in turn.
        loop {
            let displaced = std::mem::take(&mut self.state.displaced);
            if displaced.is_empty() {
                break;
            }
            for incoming in displaced {
                self.state.merge_at_path(&mut self.master, incoming);
            }
        }
        self.passes += 1;

        debug!(
            passes = self.passes,
            nodes = self.master.count(),
            "folded pass into master tree"
        );
        Ok(())
    }

    /// Resolve overload sets and hand over the finished tree.
    pub fn finish(mut self) -> (Entity, Vec<Diagnostic>) {
        self.state.resolve(&mut self.master);
        (self.master, self.state.diagnostics)
    }
}

/// Check that every node's path is its scope's path plus its own name.
pub fn validate_paths(tree: &Entity) -> Result<()> {
    check_scope(tree, &tree.scope_path(&[]))
}

fn check_scope(parent: &Entity, scope: &[String]) -> Result<()> {
    for child in &parent.children {
        let consistent = matches!(
            child.path.split_last(),
            Some((last, prefix)) if *last == child.name && prefix == scope
        );
        if !consistent {
            return Err(Error::MissingParentInvariant {
                path: display_path(&child.path),
                parent: display_path(scope),
            });
        }
        check_scope(child, &child.scope_path(scope))?;
    }
    Ok(())
}

/// Kinds that may describe the same entity across passes.
fn compatible(a: Kind, b: Kind) -> bool {
    a == b || (matches!(a, Kind::Class | Kind::Struct) && matches!(b, Kind::Class | Kind::Struct))
}

/// Absent signatures agree with anything.
fn signatures_agree(a: &Entity, b: &Entity) -> bool {
    match (&a.signature, &b.signature) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

fn same_slot(existing: &Entity, incoming: &Entity) -> bool {
    match (existing.kind, incoming.kind) {
        (Kind::OverloadSet, kind) => existing
            .children
            .first()
            .is_some_and(|member| compatible(member.kind, kind)),
        (a, b) if a.is_container() || b.is_container() => a == b,
        (a, b) => compatible(a, b),
    }
}

impl MergeState {
    fn merge_children(&mut self, parent: &mut Entity, incoming: Vec<Entity>) {
        let mut unnamed: HashMap<Kind, usize> = HashMap::new();
        for child in incoming {
            if child.kind == Kind::OverloadSet {
                for member in child.children {
                    self.merge_child(parent, member, &mut unnamed);
                }
            } else {
                self.merge_child(parent, child, &mut unnamed);
            }
        }
    }

    fn merge_child(
        &mut self,
        parent: &mut Entity,
        incoming: Entity,
        unnamed: &mut HashMap<Kind, usize>,
    ) {
        let slot = if incoming.name.is_empty() {
            // Anonymous declarations pair up by position among their kind.
            let ordinal = unnamed.entry(incoming.kind).or_insert(0);
            let found = parent
                .children
                .iter()
                .enumerate()
                .filter(|(_, c)| c.name.is_empty() && c.kind == incoming.kind)
                .nth(*ordinal)
                .map(|(i, _)| i);
            *ordinal += 1;
            found
        } else {
            parent
                .children
                .iter()
                .position(|c| c.name == incoming.name && same_slot(c, &incoming))
        };

        let Some(i) = slot else {
            let elsewhere = !incoming.name.is_empty()
                && !incoming.kind.is_container()
                && self
                    .index
                    .get(&incoming.path)
                    .is_some_and(|&kind| compatible(kind, incoming.kind));
            if elsewhere {
                debug!(path = %display_path(&incoming.path), "declaration sits in another container");
                self.displaced.push(incoming);
            } else {
                self.insert(parent, incoming);
            }
            return;
        };

        self.merge_into(&mut parent.children[i], incoming);
    }

    /// Merge `incoming` into the master node that already carries its path.
    fn merge_at_path(&mut self, master: &mut Entity, incoming: Entity) {
        match find_path(master, &incoming.path) {
            Some(existing) => self.merge_into(existing, incoming),
            None => self.insert(master, incoming),
        }
    }

    fn merge_into(&mut self, existing: &mut Entity, incoming: Entity) {
        if existing.kind == Kind::OverloadSet {
            self.add_overload(existing, incoming);
        } else if existing.kind.is_container() || signatures_agree(existing, &incoming) {
            self.unify(existing, incoming);
        } else {
            debug!(path = %display_path(&incoming.path), "opening overload set");
            let mut set = Entity::new(Kind::OverloadSet, incoming.name.clone());
            set.path = incoming.path.clone();
            let first = std::mem::replace(existing, set);
            self.register(&incoming);
            existing.children = vec![first, incoming];
        }
    }

    fn add_overload(&mut self, set: &mut Entity, incoming: Entity) {
        if let Some(member) = set
            .children
            .iter_mut()
            .find(|m| compatible(m.kind, incoming.kind) && signatures_agree(m, &incoming))
        {
            self.unify(member, incoming);
        } else {
            self.register(&incoming);
            set.children.push(incoming);
        }
    }

    fn unify(&mut self, existing: &mut Entity, incoming: Entity) {
        existing.absorb_comments(incoming.comments);
        if existing.access == Access::None {
            existing.access = incoming.access;
        }
        if existing.signature.is_none() {
            existing.signature = incoming.signature;
        }
        if existing.extent.is_none() {
            existing.extent = incoming.extent;
        }
        self.merge_children(existing, incoming.children);
    }

    /// Add a node the master tree has no counterpart for.
    fn insert(&mut self, parent: &mut Entity, mut incoming: Entity) {
        if incoming.kind.is_container() {
            // Members still go through path checks one by one.
            let members = std::mem::take(&mut incoming.children);
            let had_members = !members.is_empty();
            self.merge_children(&mut incoming, members);
            if had_members && incoming.children.is_empty() {
                return;
            }
        } else if !incoming.name.is_empty() {
            if let Some(&existing) = self.index.get(&incoming.path) {
                if !compatible(existing, incoming.kind) {
                    let diag = Diagnostic::IncompatibleMerge {
                        path: display_path(&incoming.path),
                        existing,
                        dropped: incoming.kind,
                    };
                    warn!("{}", diag);
                    self.diagnostics.push(diag);
                    return;
                }
            }
            self.register(&incoming);
        }

        let at = if incoming.kind == Kind::Bucket {
            bucket_position(parent, &incoming.name)
        } else {
            parent.children.len()
        };
        parent.children.insert(at, incoming);
    }

    fn register(&mut self, entity: &Entity) {
        let index = &mut self.index;
        entity.walk(&mut |node| {
            if !node.kind.is_container() && node.kind != Kind::Global {
                index.entry(node.path.clone()).or_insert(node.kind);
            }
        });
    }

    /// Collapse identical overloads and dissolve sets left with one member.
    fn resolve(&mut self, entity: &mut Entity) {
        for slot in &mut entity.children {
            if slot.kind != Kind::OverloadSet {
                continue;
            }
            let members = std::mem::take(&mut slot.children);
            let mut distinct: Vec<Entity> = Vec::with_capacity(members.len());
            for member in members {
                match distinct
                    .iter_mut()
                    .find(|d| d.kind == member.kind && d.signature == member.signature)
                {
                    Some(kept) => self.unify(kept, member),
                    None => distinct.push(member),
                }
            }
            if distinct.len() == 1 {
                *slot = distinct.remove(0);
            } else {
                slot.children = distinct;
            }
        }

        for child in &mut entity.children {
            self.resolve(child);
        }
    }
}

/// The declaration or overload set at `path`, searched through every container.
fn find_path<'a>(entity: &'a mut Entity, path: &[String]) -> Option<&'a mut Entity> {
    let here = entity
        .children
        .iter()
        .position(|c| c.path == path && !matches!(c.kind, Kind::Group | Kind::Bucket));
    match here {
        Some(i) => entity.children.get_mut(i),
        None => entity.children.iter_mut().find_map(|c| find_path(c, path)),
    }
}

/// Where a new bucket goes so buckets keep their display order.
fn bucket_position(parent: &Entity, label: &str) -> usize {
    let end = parent.children.len();
    let Some(order) = scheme(parent.kind) else {
        return end;
    };
    let rank = |name: &str| Bucket::from_label(name).and_then(|b| order.iter().position(|&o| o == b));
    let Some(new_rank) = rank(label) else {
        return end;
    };
    parent
        .children
        .iter()
        .position(|c| c.kind == Kind::Bucket && rank(&c.name).is_some_and(|r| r > new_rank))
        .unwrap_or(end)
}
