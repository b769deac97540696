//! Comment binder: attach each comment token to the declaration it documents.
//!
//! Group headers are injected first, latest offset first, so each header
//! only has to collect the siblings between itself and the next group.
//! Leading and trailing comments are then bound against the final shape.

use crate::error::Diagnostic;
use crate::model::{Access, Attachment, CommentToken, Extent, Kind};
use crate::tree::{Forest, Node, NodeId};
use tracing::{debug, warn};

/// Where one comment token ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Index into the token slice given to [`bind`].
    pub token: usize,
    pub target: NodeId,
}

#[derive(Debug, Default)]
pub struct BindReport {
    /// Exactly one entry per input token.
    pub bindings: Vec<Binding>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A group header, from a `GroupStart` comment or an access specifier.
struct Header {
    name: String,
    offset: usize,
    doc: Vec<String>,
    token: Option<usize>,
}

/// Bind `tokens` (sorted by offset) into `forest`.
///
/// With `access_sections`, `public:`/`protected:`/`private:` declarations are
/// replaced by groups named after their access level.
pub fn bind(forest: &mut Forest, tokens: &[CommentToken], access_sections: bool) -> BindReport {
    let mut report = BindReport::default();

    let mut headers: Vec<Header> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.attachment == Attachment::GroupStart)
        .map(|(i, t)| {
            let (name, doc) = t.group_header();
            Header {
                name,
                offset: t.offset,
                doc: doc.into_iter().collect(),
                token: Some(i),
            }
        })
        .collect();
    if access_sections {
        headers.extend(detach_access_specifiers(forest));
    }
    headers.sort_by(|a, b| b.offset.cmp(&a.offset));

    for header in headers {
        let group = inject_group(forest, &header.name, header.offset);
        forest.node_mut(group).comments.extend(header.doc);
        if let Some(token) = header.token {
            report.bindings.push(Binding { token, target: group });
        }
    }

    for (i, token) in tokens.iter().enumerate() {
        let target = match token.attachment {
            Attachment::GroupStart => continue,
            Attachment::Leading => following(forest, Forest::ROOT, token.offset),
            Attachment::Trailing => preceding(forest, Forest::ROOT, token.offset),
        };
        if target == Forest::ROOT {
            let diag = Diagnostic::OrphanComment {
                offset: token.offset,
                text: token.text.clone(),
            };
            warn!("{}", diag);
            report.diagnostics.push(diag);
        }
        forest.node_mut(target).comments.push(token.text.clone());
        report.bindings.push(Binding { token: i, target });
    }

    report.bindings.sort_by_key(|b| b.token);
    debug!(
        comments = report.bindings.len(),
        orphans = report.diagnostics.len(),
        "bound comments"
    );
    report
}

/// Remove every access specifier from the forest and turn it into a header.
fn detach_access_specifiers(forest: &mut Forest) -> Vec<Header> {
    let ids: Vec<NodeId> = (0..forest.len())
        .filter(|&id| forest.node(id).kind == Kind::AccessGroup && forest.node(id).parent.is_some())
        .collect();

    let mut headers = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(parent) = forest.node(id).parent else {
            continue;
        };
        forest.node_mut(parent).children.retain(|&c| c != id);
        // Anything nested in the specifier's extent goes back to the parent.
        let orphans = std::mem::take(&mut forest.node_mut(id).children);
        for &child in &orphans {
            forest.node_mut(child).parent = Some(parent);
        }
        forest.node_mut(parent).children.extend(orphans);
        forest.sort_children(parent);

        let node = forest.node_mut(id);
        node.parent = None;
        let name = if node.access != Access::None {
            node.access.as_str().to_string()
        } else {
            node.name.trim().trim_end_matches(':').to_string()
        };
        headers.push(Header {
            name,
            offset: node.extent.start,
            doc: std::mem::take(&mut node.comments),
            token: None,
        });
    }
    headers
}

/// Create a group at `offset` and move the following siblings into it.
///
/// Members run from the first sibling at or after `offset` up to the next
/// group in the same scope, or the end of the scope.
pub fn inject_group(forest: &mut Forest, name: &str, offset: usize) -> NodeId {
    let scope = innermost_scope(forest, Forest::ROOT, offset);
    let siblings = forest.children(scope).to_vec();

    let first = siblings
        .iter()
        .position(|&c| forest.node(c).extent.start >= offset)
        .unwrap_or(siblings.len());
    let last = siblings[first..]
        .iter()
        .position(|&c| forest.node(c).kind == Kind::Group)
        .map_or(siblings.len(), |p| first + p);
    let members = siblings[first..last].to_vec();

    let end = members
        .iter()
        .map(|&m| forest.node(m).extent.end)
        .max()
        .unwrap_or(offset)
        .max(offset);
    let mut node = Node::new(Kind::Group, name, Extent::new(forest.file(), offset, end));
    node.parent = Some(scope);
    node.children = members.clone();
    let group = forest.alloc(node);
    for &member in &members {
        forest.node_mut(member).parent = Some(group);
    }

    let mut children = siblings[..first].to_vec();
    children.push(group);
    children.extend_from_slice(&siblings[last..]);
    forest.node_mut(scope).children = children;

    debug!(group = name, members = members.len(), "injected group");
    group
}

/// Deepest node whose extent strictly contains `offset`.
fn innermost_scope(forest: &Forest, scope: NodeId, offset: usize) -> NodeId {
    forest
        .children(scope)
        .iter()
        .filter(|&&c| !forest.is_attached(c))
        .find(|&&c| forest.node(c).extent.strictly_contains(offset))
        .map_or(scope, |&c| innermost_scope(forest, c, offset))
}

/// Target for a leading comment: the first declaration starting after it,
/// descending into any declaration the comment sits inside.
fn following(forest: &Forest, scope: NodeId, offset: usize) -> NodeId {
    for &child in forest.children(scope) {
        if forest.is_attached(child) {
            continue;
        }
        let extent = forest.node(child).extent;
        if offset < extent.start {
            return child;
        }
        if offset < extent.end {
            return following(forest, child, offset);
        }
    }
    scope
}

/// Target for a trailing comment: the last declaration ending before it.
/// Groups are looked through, so the comment lands on their last member.
fn preceding(forest: &Forest, scope: NodeId, offset: usize) -> NodeId {
    for &child in forest.children(scope).iter().rev() {
        if forest.is_attached(child) {
            continue;
        }
        let node = forest.node(child);
        if offset >= node.extent.end {
            if node.kind == Kind::Group && !node.children.is_empty() {
                return preceding(forest, child, offset);
            }
            return child;
        }
        if offset > node.extent.start {
            return preceding(forest, child, offset);
        }
    }
    scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeclRecord, PassInput};
    use crate::tree::builder;

    fn record(kind: &str, name: &str, start: usize, end: usize) -> DeclRecord {
        DeclRecord {
            kind: kind.to_string(),
            name: name.to_string(),
            start,
            end,
            file: None,
            comment: None,
            access: None,
            signature: None,
        }
    }

    fn forest(records: Vec<DeclRecord>) -> Forest {
        let pass = PassInput {
            file: "test.h".to_string(),
            declarations: records,
            ..Default::default()
        };
        builder::build(&pass).unwrap().0
    }

    fn find(forest: &Forest, name: &str) -> NodeId {
        (0..forest.len())
            .find(|&id| forest.node(id).name == name)
            .unwrap()
    }

    fn leading(text: &str, offset: usize) -> CommentToken {
        CommentToken::new(text, offset, Attachment::Leading)
    }

    fn trailing(text: &str, offset: usize) -> CommentToken {
        CommentToken::new(text, offset, Attachment::Trailing)
    }

    fn group(text: &str, offset: usize) -> CommentToken {
        CommentToken::new(text, offset, Attachment::GroupStart)
    }

    fn class_forest() -> Forest {
        forest(vec![
            record("class", "C", 0, 100),
            record("method", "m", 10, 40),
            record("field", "x", 50, 60),
        ])
    }

    #[test]
    fn leading_comment_binds_to_next_member() {
        let mut f = class_forest();
        let report = bind(&mut f, &[leading("Does m.", 8)], false);
        let m = find(&f, "m");
        assert_eq!(f.node(m).comments, vec!["Does m."]);
        assert_eq!(report.bindings, vec![Binding { token: 0, target: m }]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn leading_comment_before_class_binds_to_class() {
        let mut f = forest(vec![
            record("class", "C", 10, 100),
            record("method", "m", 20, 40),
        ]);
        bind(&mut f, &[leading("A class.", 2)], false);
        assert_eq!(f.node(find(&f, "C")).comments, vec!["A class."]);
    }

    #[test]
    fn trailing_comment_binds_to_previous_member() {
        let mut f = class_forest();
        bind(&mut f, &[trailing("The x.", 61), trailing("The m.", 41)], false);
        assert_eq!(f.node(find(&f, "x")).comments, vec!["The x."]);
        assert_eq!(f.node(find(&f, "m")).comments, vec!["The m."]);
    }

    #[test]
    fn comment_after_last_member_falls_back_to_scope() {
        let mut f = class_forest();
        let report = bind(&mut f, &[leading("Trailing note.", 90)], false);
        assert_eq!(f.node(find(&f, "C")).comments, vec!["Trailing note."]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn orphan_comment_goes_to_root() {
        let mut f = class_forest();
        let report = bind(&mut f, &[leading("End of file.", 500), trailing("Start.", 0)], false);
        assert_eq!(f.node(Forest::ROOT).comments, vec!["End of file.", "Start."]);
        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(report.bindings.len(), 2);
    }

    #[test]
    fn contiguous_comments_concatenate_in_order() {
        let mut f = class_forest();
        bind(&mut f, &[leading("One.", 4), leading("Two.", 6)], false);
        assert_eq!(f.node(find(&f, "m")).comments, vec!["One.", "Two."]);
    }

    #[test]
    fn groups_collect_following_members() {
        let mut f = forest(vec![
            record("class", "C", 0, 100),
            record("method", "a", 25, 30),
            record("method", "b", 35, 40),
            record("method", "c", 50, 60),
        ]);
        let tokens = [group("Helpers", 20), group("Advanced", 45)];
        let report = bind(&mut f, &tokens, false);

        let class = find(&f, "C");
        let groups: Vec<_> = f.children(class).iter().map(|&g| f.node(g).name.clone()).collect();
        assert_eq!(groups, vec!["Helpers", "Advanced"]);

        let helpers = find(&f, "Helpers");
        let advanced = find(&f, "Advanced");
        assert_eq!(f.children(helpers).len(), 2);
        assert_eq!(f.children(advanced).len(), 1);
        assert_eq!(f.qualified_path(find(&f, "a")), vec!["C", "a"]);
        assert_eq!(report.bindings.len(), 2);
    }

    #[test]
    fn empty_trailing_group_is_kept() {
        let mut f = forest(vec![
            record("class", "C", 0, 100),
            record("method", "a", 25, 30),
            record("method", "b", 35, 40),
        ]);
        bind(&mut f, &[group("Helpers", 20), group("Advanced", 45)], false);
        let class = find(&f, "C");
        assert_eq!(f.children(class).len(), 2);
        assert_eq!(f.children(find(&f, "Helpers")).len(), 2);
        assert!(f.children(find(&f, "Advanced")).is_empty());
    }

    #[test]
    fn group_documentation_and_member_comments() {
        let mut f = forest(vec![
            record("class", "C", 0, 100),
            record("method", "a", 25, 30),
        ]);
        let tokens = [
            group("Helpers\nSmall utilities.", 10),
            leading("Does a.", 22),
            trailing("Really.", 31),
        ];
        bind(&mut f, &tokens, false);
        assert_eq!(f.node(find(&f, "Helpers")).comments, vec!["Small utilities."]);
        assert_eq!(f.node(find(&f, "a")).comments, vec!["Does a.", "Really."]);
    }

    #[test]
    fn members_before_first_group_stay_in_scope() {
        let mut f = forest(vec![
            record("class", "C", 0, 100),
            record("method", "early", 5, 10),
            record("method", "late", 30, 40),
        ]);
        bind(&mut f, &[group("Later", 20)], false);
        let class = find(&f, "C");
        let names: Vec<_> = f.children(class).iter().map(|&c| f.node(c).name.clone()).collect();
        assert_eq!(names, vec!["early", "Later"]);
    }

    #[test]
    fn access_specifiers_become_groups() {
        let mut access = record("access", "public:", 5, 12);
        access.access = Some(Access::Public);
        let mut private = record("access", "private:", 40, 48);
        private.access = Some(Access::Private);
        let mut f = forest(vec![
            record("class", "C", 0, 100),
            access,
            record("method", "m", 20, 30),
            private,
            record("field", "x", 50, 60),
        ]);
        bind(&mut f, &[], true);
        let class = find(&f, "C");
        let names: Vec<_> = f.children(class).iter().map(|&c| f.node(c).name.clone()).collect();
        assert_eq!(names, vec!["public", "private"]);
        assert!((0..f.len()).all(|id| f.node(id).kind != Kind::AccessGroup || f.node(id).parent.is_none()));
    }

    #[test]
    fn trailing_comment_looks_through_group_to_last_member() {
        let mut f = forest(vec![
            record("class", "C", 0, 100),
            record("method", "a", 25, 30),
            record("method", "b", 35, 40),
        ]);
        bind(&mut f, &[group("Helpers", 20), trailing("The b.", 42)], false);
        assert_eq!(f.node(find(&f, "b")).comments, vec!["The b."]);
        assert!(f.node(find(&f, "Helpers")).comments.is_empty());
    }

    #[test]
    fn leading_comment_inside_group_binds_to_next_member() {
        let mut f = forest(vec![
            record("class", "C", 0, 100),
            record("method", "a", 25, 30),
            record("method", "b", 35, 40),
        ]);
        let report = bind(&mut f, &[group("Helpers", 20), leading("Does b.", 32)], false);
        assert_eq!(f.node(find(&f, "b")).comments, vec!["Does b."]);
        assert!(f.node(find(&f, "a")).comments.is_empty());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn template_parameter_spanning_its_class_does_not_capture_comments() {
        let mut f = forest(vec![
            record("class", "Box", 0, 80),
            record("method", "m", 10, 20),
            record("tparam", "T", 0, 80),
            record("method", "n", 30, 40),
        ]);
        let report = bind(&mut f, &[trailing("The m.", 21), leading("Does n.", 25)], false);
        assert_eq!(f.node(find(&f, "n")).comments, vec!["Does n."]);
        assert_eq!(f.node(find(&f, "m")).comments, vec!["The m."]);
        assert!(f.node(find(&f, "T")).comments.is_empty());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn group_inside_template_lands_in_the_class() {
        let mut f = forest(vec![
            record("class", "Box", 0, 80),
            record("tparam", "T", 0, 80),
            record("method", "m", 30, 40),
        ]);
        bind(&mut f, &[group("Access", 25)], false);
        let group = find(&f, "Access");
        assert_eq!(f.node(group).parent, Some(find(&f, "Box")));
        assert_eq!(f.children(group), &[find(&f, "m")]);
    }

    #[test]
    fn every_token_bound_once() {
        let mut f = class_forest();
        let tokens = [
            leading("a", 1),
            group("G", 5),
            leading("b", 8),
            trailing("c", 41),
            leading("d", 90),
            leading("e", 1000),
        ];
        let report = bind(&mut f, &tokens, false);
        assert_eq!(report.bindings.len(), tokens.len());
        let indices: Vec<_> = report.bindings.iter().map(|b| b.token).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
