//! Flatten the documentation tree into relational rows for persistence.

use crate::error::display_path;
use crate::model::{Access, Entity, Kind};
use serde::Serialize;

/// One node of the tree, keyed by its qualified path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
    pub kind: Kind,
    pub name: String,
    pub access: Access,
    pub link: String,
    /// Whether the node gets a page of its own.
    pub page: bool,
    pub comments: Vec<String>,
}

/// Link for `entity` given its parent's link.
///
/// The root is `/index`. Pages nest with `/` (top-level pages live under
/// `/global`); everything else is a `#` fragment of the page it sits on.
pub fn link(parent: &str, entity: &Entity) -> String {
    if entity.kind == Kind::Global {
        return "/index".to_string();
    }
    let page = parent.split('#').next().unwrap_or_default();
    if entity.kind.is_page() {
        let page = if page == "/index" { "/global" } else { page };
        format!("{}/{}", page, entity.name)
    } else {
        format!("{}#{}", page, entity.name)
    }
}

/// Rows in depth-first pre-order, root first.
pub fn flatten(tree: &Entity) -> Vec<Row> {
    let mut rows = Vec::with_capacity(tree.count());
    visit(tree, None, "", &mut rows);
    rows
}

fn visit(entity: &Entity, parent: Option<&str>, parent_link: &str, rows: &mut Vec<Row>) {
    let path = display_path(&entity.path);
    let link = link(parent_link, entity);
    rows.push(Row {
        path: path.clone(),
        parent_path: parent.map(str::to_string),
        kind: entity.kind,
        name: entity.name.clone(),
        access: entity.access,
        link: link.clone(),
        page: entity.kind.is_page(),
        comments: entity.comments.clone(),
    });
    for child in &entity.children {
        visit(child, Some(&path), &link, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: Kind, name: &str, path: &[&str], children: Vec<Entity>) -> Entity {
        let mut e = Entity::new(kind, name);
        e.path = path.iter().map(|s| s.to_string()).collect();
        e.children = children;
        e
    }

    fn sample() -> Entity {
        let method = node(Kind::Method, "run", &["ns", "C", "run"], vec![]);
        let methods = node(Kind::Bucket, "Methods", &["ns", "C", "Methods"], vec![method]);
        let class = node(Kind::Class, "C", &["ns", "C"], vec![methods]);
        let types = node(Kind::Bucket, "Types", &["ns", "Types"], vec![class]);
        let ns = node(Kind::Namespace, "ns", &["ns"], vec![types]);
        let f = node(Kind::Function, "f", &["f"], vec![]);
        let namespaces = node(Kind::Bucket, "Namespaces", &["Namespaces"], vec![ns]);
        let functions = node(Kind::Bucket, "Functions", &["Functions"], vec![f]);
        let mut root = Entity::global();
        root.children = vec![namespaces, functions];
        root
    }

    #[test]
    fn links_follow_pages() {
        let rows = flatten(&sample());
        let links: Vec<(&str, &str)> = rows.iter().map(|r| (r.path.as_str(), r.link.as_str())).collect();
        assert_eq!(
            links,
            vec![
                ("::", "/index"),
                ("Namespaces", "/index#Namespaces"),
                ("ns", "/global/ns"),
                ("ns::Types", "/global/ns#Types"),
                ("ns::C", "/global/ns/C"),
                ("ns::C::Methods", "/global/ns/C#Methods"),
                ("ns::C::run", "/global/ns/C#run"),
                ("Functions", "/index#Functions"),
                ("f", "/index#f"),
            ]
        );
    }

    #[test]
    fn rows_point_at_parents() {
        let rows = flatten(&sample());
        assert_eq!(rows[0].parent_path, None);
        let run = rows.iter().find(|r| r.name == "run").unwrap();
        assert_eq!(run.parent_path.as_deref(), Some("ns::C::Methods"));
        assert!(!run.page);
        assert!(rows.iter().find(|r| r.name == "C").unwrap().page);
        assert_eq!(rows.len(), sample().count());
    }
}
