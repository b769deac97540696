//! Data model for declaration trees: format-agnostic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a node in the documentation tree.
///
/// Declaration kinds come from the upstream analyzer; `Global`, `Group`,
/// `Bucket` and `OverloadSet` are synthesized while building the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Global,
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
    EnumConstant,
    Function,
    Method,
    Constructor,
    Destructor,
    Field,
    Variable,
    Parameter,
    TemplateParam,
    TypeAlias,
    Friend,
    AccessGroup,
    Unknown,
    /// Explicit subsection named by a group comment.
    Group,
    /// Implicit category such as "Methods".
    Bucket,
    /// Placeholder holding same-path declarations with distinct signatures.
    OverloadSet,
}

impl Kind {
    /// Parse the analyzer's textual kind tag. Returns `None` for tags this
    /// crate does not know about; callers map those to [`Kind::Unknown`].
    pub fn parse(tag: &str) -> Option<Kind> {
        let kind = match tag.trim().to_ascii_lowercase().as_str() {
            "global" | "translation_unit" => Kind::Global,
            "namespace" => Kind::Namespace,
            "class" | "class_template" => Kind::Class,
            "struct" => Kind::Struct,
            "union" => Kind::Union,
            "enum" => Kind::Enum,
            "enum_constant" | "enumerator" => Kind::EnumConstant,
            "function" | "function_template" => Kind::Function,
            "method" => Kind::Method,
            "constructor" => Kind::Constructor,
            "destructor" => Kind::Destructor,
            "field" => Kind::Field,
            "variable" => Kind::Variable,
            "parameter" | "param" => Kind::Parameter,
            "template_param" | "tparam" => Kind::TemplateParam,
            "type_alias" | "typedef" | "using" => Kind::TypeAlias,
            "friend" => Kind::Friend,
            "access_group" | "access" => Kind::AccessGroup,
            "unknown" => Kind::Unknown,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Global => "global",
            Kind::Namespace => "namespace",
            Kind::Class => "class",
            Kind::Struct => "struct",
            Kind::Union => "union",
            Kind::Enum => "enum",
            Kind::EnumConstant => "enum_constant",
            Kind::Function => "function",
            Kind::Method => "method",
            Kind::Constructor => "constructor",
            Kind::Destructor => "destructor",
            Kind::Field => "field",
            Kind::Variable => "variable",
            Kind::Parameter => "parameter",
            Kind::TemplateParam => "template_param",
            Kind::TypeAlias => "type_alias",
            Kind::Friend => "friend",
            Kind::AccessGroup => "access_group",
            Kind::Unknown => "unknown",
            Kind::Group => "group",
            Kind::Bucket => "bucket",
            Kind::OverloadSet => "overload_set",
        }
    }

    /// Synthetic display containers. Their members keep the owning scope's path.
    pub fn is_container(self) -> bool {
        matches!(self, Kind::Group | Kind::Bucket | Kind::OverloadSet)
    }

    /// Kinds that get a page of their own downstream; everything else is an
    /// in-page fragment.
    pub fn is_page(self) -> bool {
        matches!(
            self,
            Kind::Global | Kind::Namespace | Kind::Class | Kind::Struct
        )
    }

    /// Record-like scopes whose members bucket into constructors, methods, ...
    pub fn is_record(self) -> bool {
        matches!(self, Kind::Class | Kind::Struct | Kind::Union)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member access level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
    #[default]
    None,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
            Access::None => "none",
        }
    }
}

/// Half-open source byte range `[start, end)` inside one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub file: u32,
    pub start: usize,
    pub end: usize,
}

/// How two extents relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Equal,
    /// `self` strictly contains the other extent.
    Contains,
    /// `self` lies inside the other extent.
    Within,
    Disjoint,
    /// Neither nested nor disjoint. Never valid between siblings.
    Overlap,
}

impl Extent {
    pub fn new(file: u32, start: usize, end: usize) -> Self {
        Self { file, start, end }
    }

    pub fn nesting(&self, other: &Extent) -> Nesting {
        if self.file != other.file {
            return Nesting::Disjoint;
        }
        if self.start == other.start && self.end == other.end {
            return Nesting::Equal;
        }
        if self.start <= other.start && other.end <= self.end {
            return Nesting::Contains;
        }
        if other.start <= self.start && self.end <= other.end {
            return Nesting::Within;
        }
        if self.end <= other.start || other.end <= self.start {
            return Nesting::Disjoint;
        }
        Nesting::Overlap
    }

    /// True when `offset` lies strictly between start and end.
    pub fn strictly_contains(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{}, {})", self.file, self.start, self.end)
    }
}

/// A node of the documentation tree. Children are exclusively owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub kind: Kind,
    pub name: String,
    /// Declaration ancestors from the root down to this node.
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    /// Opaque type signature, compared only for equality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub access: Access,
    pub comments: Vec<String>,
    pub children: Vec<Entity>,
}

impl Entity {
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            path: Vec::new(),
            extent: None,
            signature: None,
            access: Access::None,
            comments: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Empty root for one pass or for the merged master tree.
    pub fn global() -> Self {
        Self::new(Kind::Global, "")
    }

    /// Path that members of this node inherit. Containers are transparent.
    pub fn scope_path(&self, enclosing: &[String]) -> Vec<String> {
        match self.kind {
            Kind::Global => Vec::new(),
            k if k.is_container() => enclosing.to_vec(),
            _ => self.path.clone(),
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Entity::count).sum::<usize>()
    }

    /// Depth-first pre-order walk.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Entity)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    pub fn child(&self, name: &str) -> Option<&Entity> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Append comments not already present, preserving order.
    pub fn absorb_comments(&mut self, comments: impl IntoIterator<Item = String>) {
        for comment in comments {
            if !self.comments.contains(&comment) {
                self.comments.push(comment);
            }
        }
    }
}

/// Where a comment token attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    /// Documents the following declaration.
    Leading,
    /// Documents the preceding declaration.
    Trailing,
    /// Opens a named subsection.
    GroupStart,
}

/// A decoded comment ready for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentToken {
    /// For `GroupStart`, the first line is the group name and the rest is
    /// the group's own documentation.
    pub text: String,
    pub offset: usize,
    pub attachment: Attachment,
}

impl CommentToken {
    pub fn new(text: impl Into<String>, offset: usize, attachment: Attachment) -> Self {
        Self {
            text: text.into(),
            offset,
            attachment,
        }
    }

    /// Split a `GroupStart` text into its name and optional documentation.
    pub fn group_header(&self) -> (String, Option<String>) {
        let mut lines = self.text.lines();
        let name = lines.next().unwrap_or_default().trim().to_string();
        let doc = lines.collect::<Vec<_>>().join("\n");
        let doc = if doc.trim().is_empty() { None } else { Some(doc) };
        (name, doc)
    }
}

/// One declaration as reported by the upstream analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclRecord {
    pub kind: String,
    pub name: String,
    pub start: usize,
    pub end: usize,
    /// Defaults to the pass file id.
    #[serde(default)]
    pub file: Option<u32>,
    /// Comment text the analyzer already associated with this declaration.
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub access: Option<Access>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// A comment as it appears in source. `attachment` is set when the
/// analyzer already decoded the sigil.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawComment {
    pub text: String,
    pub offset: usize,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

/// Everything one analysis pass produces for one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassInput {
    /// Source file name. Filled from the input path when missing.
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub file_id: u32,
    #[serde(default)]
    pub declarations: Vec<DeclRecord>,
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_relations() {
        let class = Extent::new(0, 0, 100);
        assert_eq!(class.nesting(&Extent::new(0, 10, 40)), Nesting::Contains);
        assert_eq!(Extent::new(0, 10, 40).nesting(&class), Nesting::Within);
        assert_eq!(class.nesting(&class), Nesting::Equal);
        assert_eq!(
            Extent::new(0, 10, 40).nesting(&Extent::new(0, 40, 60)),
            Nesting::Disjoint
        );
        assert_eq!(
            Extent::new(0, 10, 50).nesting(&Extent::new(0, 30, 70)),
            Nesting::Overlap
        );
        assert_eq!(
            Extent::new(0, 10, 50).nesting(&Extent::new(1, 30, 70)),
            Nesting::Disjoint
        );
    }

    #[test]
    fn kind_aliases() {
        assert_eq!(Kind::parse("tparam"), Some(Kind::TemplateParam));
        assert_eq!(Kind::parse("Class"), Some(Kind::Class));
        assert_eq!(Kind::parse("typedef"), Some(Kind::TypeAlias));
        assert_eq!(Kind::parse("lambda"), None);
    }

    #[test]
    fn group_header_split() {
        let tok = CommentToken::new("Helpers\nSmall utilities.", 20, Attachment::GroupStart);
        let (name, doc) = tok.group_header();
        assert_eq!(name, "Helpers");
        assert_eq!(doc.as_deref(), Some("Small utilities."));

        let bare = CommentToken::new("Advanced", 45, Attachment::GroupStart);
        assert_eq!(bare.group_header(), ("Advanced".to_string(), None));
    }

    #[test]
    fn absorb_dedups() {
        let mut e = Entity::new(Kind::Function, "f");
        e.absorb_comments(vec!["a".to_string(), "b".to_string()]);
        e.absorb_comments(vec!["b".to_string(), "c".to_string()]);
        assert_eq!(e.comments, vec!["a", "b", "c"]);
    }
}
