//! Bucket organizer: regroup a scope's members into display categories.
//!
//! Record scopes (class/struct/union) and namespace scopes (including the
//! global root) get implicit buckets in a fixed order. Explicit groups keep
//! their authored position; the loose members between them form runs that
//! are bucketed on their own, and same-named buckets from different runs
//! are coalesced.

use crate::model::{Entity, Kind};

/// Implicit member category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Namespaces,
    TemplateParameters,
    Constructors,
    Destructors,
    Methods,
    Fields,
    Types,
    Functions,
    Variables,
    Others,
}

/// Display order inside class, struct and union scopes.
pub const RECORD_BUCKETS: &[Bucket] = &[
    Bucket::TemplateParameters,
    Bucket::Constructors,
    Bucket::Destructors,
    Bucket::Methods,
    Bucket::Fields,
    Bucket::Types,
    Bucket::Others,
];

/// Display order inside namespaces and the global scope.
pub const NAMESPACE_BUCKETS: &[Bucket] = &[
    Bucket::Namespaces,
    Bucket::Types,
    Bucket::Functions,
    Bucket::Variables,
    Bucket::Others,
];

impl Bucket {
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Namespaces => "Namespaces",
            Bucket::TemplateParameters => "Template Parameters",
            Bucket::Constructors => "Constructors",
            Bucket::Destructors => "Destructors",
            Bucket::Methods => "Methods",
            Bucket::Fields => "Fields",
            Bucket::Types => "Types",
            Bucket::Functions => "Functions",
            Bucket::Variables => "Variables",
            Bucket::Others => "Others",
        }
    }

    pub fn from_label(label: &str) -> Option<Bucket> {
        RECORD_BUCKETS
            .iter()
            .chain(NAMESPACE_BUCKETS)
            .copied()
            .find(|b| b.label() == label)
    }
}

/// Bucket order for a scope kind, or `None` when its members stay as they are.
pub fn scheme(scope: Kind) -> Option<&'static [Bucket]> {
    match scope {
        Kind::Class | Kind::Struct | Kind::Union => Some(RECORD_BUCKETS),
        Kind::Global | Kind::Namespace => Some(NAMESPACE_BUCKETS),
        _ => None,
    }
}

/// Bucket for a member of a scope of kind `scope`.
pub fn classify(scope: Kind, member: Kind) -> Bucket {
    if scope.is_record() {
        match member {
            Kind::TemplateParam => Bucket::TemplateParameters,
            Kind::Constructor => Bucket::Constructors,
            Kind::Destructor => Bucket::Destructors,
            Kind::Method | Kind::Function => Bucket::Methods,
            Kind::Field | Kind::Variable => Bucket::Fields,
            Kind::Class | Kind::Struct | Kind::Union | Kind::Enum | Kind::TypeAlias => Bucket::Types,
            Kind::Global
            | Kind::Namespace
            | Kind::EnumConstant
            | Kind::Parameter
            | Kind::Friend
            | Kind::AccessGroup
            | Kind::Unknown
            | Kind::Group
            | Kind::Bucket
            | Kind::OverloadSet => Bucket::Others,
        }
    } else {
        match member {
            Kind::Namespace => Bucket::Namespaces,
            Kind::Class | Kind::Struct | Kind::Union | Kind::Enum | Kind::TypeAlias => Bucket::Types,
            Kind::Function | Kind::Method | Kind::Constructor | Kind::Destructor => Bucket::Functions,
            Kind::Variable | Kind::Field => Bucket::Variables,
            Kind::Global
            | Kind::EnumConstant
            | Kind::Parameter
            | Kind::TemplateParam
            | Kind::Friend
            | Kind::AccessGroup
            | Kind::Unknown
            | Kind::Group
            | Kind::Bucket
            | Kind::OverloadSet => Bucket::Others,
        }
    }
}

/// Organize `entity` and its whole subtree in place.
pub fn organize(entity: &mut Entity) {
    for child in &mut entity.children {
        organize(child);
    }

    let Some(order) = scheme(entity.kind) else {
        return;
    };

    let children = std::mem::take(&mut entity.children);
    let mut out: Vec<Entity> = Vec::with_capacity(children.len());
    let mut run: Vec<Entity> = Vec::new();

    for child in children {
        if child.kind == Kind::Group {
            flush_run(&mut out, &mut run, entity.kind, order, &entity.path);
            out.push(child);
        } else {
            run.push(child);
        }
    }
    flush_run(&mut out, &mut run, entity.kind, order, &entity.path);

    entity.children = out;
}

/// Bucket the pending run and append it to `out`, merging into buckets
/// already emitted by an earlier run.
fn flush_run(
    out: &mut Vec<Entity>,
    run: &mut Vec<Entity>,
    scope: Kind,
    order: &[Bucket],
    scope_path: &[String],
) {
    if run.is_empty() {
        return;
    }

    let mut slots: Vec<Vec<Entity>> = order.iter().map(|_| Vec::new()).collect();
    for member in run.drain(..) {
        let bucket = classify(scope, member.kind);
        // Every classification result is part of the scheme for its scope.
        let slot = order.iter().position(|&b| b == bucket).unwrap_or(order.len() - 1);
        slots[slot].push(member);
    }

    for (bucket, members) in order.iter().zip(slots) {
        if members.is_empty() {
            continue;
        }
        let label = bucket.label();
        if let Some(existing) = out
            .iter_mut()
            .find(|e| e.kind == Kind::Bucket && e.name == label)
        {
            existing.children.extend(members);
            continue;
        }
        let mut node = Entity::new(Kind::Bucket, label);
        node.path = scope_path.to_vec();
        node.path.push(label.to_string());
        node.children = members;
        out.push(node);
    }
}
