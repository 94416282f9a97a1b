//! Symbol table mapping names to their semantic type information.

use indexmap::IndexMap;

use witness_ast::{Expression, TypeKeyword};

/// Kind of a registered name. Extends the source-level type keywords with
/// the derived `Asset` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    Service,
    Action,
    Subject,
    Authority,
    Time,
    Asset,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Object => "object",
            TypeKind::Service => "service",
            TypeKind::Action => "action",
            TypeKind::Subject => "subject",
            TypeKind::Authority => "authority",
            TypeKind::Time => "time",
            TypeKind::Asset => "asset",
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TypeKeyword> for TypeKind {
    fn from(keyword: TypeKeyword) -> Self {
        match keyword {
            TypeKeyword::Object => TypeKind::Object,
            TypeKeyword::Service => TypeKind::Service,
            TypeKeyword::Action => TypeKind::Action,
            TypeKeyword::Subject => TypeKind::Subject,
            TypeKeyword::Authority => TypeKind::Authority,
            TypeKeyword::Time => TypeKind::Time,
        }
    }
}

/// Constraint tag attached to object and service types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Movable,
    NonMovable,
    Positive,
    Negative,
}

impl Constraint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Constraint::Movable => "movable",
            Constraint::NonMovable => "non_movable",
            Constraint::Positive => "positive",
            Constraint::Negative => "negative",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "movable" => Some(Constraint::Movable),
            "non_movable" => Some(Constraint::NonMovable),
            "positive" => Some(Constraint::Positive),
            "negative" => Some(Constraint::Negative),
            _ => None,
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic information for one registered name.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub constraint: Option<Constraint>,
    /// For actions: `[description, referenced_type]`.
    /// For assets: `[subject, action, object]`.
    pub components: Vec<String>,
}

impl TypeInfo {
    pub fn new(kind: TypeKind, constraint: Option<Constraint>) -> Self {
        Self {
            kind,
            constraint,
            components: Vec::new(),
        }
    }

    pub fn with_components(
        kind: TypeKind,
        constraint: Option<Constraint>,
        components: Vec<String>,
    ) -> Self {
        Self {
            kind,
            constraint,
            components,
        }
    }
}

/// Name → TypeInfo mapping; last registration wins, iteration order is
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: IndexMap<String, TypeInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, info: TypeInfo) {
        self.entries.insert(name.into(), info);
    }

    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeInfo)> {
        self.entries.iter().map(|(name, info)| (name.as_str(), info))
    }

    /// True when `name` is registered with one of the given kinds.
    pub fn is_kind(&self, name: &str, kinds: &[TypeKind]) -> bool {
        self.get(name)
            .map(|info| kinds.contains(&info.kind))
            .unwrap_or(false)
    }

    /// Resolve the effective `{kind, constraint}` of a name for join-leg
    /// checking. A non-asset name answers for itself; an asset resolves
    /// through its action to the action's referenced type.
    pub fn constraint_profile(&self, name: &str) -> Option<(TypeKind, Option<Constraint>)> {
        let info = self.get(name)?;
        if info.kind != TypeKind::Asset {
            return Some((info.kind, info.constraint));
        }

        let action_name = info.components.get(1)?;
        let action = self.get(action_name)?;
        if action.kind != TypeKind::Action {
            return None;
        }
        let referenced = action.components.get(1)?;
        let referenced = self.get(referenced)?;
        Some((referenced.kind, referenced.constraint))
    }
}

/// Extract the constraint tag from a type definition's property list.
pub fn constraint_from_properties(properties: &[Expression]) -> Option<Constraint> {
    properties.iter().find_map(|expr| match expr {
        Expression::Identifier(name) | Expression::StringLiteral(name) => {
            Constraint::from_name(name)
        }
        _ => None,
    })
}
