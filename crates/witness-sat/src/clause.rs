//! Variable numbering and lowered clause records.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use witness_ast::Expression;

/// Label carried by clauses that have no literal-level structure.
pub const BINARY_OP_LABEL: &str = "binary_op";

/// Monotone mapping from asset names to solver variable ids.
///
/// Ids start at 1 and are assigned in first-reference order; once assigned,
/// a name keeps its id for the lifetime of the table. Iteration order is
/// assignment order.
#[derive(Debug, Clone, Default)]
pub struct AssetIdTable {
    ids: IndexMap<String, i32>,
    next: i32,
}

impl AssetIdTable {
    pub fn new() -> Self {
        Self {
            ids: IndexMap::new(),
            next: 1,
        }
    }

    /// Look up the id for `name`, assigning the next free id on first use.
    pub fn assign(&mut self, name: &str) -> i32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.next;
        self.next += 1;
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: i32) -> Option<&str> {
        self.ids
            .iter()
            .find(|(_, &assigned)| assigned == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.ids.iter().map(|(name, &id)| (name.as_str(), id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A lowered clause awaiting satisfiability checking.
///
/// Simple obligation/claim/negation patterns carry their literal directly;
/// compound clauses carry only the borrowed expression and are evaluated
/// against the AST at solve time.
#[derive(Debug, Clone)]
pub struct ClauseRecord<'p> {
    pub name: String,
    pub positive_literals: BTreeSet<i32>,
    pub negative_literals: BTreeSet<i32>,
    /// Human-readable form, e.g. `oblig(k)` or `binary_op` for compounds.
    pub label: String,
    pub expr: &'p Expression,
}

impl<'p> ClauseRecord<'p> {
    /// The variable ids referenced by this clause's expression.
    ///
    /// Identifiers without an id are skipped; lowering assigns ids for every
    /// identifier it sees, so a miss here means the name never went through
    /// lowering and evaluates to false anyway.
    pub fn variables(&self, ids: &AssetIdTable) -> BTreeSet<i32> {
        let mut vars = BTreeSet::new();
        self.expr.for_each_identifier(&mut |name| {
            if let Some(id) = ids.get(name) {
                vars.insert(id);
            }
        });
        vars
    }
}
