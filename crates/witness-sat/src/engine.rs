//! Satisfiability engine interface and the in-process exhaustive engine.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clause::{AssetIdTable, ClauseRecord};
use crate::eval::{evaluate, Assignment};

/// Enumeration above this many variables is refused outright; past the
/// soft limit the engine only warns.
const HARD_VARIABLE_LIMIT: usize = 30;
const SOFT_VARIABLE_LIMIT: usize = 20;

/// Subject/action/object strings backing a solver variable, shipped to the
/// external solver for model queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetConstruction {
    pub subject: String,
    pub action: String,
    pub object: String,
}

impl AssetConstruction {
    pub fn unknown() -> Self {
        Self {
            subject: "unknown".into(),
            action: "unknown".into(),
            object: "unknown".into(),
        }
    }
}

/// One satisfiability request: the clause set plus the variable numbering
/// and per-variable construction metadata.
pub struct SolveJob<'a, 'p> {
    pub clauses: &'a [ClauseRecord<'p>],
    pub ids: &'a AssetIdTable,
    pub constructions: &'a BTreeMap<i32, AssetConstruction>,
}

/// Engine verdict plus the satisfying assignments that witness it.
///
/// Each assignment vector lists one signed literal per variable, ascending
/// by absolute id: `+id` means true, `-id` means false.
#[derive(Debug, Clone)]
pub struct SatOutcome {
    pub satisfiable: bool,
    pub assignments: Vec<Vec<i32>>,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error during solve: {0}")]
    Io(#[from] std::io::Error),
    #[error("external solver exited with code {code}")]
    SolverExit { code: i32 },
    #[error("external solver was terminated by a signal")]
    SolverKilled,
    #[error("could not read solver result file {path}: {reason}")]
    ResultFile { path: String, reason: String },
    #[error("exhaustive enumeration over {count} variables exceeds the in-process budget; use the external mode")]
    VariableBudget { count: usize },
}

/// A satisfiability engine over lowered clause sets.
pub trait SatEngine {
    fn solve(&mut self, job: &SolveJob<'_, '_>) -> Result<SatOutcome, EngineError>;
}

/// Enumerates all `2^|V|` assignments over the variables of the clause set
/// and keeps the ones satisfying every clause.
#[derive(Debug, Default)]
pub struct ExhaustiveEngine;

impl ExhaustiveEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SatEngine for ExhaustiveEngine {
    fn solve(&mut self, job: &SolveJob<'_, '_>) -> Result<SatOutcome, EngineError> {
        if job.clauses.is_empty() {
            return Ok(SatOutcome {
                satisfiable: true,
                assignments: vec![Vec::new()],
                detail: "empty clause set is trivially satisfiable".into(),
            });
        }

        let mut variables = std::collections::BTreeSet::new();
        for clause in job.clauses {
            variables.extend(clause.variables(job.ids));
        }
        let variables: Vec<i32> = variables.into_iter().collect();
        let n = variables.len();

        if n > HARD_VARIABLE_LIMIT {
            return Err(EngineError::VariableBudget { count: n });
        }
        if n > SOFT_VARIABLE_LIMIT {
            warn!(
                variables = n,
                clauses = job.clauses.len(),
                "exhaustive enumeration is large; consider the external solver mode"
            );
        }
        debug!(
            variables = n,
            clauses = job.clauses.len(),
            combinations = 1u64 << n,
            "enumerating truth table"
        );

        let mut satisfying = Vec::new();
        for mask in 0..(1u64 << n) {
            let mut assignment = Assignment::new();
            let mut literals = Vec::with_capacity(n);
            for (bit, &id) in variables.iter().enumerate() {
                let value = mask & (1 << bit) != 0;
                assignment.insert(id, value);
                literals.push(if value { id } else { -id });
            }

            let all_satisfied = job
                .clauses
                .iter()
                .all(|clause| evaluate(clause.expr, job.ids, &assignment));
            if all_satisfied {
                satisfying.push(literals);
            }
        }

        let satisfiable = !satisfying.is_empty();
        let detail = if satisfiable {
            format!("{} satisfying assignments found", satisfying.len())
        } else {
            "No satisfying assignments found - clauses are unsatisfiable".into()
        };
        Ok(SatOutcome {
            satisfiable,
            assignments: satisfying,
            detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use witness_ast::{BinaryOp, Expression as E};

    fn record<'p>(name: &str, expr: &'p E) -> ClauseRecord<'p> {
        ClauseRecord {
            name: name.into(),
            positive_literals: BTreeSet::new(),
            negative_literals: BTreeSet::new(),
            label: "binary_op".into(),
            expr,
        }
    }

    fn solve<'p>(clauses: &[ClauseRecord<'p>], ids: &AssetIdTable) -> SatOutcome {
        let constructions = BTreeMap::new();
        ExhaustiveEngine::new()
            .solve(&SolveJob {
                clauses,
                ids,
                constructions: &constructions,
            })
            .expect("exhaustive solve should not fail")
    }

    #[test]
    fn empty_clause_set_is_trivially_sat() {
        let ids = AssetIdTable::new();
        let outcome = solve(&[], &ids);
        assert!(outcome.satisfiable);
        assert_eq!(outcome.assignments, vec![Vec::<i32>::new()]);
    }

    #[test]
    fn single_obligation_has_one_model() {
        let mut ids = AssetIdTable::new();
        ids.assign("k");
        let expr = E::call("oblig", vec![E::ident("k")]);
        let outcome = solve(&[record("c1", &expr)], &ids);
        assert!(outcome.satisfiable);
        assert_eq!(outcome.assignments, vec![vec![1]]);
    }

    #[test]
    fn direct_contradiction_is_unsat() {
        let mut ids = AssetIdTable::new();
        ids.assign("k");
        let pos = E::call("oblig", vec![E::ident("k")]);
        let neg = E::call("not", vec![E::ident("k")]);
        let outcome = solve(&[record("c1", &pos), record("c2", &neg)], &ids);
        assert!(!outcome.satisfiable);
        assert!(outcome.assignments.is_empty());
        assert!(outcome.detail.contains("unsatisfiable"));
    }

    #[test]
    fn implication_admits_three_models() {
        let mut ids = AssetIdTable::new();
        ids.assign("p");
        ids.assign("q");
        let expr = E::binary(
            BinaryOp::Implies,
            E::call("oblig", vec![E::ident("p")]),
            E::call("oblig", vec![E::ident("q")]),
        );
        let outcome = solve(&[record("c1", &expr)], &ids);
        assert!(outcome.satisfiable);
        // p IMPLIES q excludes only (+1, -2)
        assert_eq!(outcome.assignments.len(), 3);
        assert!(outcome.assignments.contains(&vec![-1, -2]));
        assert!(outcome.assignments.contains(&vec![-1, 2]));
        assert!(outcome.assignments.contains(&vec![1, 2]));
        assert!(!outcome.assignments.contains(&vec![1, -2]));
    }

    #[test]
    fn variable_budget_is_enforced() {
        let mut ids = AssetIdTable::new();
        let names: Vec<String> = (0..31).map(|i| format!("a{i}")).collect();
        for name in &names {
            ids.assign(name);
        }
        let expr = names
            .iter()
            .map(|n| E::ident(n.clone()))
            .reduce(|acc, e| E::binary(BinaryOp::Or, acc, e))
            .unwrap();
        let clauses = [record("big", &expr)];
        let constructions = BTreeMap::new();
        let err = ExhaustiveEngine::new()
            .solve(&SolveJob {
                clauses: &clauses,
                ids: &ids,
                constructions: &constructions,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::VariableBudget { count: 31 }));
    }
}
