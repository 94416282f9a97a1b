//! Boolean evaluation of clause expressions under an assignment.

use std::collections::BTreeMap;

use witness_ast::{BinaryOp, Expression, UnaryOp};

use crate::clause::AssetIdTable;

/// A (possibly partial) truth assignment over variable ids.
pub type Assignment = BTreeMap<i32, bool>;

/// Evaluate `expr` under `assignment`.
///
/// Identifiers resolve through the id table and default to false when the
/// name or its variable is absent. `oblig` and `claim` are transparent
/// wrappers, `not` negates, and anything unrecognized evaluates to false.
pub fn evaluate(expr: &Expression, ids: &AssetIdTable, assignment: &Assignment) -> bool {
    match expr {
        Expression::Identifier(name) => ids
            .get(name)
            .and_then(|id| assignment.get(&id).copied())
            .unwrap_or(false),
        Expression::StringLiteral(_) => false,
        Expression::Binary { op, left, right } => {
            let l = evaluate(left, ids, assignment);
            let r = evaluate(right, ids, assignment);
            match op {
                BinaryOp::And => l && r,
                BinaryOp::Or => l || r,
                BinaryOp::Xor => l != r,
                BinaryOp::Implies => !l || r,
                BinaryOp::Equiv => l == r,
            }
        }
        Expression::Unary {
            op: UnaryOp::Not,
            operand,
        } => !evaluate(operand, ids, assignment),
        Expression::Call(call) => match call.name.as_str() {
            "oblig" | "claim" => match call.args.as_slice() {
                [arg] => evaluate(arg, ids, assignment),
                _ => false,
            },
            "not" => match call.args.as_slice() {
                [arg] => !evaluate(arg, ids, assignment),
                _ => false,
            },
            _ => false,
        },
    }
}
