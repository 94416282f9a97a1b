//! Algebraic validation of asset-composition (join) operators.
//!
//! Universal joins compose any two assets; contextual joins additionally
//! require the reciprocal subject/object pattern and specific kind and
//! constraint pairs on each leg, resolved through the asset's action chain.

use witness_ast::Expression;

use crate::diagnostics::Diagnostics;
use crate::errors::{SemaError, Side};
use crate::symbols::{Constraint, SymbolTable, TypeKind};

/// The recognized join operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOp {
    Join,
    Evidence,
    Argument,
    Transfer,
    Sell,
    Compensation,
    Consideration,
    Forbearance,
    Encumber,
    Access,
    Lien,
}

impl JoinOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "join" => Some(JoinOp::Join),
            "evidence" => Some(JoinOp::Evidence),
            "argument" => Some(JoinOp::Argument),
            "transfer" => Some(JoinOp::Transfer),
            "sell" => Some(JoinOp::Sell),
            "compensation" => Some(JoinOp::Compensation),
            "consideration" => Some(JoinOp::Consideration),
            "forbearance" => Some(JoinOp::Forbearance),
            "encumber" => Some(JoinOp::Encumber),
            "access" => Some(JoinOp::Access),
            "lien" => Some(JoinOp::Lien),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JoinOp::Join => "join",
            JoinOp::Evidence => "evidence",
            JoinOp::Argument => "argument",
            JoinOp::Transfer => "transfer",
            JoinOp::Sell => "sell",
            JoinOp::Compensation => "compensation",
            JoinOp::Consideration => "consideration",
            JoinOp::Forbearance => "forbearance",
            JoinOp::Encumber => "encumber",
            JoinOp::Access => "access",
            JoinOp::Lien => "lien",
        }
    }

    /// Universal joins carry no reciprocity or type constraints.
    pub fn is_universal(&self) -> bool {
        matches!(self, JoinOp::Join | JoinOp::Evidence | JoinOp::Argument)
    }

    /// Leg expectations for contextual operators; `None` for universal ones.
    fn contextual_legs(&self) -> Option<(LegExpectation, LegExpectation)> {
        use LegExpectation::*;
        match self {
            JoinOp::Join | JoinOp::Evidence | JoinOp::Argument => None,
            JoinOp::Transfer => Some((MovableObject, MovableObject)),
            JoinOp::Sell => Some((AnyObject, PositiveService)),
            JoinOp::Compensation => Some((PositiveService, PositiveService)),
            JoinOp::Consideration => Some((PositiveService, NegativeService)),
            JoinOp::Forbearance => Some((NegativeService, NegativeService)),
            JoinOp::Encumber | JoinOp::Access => Some((NonMovableObject, PositiveService)),
            JoinOp::Lien => Some((NonMovableObject, NegativeService)),
        }
    }
}

impl std::fmt::Display for JoinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a contextual operator requires of one leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegExpectation {
    MovableObject,
    NonMovableObject,
    AnyObject,
    PositiveService,
    NegativeService,
}

impl LegExpectation {
    fn matches(&self, kind: TypeKind, constraint: Option<Constraint>) -> bool {
        match self {
            LegExpectation::MovableObject => {
                kind == TypeKind::Object && constraint == Some(Constraint::Movable)
            }
            LegExpectation::NonMovableObject => {
                kind == TypeKind::Object && constraint == Some(Constraint::NonMovable)
            }
            LegExpectation::AnyObject => kind == TypeKind::Object,
            LegExpectation::PositiveService => {
                kind == TypeKind::Service && constraint == Some(Constraint::Positive)
            }
            LegExpectation::NegativeService => {
                kind == TypeKind::Service && constraint == Some(Constraint::Negative)
            }
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            LegExpectation::MovableObject => "object/movable",
            LegExpectation::NonMovableObject => "object/non_movable",
            LegExpectation::AnyObject => "object (either constraint)",
            LegExpectation::PositiveService => "service/positive",
            LegExpectation::NegativeService => "service/negative",
        }
    }
}

/// Resolve the `[subject, action, object]` components of a join argument:
/// a named asset answers from the symbol table, and a nested join call
/// composes recursively.
pub fn asset_components(symbols: &SymbolTable, expr: &Expression) -> Option<Vec<String>> {
    match expr {
        Expression::Identifier(name) => {
            let info = symbols.get(name)?;
            if info.kind == TypeKind::Asset && info.components.len() >= 3 {
                Some(info.components.clone())
            } else {
                None
            }
        }
        Expression::Call(call) => {
            let op = JoinOp::from_name(&call.name)?;
            match call.args.as_slice() {
                [left, right] => {
                    let left = asset_components(symbols, left)?;
                    let right = asset_components(symbols, right)?;
                    Some(compose_components(op, &left, &right))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Deterministic component composition for an admitted join.
pub fn compose_components(op: JoinOp, left: &[String], right: &[String]) -> Vec<String> {
    let action = match op {
        JoinOp::Join => format!("{}_{}", left[1], right[1]),
        _ => format!("{}_{}_{}", op.name(), left[1], right[1]),
    };
    vec![left[0].clone(), action, left[2].clone()]
}

/// Validate a join call. Warnings (idempotence, associativity) land in the
/// diagnostics buffer; a hard precondition failure is returned as the one
/// structured error that rejects the definition.
pub fn validate_join(
    symbols: &SymbolTable,
    diagnostics: &mut Diagnostics,
    op: JoinOp,
    left: &Expression,
    right: &Expression,
) -> Result<(), SemaError> {
    // Idempotence holds for every operator: J(x, x) = x.
    if let (Some(l), Some(r)) = (left.as_identifier(), right.as_identifier()) {
        if l == r {
            diagnostics.warn(format!("Idempotent {op} operation: {op}({l}, {l}) = {l}"));
            return Ok(());
        }
    }

    // Nested same-operator arguments are admitted permissively.
    let nested = |expr: &Expression| {
        expr.as_call()
            .and_then(|call| JoinOp::from_name(&call.name))
            .is_some_and(|inner| inner == op)
    };
    if nested(left) || nested(right) {
        diagnostics.warn(format!(
            "Associative {op} operation: nested {op} argument admitted without leg validation"
        ));
        return Ok(());
    }

    let Some((left_expectation, right_expectation)) = op.contextual_legs() else {
        return Ok(());
    };

    let left_components = asset_components(symbols, left).ok_or(SemaError::JoinOperand {
        op: op.name().into(),
        side: Side::Left,
    })?;
    let right_components = asset_components(symbols, right).ok_or(SemaError::JoinOperand {
        op: op.name().into(),
        side: Side::Right,
    })?;

    // Reciprocal pattern: (s1, A1, s2) against (s2, A2, s1).
    if left_components[0] != right_components[2] || left_components[2] != right_components[0] {
        return Err(SemaError::Reciprocity {
            op: op.name().into(),
            left: left_components.join(", "),
            right: right_components.join(", "),
        });
    }

    check_leg(symbols, op, Side::Left, left, left_expectation)?;
    check_leg(symbols, op, Side::Right, right, right_expectation)?;
    Ok(())
}

fn check_leg(
    symbols: &SymbolTable,
    op: JoinOp,
    side: Side,
    expr: &Expression,
    expectation: LegExpectation,
) -> Result<(), SemaError> {
    let name = expr.as_identifier().ok_or(SemaError::JoinOperand {
        op: op.name().into(),
        side,
    })?;
    let constraint_error = || SemaError::JoinConstraint {
        op: op.name().into(),
        side,
        asset: name.to_string(),
        expected: expectation.describe().to_string(),
    };
    let (kind, constraint) = symbols
        .constraint_profile(name)
        .ok_or_else(constraint_error)?;
    if !expectation.matches(kind, constraint) {
        return Err(constraint_error());
    }
    Ok(())
}
