//! Structured semantic-analysis errors.
//!
//! Errors are collected into the diagnostics buffer rather than thrown;
//! analysis always runs to the end of the program.

use miette::Diagnostic;
use thiserror::Error;

use witness_sat::EngineError;

/// Which side of a join operation a constraint failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum SemaError {
    #[error("asset '{name}' must have exactly 3 components (subject/authority, service/action/time, subject/authority)")]
    #[diagnostic(code(witness::sema::asset_arity))]
    AssetArity { name: String },

    #[error("component '{component}' of asset '{asset}' must be a defined {expected}")]
    #[diagnostic(code(witness::sema::component_kind))]
    ComponentKind {
        asset: String,
        component: String,
        expected: &'static str,
    },

    #[error("asset '{name}' must be defined by three components or a single join/meet call")]
    #[diagnostic(code(witness::sema::asset_value))]
    AssetValue { name: String },

    #[error("join operation '{op}' requires exactly 2 arguments, got {got}")]
    #[diagnostic(code(witness::sema::join_arity))]
    JoinArity { op: String, got: usize },

    #[error("{op} operation requires two resolvable 3-component assets ({side} argument does not resolve)")]
    #[diagnostic(code(witness::sema::join_operand))]
    JoinOperand { op: String, side: Side },

    #[error("{op} operation requires reciprocal pattern: (s1,A1,s2) and (s2,A2,s1); got ({left}) and ({right})")]
    #[diagnostic(code(witness::sema::join_reciprocity))]
    Reciprocity {
        op: String,
        left: String,
        right: String,
    },

    #[error("{op} operation requires the {side} asset '{asset}' to resolve to {expected}")]
    #[diagnostic(
        code(witness::sema::join_constraint),
        help("the asset's action must reference a type with the expected kind and constraint")
    )]
    JoinConstraint {
        op: String,
        side: Side,
        asset: String,
        expected: String,
    },

    #[error("{op}() in clause '{clause}' requires exactly 1 argument, got {got}")]
    #[diagnostic(code(witness::sema::logical_arity))]
    LogicalArity {
        op: String,
        clause: String,
        got: usize,
    },

    #[error("{directive}() requires {expected}, got {got}")]
    #[diagnostic(code(witness::sema::directive_arity))]
    DirectiveArity {
        directive: String,
        expected: &'static str,
        got: usize,
    },

    #[error("{directive}() requires asset identifier arguments")]
    #[diagnostic(code(witness::sema::directive_argument))]
    DirectiveArgument { directive: String },

    #[error("meet() requires '{name}' to be a defined asset with 3 components")]
    #[diagnostic(code(witness::sema::meet_operand))]
    MeetOperand { name: String },

    #[error("unknown solver mode '{mode}'")]
    #[diagnostic(code(witness::sema::solver_mode))]
    UnknownSolverMode { mode: String },

    #[error(transparent)]
    #[diagnostic(code(witness::sema::engine))]
    Engine(#[from] EngineError),
}
