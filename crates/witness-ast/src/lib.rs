pub mod ast;

pub use ast::{
    AssetDefinition, BinaryOp, ClauseDefinition, Expression, FunctionCall, Program, Statement,
    TypeDefinition, TypeKeyword, UnaryOp,
};
