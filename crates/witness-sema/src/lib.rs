//! Semantic analyzer for the Witness contract language.
//!
//! Witness programs declare primitive domain types, composite assets
//! (subject/action/object triples, optionally composed through a join
//! algebra), and boolean clauses over asset obligations and claims.
//! Directive statements (`global`, `litis`, `meet`, `domain`) trigger
//! satisfiability analysis over the accumulated clause set.
//!
//! The analyzer walks the program in three passes (type registration,
//! asset registration with join validation, statement analysis) and hands
//! lowered clause sets to the engines in `witness-sat`. Diagnostics are
//! collected, never thrown; a program with rejected definitions still
//! analyzes to the end.

pub mod analyzer;
pub mod diagnostics;
pub mod errors;
pub mod infer;
pub mod joins;
pub mod lower;
pub mod symbols;

pub use analyzer::{
    analyze_program, AnalysisReport, Analyzer, AnalyzerOptions, DirectiveKind, DirectiveVerdict,
    SolverMode,
};
pub use diagnostics::{Diagnostics, Verbosity};
pub use errors::SemaError;
pub use symbols::{Constraint, SymbolTable, TypeInfo, TypeKind};
