//! Satisfiability engines for Witness clause sets.
//!
//! This crate is the solver seam below the semantic analyzer: it owns the
//! stable asset-to-variable numbering, the lowered clause records, boolean
//! evaluation of clause expressions under an assignment, and two engines.
//! The exhaustive engine enumerates models in-process; the external engine
//! ships per-clause satisfying sets to an external solver binary. A
//! conflict analyzer renders minimal-conflict reports on UNSAT.

pub mod clause;
pub mod conflict;
pub mod engine;
pub mod eval;
pub mod external;

pub use clause::{AssetIdTable, ClauseRecord, BINARY_OP_LABEL};
pub use conflict::ConflictFindings;
pub use engine::{
    AssetConstruction, EngineError, ExhaustiveEngine, SatEngine, SatOutcome, SolveJob,
};
pub use external::{purge_artifacts, ExternalEngine};
