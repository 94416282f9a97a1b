//! Out-of-process satisfiability via an external solver binary.
//!
//! The engine enumerates each clause's satisfying partial assignments,
//! writes them as a JSON "bag of sets" job, invokes the solver as
//! `<solver> <input.json> <output.bin>`, and reads the combined satisfying
//! assignments back from the binary result file. Each invocation gets
//! unique filenames from a process-wide monotone counter so sequential
//! directive runs never interfere.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, info};

use crate::clause::ClauseRecord;
use crate::engine::{AssetConstruction, EngineError, SatEngine, SatOutcome, SolveJob};
use crate::eval::{evaluate, Assignment};

/// Result records larger than this terminate the stream defensively.
const RESULT_RECORD_MAX: i32 = 1000;

/// Per-clause enumeration refuses to run past this many variables.
const PER_CLAUSE_VARIABLE_LIMIT: usize = 30;

/// Solver command used when none is configured.
pub const DEFAULT_SOLVER_COMMAND: &str = "./tree_fold_cuda";

/// Process-wide invocation counter; monotone across analyses sharing the
/// process so re-used directives never collide on filenames.
static INVOCATION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_invocation() -> u64 {
    INVOCATION_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

#[derive(Serialize)]
struct SolverExport {
    assets: Vec<i32>,
    asset_names: BTreeMap<String, String>,
    asset_construction: BTreeMap<String, AssetConstruction>,
    clauses: Vec<ClauseExport>,
}

#[derive(Serialize)]
struct ClauseExport {
    name: String,
    asset_ids: Vec<i32>,
    assignments: Vec<Vec<i32>>,
}

/// Engine that delegates model enumeration to an external solver process.
pub struct ExternalEngine {
    solver_command: PathBuf,
    work_dir: PathBuf,
}

impl ExternalEngine {
    pub fn new() -> Self {
        Self::with_command(DEFAULT_SOLVER_COMMAND)
    }

    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self {
            solver_command: command.into(),
            work_dir: PathBuf::from("."),
        }
    }

    pub fn with_command_in(command: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            solver_command: command.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Enumerate the satisfying partial assignments of a single clause over
    /// its own variables, ascending by id within each vector.
    fn clause_satisfying_sets(
        clause: &ClauseRecord<'_>,
        job: &SolveJob<'_, '_>,
    ) -> Result<(Vec<i32>, Vec<Vec<i32>>), EngineError> {
        let variables: Vec<i32> = clause.variables(job.ids).into_iter().collect();
        if variables.len() > PER_CLAUSE_VARIABLE_LIMIT {
            return Err(EngineError::VariableBudget {
                count: variables.len(),
            });
        }
        let mut satisfying = Vec::new();
        for mask in 0..(1u64 << variables.len()) {
            let mut assignment = Assignment::new();
            let mut literals = Vec::with_capacity(variables.len());
            for (bit, &id) in variables.iter().enumerate() {
                let value = mask & (1 << bit) != 0;
                assignment.insert(id, value);
                literals.push(if value { id } else { -id });
            }
            if evaluate(clause.expr, job.ids, &assignment) {
                satisfying.push(literals);
            }
        }
        Ok((variables, satisfying))
    }

    fn build_export(job: &SolveJob<'_, '_>) -> Result<SolverExport, EngineError> {
        let mut all_ids = BTreeSet::new();
        let mut clauses = Vec::with_capacity(job.clauses.len());
        for clause in job.clauses {
            let (asset_ids, assignments) = Self::clause_satisfying_sets(clause, job)?;
            all_ids.extend(asset_ids.iter().copied());
            clauses.push(ClauseExport {
                name: clause.name.clone(),
                asset_ids,
                assignments,
            });
        }

        let mut asset_names = BTreeMap::new();
        let mut asset_construction = BTreeMap::new();
        for &id in &all_ids {
            let name = job
                .ids
                .name_of(id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("unknown_asset_{id}"));
            asset_names.insert(id.to_string(), name);
            let construction = job
                .constructions
                .get(&id)
                .cloned()
                .unwrap_or_else(AssetConstruction::unknown);
            asset_construction.insert(id.to_string(), construction);
        }

        Ok(SolverExport {
            assets: all_ids.into_iter().collect(),
            asset_names,
            asset_construction,
            clauses,
        })
    }
}

impl Default for ExternalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SatEngine for ExternalEngine {
    fn solve(&mut self, job: &SolveJob<'_, '_>) -> Result<SatOutcome, EngineError> {
        if job.clauses.is_empty() {
            return Ok(SatOutcome {
                satisfiable: true,
                assignments: vec![Vec::new()],
                detail: "empty clause set is trivially satisfiable".into(),
            });
        }

        let invocation = next_invocation();
        let json_path = self.work_dir.join(format!("witness_export_{invocation}.json"));
        let bin_path = self.work_dir.join(format!("zdd_{invocation}.bin"));

        let export = Self::build_export(job)?;
        {
            let file = File::create(&json_path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &export)
                .map_err(std::io::Error::from)?;
        }
        debug!(path = %json_path.display(), clauses = export.clauses.len(), "exported solver job");

        let status = Command::new(&self.solver_command)
            .arg(&json_path)
            .arg(&bin_path)
            .status()?;
        if !status.success() {
            return match status.code() {
                Some(code) => Err(EngineError::SolverExit { code }),
                None => Err(EngineError::SolverKilled),
            };
        }

        let assignments = read_result_file(&bin_path)?;
        info!(
            invocation,
            assignments = assignments.len(),
            "external solver completed"
        );

        let satisfiable = !assignments.is_empty();
        let detail = if satisfiable {
            format!(
                "External solver mode: {} satisfying assignments found",
                assignments.len()
            )
        } else {
            "External solver mode: No satisfying assignments found".into()
        };
        Ok(SatOutcome {
            satisfiable,
            assignments,
            detail,
        })
    }
}

/// Read a solver result file: a concatenation of `i32` little-endian `size`
/// prefixes, each followed by `size` signed `i32` literals. Reading stops at
/// EOF or at a size outside `(0, 1000]`.
pub fn read_result_file(path: &Path) -> Result<Vec<Vec<i32>>, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::ResultFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut reader = BufReader::new(file);
    let mut assignments = Vec::new();

    loop {
        let mut size_buf = [0u8; 4];
        match reader.read_exact(&mut size_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                return Err(EngineError::ResultFile {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        }
        let size = i32::from_le_bytes(size_buf);
        if size <= 0 || size > RESULT_RECORD_MAX {
            debug!(size, "result record size out of range; stopping");
            break;
        }

        let mut literals = Vec::with_capacity(size as usize);
        let mut complete = true;
        for _ in 0..size {
            let mut lit_buf = [0u8; 4];
            match reader.read_exact(&mut lit_buf) {
                Ok(()) => literals.push(i32::from_le_bytes(lit_buf)),
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    complete = false;
                    break;
                }
                Err(e) => {
                    return Err(EngineError::ResultFile {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        }
        if !complete {
            break;
        }
        assignments.push(literals);
    }

    Ok(assignments)
}

/// Best-effort removal of export/result files left behind by prior runs.
/// Returns how many files were removed.
pub fn purge_artifacts(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let stale = (name.starts_with("witness_export_") && name.ends_with(".json"))
            || (name.starts_with("zdd_") && name.ends_with(".bin"));
        if stale && std::fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    if removed > 0 {
        debug!(removed, dir = %dir.display(), "purged stale solver artifacts");
    }
    removed
}
