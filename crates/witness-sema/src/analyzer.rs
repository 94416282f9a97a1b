//! The analysis pipeline: three passes over the program, directive
//! dispatch, and engine selection.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

use witness_ast::{
    AssetDefinition, Expression, FunctionCall, Program, Statement, TypeDefinition, TypeKeyword,
};
use witness_sat::{
    purge_artifacts, AssetConstruction, AssetIdTable, ClauseRecord, ConflictFindings, EngineError,
    ExhaustiveEngine, ExternalEngine, SatEngine, SatOutcome, SolveJob,
};

use crate::diagnostics::{Diagnostics, Verbosity};
use crate::errors::{SemaError, Side};
use crate::infer::register_inferred_action;
use crate::joins::{asset_components, compose_components, validate_join, JoinOp};
use crate::lower::lower_clause;
use crate::symbols::{constraint_from_properties, SymbolTable, TypeInfo, TypeKind};

/// Which satisfiability engine directives run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverMode {
    #[default]
    Exhaustive,
    External,
}

impl std::str::FromStr for SolverMode {
    type Err = SemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exhaustive" => Ok(SolverMode::Exhaustive),
            "external" => Ok(SolverMode::External),
            other => Err(SemaError::UnknownSolverMode { mode: other.into() }),
        }
    }
}

/// Host-facing configuration for one analyzer instance.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub solver_mode: SolverMode,
    pub verbosity: Verbosity,
    /// Override for the external solver command; `None` uses the default.
    pub solver_command: Option<PathBuf>,
    /// Directory for export/result files and stale-artifact cleanup.
    pub work_dir: PathBuf,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            solver_mode: SolverMode::Exhaustive,
            verbosity: Verbosity::Normal,
            solver_command: None,
            work_dir: PathBuf::from("."),
        }
    }
}

/// Which directive produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Global,
    Litis,
    Meet,
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectiveKind::Global => f.write_str("Global"),
            DirectiveKind::Litis => f.write_str("Litis"),
            DirectiveKind::Meet => f.write_str("Meet"),
        }
    }
}

/// Outcome of one satisfiability directive.
#[derive(Debug, Clone)]
pub struct DirectiveVerdict {
    pub kind: DirectiveKind,
    pub satisfiable: bool,
    pub detail: String,
    /// Satisfying assignments (signed literals, ascending by |id|).
    pub assignments: Vec<Vec<i32>>,
    /// Minimal-conflict report accompanying an UNSAT verdict.
    pub conflict_report: Option<String>,
}

impl std::fmt::Display for DirectiveVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.satisfiable {
            write!(f, "{} check SATISFIABLE", self.kind)
        } else {
            write!(f, "{} check UNSATISFIABLE: {}", self.kind, self.detail)
        }
    }
}

/// Everything one `analyze` call produced.
#[derive(Debug)]
pub struct AnalysisReport {
    pub verdicts: Vec<DirectiveVerdict>,
    pub diagnostics: Diagnostics,
}

impl AnalysisReport {
    pub fn success(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Multi-pass semantic analyzer for Witness programs.
///
/// The symbol table is rebuilt per analysis; the asset-id table survives
/// across `analyze` calls so repeated analyses in one process keep a stable
/// variable numbering.
pub struct Analyzer {
    options: AnalyzerOptions,
    symbols: SymbolTable,
    ids: AssetIdTable,
    diagnostics: Diagnostics,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        let verbosity = options.verbosity;
        Self {
            options,
            symbols: SymbolTable::new(),
            ids: AssetIdTable::new(),
            diagnostics: Diagnostics::new(verbosity),
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn asset_ids(&self) -> &AssetIdTable {
        &self.ids
    }

    /// Run the full three-pass analysis.
    pub fn analyze<'p>(&mut self, program: &'p Program) -> AnalysisReport {
        purge_artifacts(&self.options.work_dir);
        self.symbols.clear();
        self.diagnostics = Diagnostics::new(self.options.verbosity);

        let mut clauses: Vec<ClauseRecord<'p>> = Vec::new();
        let mut verdicts: Vec<DirectiveVerdict> = Vec::new();

        // Pass 1: type registration.
        for stmt in &program.statements {
            if let Statement::Type(def) = stmt {
                self.register_type(def);
            }
        }

        // Pass 2: asset registration (join validation, meet synthesis).
        for stmt in &program.statements {
            if let Statement::Asset(def) = stmt {
                self.register_asset(def, &mut clauses, &mut verdicts);
            }
        }

        // Pass 3: statement analysis in program order.
        for stmt in &program.statements {
            match stmt {
                Statement::Type(def) => self.revisit_type(def),
                Statement::Asset(def) => {
                    debug!(asset = %def.name, admitted = self.symbols.contains(&def.name), "revisiting asset");
                }
                Statement::Clause(def) => {
                    if let Some(record) = lower_clause(def, &mut self.ids, &mut self.diagnostics) {
                        clauses.push(record);
                    }
                }
                Statement::Directive(call) => {
                    self.dispatch_directive(call, &mut clauses, &mut verdicts);
                }
                Statement::Empty => {}
            }
        }

        if self.diagnostics.has_errors() {
            info!(
                errors = self.diagnostics.errors().len(),
                "semantic analysis completed with errors"
            );
        } else {
            info!("semantic analysis completed successfully");
        }

        AnalysisReport {
            verdicts,
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }

    // ---------------------------------------------------------------
    // Pass 1: types
    // ---------------------------------------------------------------

    fn register_type(&mut self, def: &TypeDefinition) {
        let constraint = constraint_from_properties(&def.properties);
        let mut info = TypeInfo::new(def.keyword.into(), constraint);
        if def.keyword == TypeKeyword::Action {
            // Preserve [description, referenced_type] so join-leg
            // resolution can follow the chain later.
            info.components = def
                .properties
                .iter()
                .filter_map(|expr| match expr {
                    Expression::Identifier(name) => Some(name.clone()),
                    Expression::StringLiteral(value) => Some(value.clone()),
                    _ => None,
                })
                .collect();
        }
        self.symbols.insert(def.name.clone(), info);
    }

    fn revisit_type(&mut self, def: &TypeDefinition) {
        if def.keyword != TypeKeyword::Action {
            return;
        }
        if let Some(info) = self.symbols.get(&def.name) {
            if let Some(referenced) = info.components.get(1) {
                if !self.symbols.contains(referenced) {
                    self.diagnostics.warn(format!(
                        "action '{}' references undefined type '{referenced}'",
                        def.name
                    ));
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Pass 2: assets
    // ---------------------------------------------------------------

    fn register_asset<'p>(
        &mut self,
        def: &'p AssetDefinition,
        clauses: &mut Vec<ClauseRecord<'p>>,
        verdicts: &mut Vec<DirectiveVerdict>,
    ) {
        if let [Expression::Call(call)] = def.value.as_slice() {
            if let Some(op) = JoinOp::from_name(&call.name) {
                self.register_join_asset(def, op, call);
            } else if call.name == "meet" {
                self.run_meet(call, Some(def.name.as_str()), clauses, verdicts);
            } else {
                self.diagnostics.error(SemaError::AssetValue {
                    name: def.name.clone(),
                });
            }
            return;
        }

        self.register_plain_asset(def);
    }

    fn register_join_asset(&mut self, def: &AssetDefinition, op: JoinOp, call: &FunctionCall) {
        if call.args.len() != 2 {
            self.diagnostics.error(SemaError::JoinArity {
                op: op.name().into(),
                got: call.args.len(),
            });
            return;
        }
        let (left, right) = (&call.args[0], &call.args[1]);

        if let Err(err) = validate_join(&self.symbols, &mut self.diagnostics, op, left, right) {
            self.diagnostics.error(err);
            return;
        }

        let Some(left_components) = asset_components(&self.symbols, left) else {
            self.diagnostics.error(SemaError::JoinOperand {
                op: op.name().into(),
                side: Side::Left,
            });
            return;
        };
        let Some(right_components) = asset_components(&self.symbols, right) else {
            self.diagnostics.error(SemaError::JoinOperand {
                op: op.name().into(),
                side: Side::Right,
            });
            return;
        };

        let components = compose_components(op, &left_components, &right_components);
        self.diagnostics.warn(format!(
            "Join asset '{}' created with components: ({}, {}, {})",
            def.name, components[0], components[1], components[2]
        ));
        self.symbols.insert(
            def.name.clone(),
            TypeInfo::with_components(TypeKind::Asset, None, components),
        );
    }

    fn register_plain_asset(&mut self, def: &AssetDefinition) {
        let mut components = Vec::new();
        for (position, expr) in def.value.iter().enumerate() {
            match expr {
                Expression::Identifier(name) => components.push(name.clone()),
                Expression::StringLiteral(value) => {
                    components.push(value.clone());
                    if position == 1 && !self.symbols.contains(value) {
                        let (kind, constraint) =
                            register_inferred_action(&mut self.symbols, value);
                        self.diagnostics.warn(format!(
                            "Type inference: action '{value}' inferred as {kind} ({constraint})"
                        ));
                    }
                }
                _ => {}
            }
        }

        if components.len() != 3 {
            self.diagnostics.error(SemaError::AssetArity {
                name: def.name.clone(),
            });
            return;
        }

        let checks: [(usize, &[TypeKind], &'static str); 3] = [
            (
                0,
                &[TypeKind::Subject, TypeKind::Authority],
                "subject or authority",
            ),
            (
                1,
                &[TypeKind::Service, TypeKind::Action, TypeKind::Time],
                "service, action, or time",
            ),
            (
                2,
                &[TypeKind::Subject, TypeKind::Authority],
                "subject or authority",
            ),
        ];
        for (position, kinds, expected) in checks {
            if !self.symbols.is_kind(&components[position], kinds) {
                self.diagnostics.error(SemaError::ComponentKind {
                    asset: def.name.clone(),
                    component: components[position].clone(),
                    expected,
                });
                return;
            }
        }

        self.symbols.insert(
            def.name.clone(),
            TypeInfo::with_components(TypeKind::Asset, None, components),
        );
    }

    // ---------------------------------------------------------------
    // Pass 3: directives
    // ---------------------------------------------------------------

    fn dispatch_directive<'p>(
        &mut self,
        call: &'p FunctionCall,
        clauses: &mut Vec<ClauseRecord<'p>>,
        verdicts: &mut Vec<DirectiveVerdict>,
    ) {
        match call.name.as_str() {
            "global" => self.run_global(call, clauses, verdicts),
            "litis" => self.run_litis(call, clauses, verdicts),
            "meet" => self.run_meet(call, None, clauses, verdicts),
            "domain" => self.run_domain(call),
            other => self
                .diagnostics
                .warn(format!("unknown directive '{other}' ignored")),
        }
    }

    fn run_global<'p>(
        &mut self,
        call: &FunctionCall,
        clauses: &mut Vec<ClauseRecord<'p>>,
        verdicts: &mut Vec<DirectiveVerdict>,
    ) {
        if !call.args.is_empty() {
            self.diagnostics.error(SemaError::DirectiveArity {
                directive: "global".into(),
                expected: "no arguments",
                got: call.args.len(),
            });
            return;
        }

        let verdict = self.solve_to_verdict(DirectiveKind::Global, clauses);
        self.diagnostics
            .warn(format!("{verdict}"));
        verdicts.push(verdict);

        clauses.clear();
        self.diagnostics
            .warn("Clause set reset after global() operation");
    }

    fn run_litis<'p>(
        &mut self,
        call: &FunctionCall,
        clauses: &mut Vec<ClauseRecord<'p>>,
        verdicts: &mut Vec<DirectiveVerdict>,
    ) {
        if call.args.is_empty() {
            self.diagnostics.error(SemaError::DirectiveArity {
                directive: "litis".into(),
                expected: "at least 1 argument",
                got: 0,
            });
            return;
        }
        let mut targets = Vec::new();
        for arg in &call.args {
            match arg.as_identifier() {
                Some(name) => targets.push(name.to_string()),
                None => {
                    self.diagnostics.error(SemaError::DirectiveArgument {
                        directive: "litis".into(),
                    });
                    return;
                }
            }
        }

        let mut target_ids = std::collections::BTreeSet::new();
        for name in &targets {
            match self.ids.get(name) {
                Some(id) => {
                    target_ids.insert(id);
                }
                None => self.diagnostics.warn(format!(
                    "Asset '{name}' not found in current clauses - skipping"
                )),
            }
        }

        let retained: Vec<ClauseRecord<'p>> = clauses
            .iter()
            .filter(|clause| !clause.variables(&self.ids).is_disjoint(&target_ids))
            .cloned()
            .collect();

        let verdict = if target_ids.is_empty() || retained.is_empty() {
            // Nothing in scope is constrained: trivially satisfiable.
            DirectiveVerdict {
                kind: DirectiveKind::Litis,
                satisfiable: true,
                detail: "no clauses involve the selected assets".into(),
                assignments: vec![Vec::new()],
                conflict_report: None,
            }
        } else {
            self.solve_to_verdict(DirectiveKind::Litis, &retained)
        };
        self.diagnostics.warn(format!("{verdict}"));
        verdicts.push(verdict);

        clauses.clear();
        self.diagnostics
            .warn("Clause set reset after litis() operation");
    }

    fn run_meet<'p>(
        &mut self,
        call: &FunctionCall,
        enclosing_asset: Option<&str>,
        clauses: &mut Vec<ClauseRecord<'p>>,
        verdicts: &mut Vec<DirectiveVerdict>,
    ) {
        if call.args.len() != 2 {
            self.diagnostics.error(SemaError::DirectiveArity {
                directive: "meet".into(),
                expected: "exactly 2 arguments",
                got: call.args.len(),
            });
            return;
        }
        let names: Vec<&str> = call
            .args
            .iter()
            .filter_map(|arg| arg.as_identifier())
            .collect();
        let [left_name, right_name] = names.as_slice() else {
            self.diagnostics.error(SemaError::DirectiveArgument {
                directive: "meet".into(),
            });
            return;
        };

        let verdict = match (
            self.meet_operand(left_name),
            self.meet_operand(right_name),
        ) {
            (Some(left), Some(right)) => {
                self.meet_verdict(left_name, &left, right_name, &right, enclosing_asset)
            }
            (missing_left, _) => {
                let name = if missing_left.is_none() {
                    left_name
                } else {
                    right_name
                };
                self.diagnostics.error(SemaError::MeetOperand {
                    name: name.to_string(),
                });
                DirectiveVerdict {
                    kind: DirectiveKind::Meet,
                    satisfiable: false,
                    detail: format!("Asset '{name}' not found or not a valid asset"),
                    assignments: Vec::new(),
                    conflict_report: None,
                }
            }
        };
        self.diagnostics.warn(format!("{verdict}"));
        verdicts.push(verdict);

        clauses.clear();
        self.diagnostics
            .warn("Clause set reset after meet() operation");
    }

    fn meet_operand(&self, name: &str) -> Option<Vec<String>> {
        let info = self.symbols.get(name)?;
        if info.kind == TypeKind::Asset && info.components.len() >= 3 {
            Some(info.components.clone())
        } else {
            None
        }
    }

    /// Shared-element extraction across subject/action/object positions,
    /// including the two cross-position equalities.
    fn meet_verdict(
        &mut self,
        left_name: &str,
        left: &[String],
        right_name: &str,
        right: &[String],
        enclosing_asset: Option<&str>,
    ) -> DirectiveVerdict {
        let mut shared = Vec::new();
        if left[0] == right[0] {
            shared.push(format!("subject: {}", left[0]));
        }
        if left[2] == right[2] {
            shared.push(format!("object: {}", left[2]));
        }
        if left[1] == right[1] {
            shared.push(format!("action: {}", left[1]));
        }
        let mut common_subject: Option<String> = None;
        let mut common_object: Option<String> = None;
        if left[0] == right[0] {
            common_subject = Some(left[0].clone());
        }
        if left[2] == right[2] {
            common_object = Some(left[2].clone());
        }
        if left[0] == right[2] {
            shared.push(format!("subject-object: {} and {}", left[0], right[2]));
            common_subject = Some(left[0].clone());
            common_object = Some(right[2].clone());
        }
        if left[2] == right[0] {
            shared.push(format!("object-subject: {} and {}", left[2], right[0]));
        }

        if shared.is_empty() {
            self.diagnostics.warn(format!(
                "No common elements between '{left_name}' ({}) and '{right_name}' ({})",
                left.join(", "),
                right.join(", ")
            ));
            return DirectiveVerdict {
                kind: DirectiveKind::Meet,
                satisfiable: false,
                detail: format!(
                    "No common elements found between '{left_name}' and '{right_name}'"
                ),
                assignments: Vec::new(),
                conflict_report: None,
            };
        }

        for element in &shared {
            self.diagnostics.warn(format!(
                "Common element between '{left_name}' and '{right_name}': {element}"
            ));
        }

        if let Some(asset_name) = enclosing_asset {
            let components = vec![
                common_subject.unwrap_or_else(|| "shared".into()),
                "meet".into(),
                common_object.unwrap_or_else(|| "shared".into()),
            ];
            self.diagnostics.warn(format!(
                "Created meet asset '{asset_name}' with components: ({}, {}, {})",
                components[0], components[1], components[2]
            ));
            self.symbols.insert(
                asset_name.to_string(),
                TypeInfo::with_components(TypeKind::Asset, None, components),
            );
        }

        DirectiveVerdict {
            kind: DirectiveKind::Meet,
            satisfiable: true,
            detail: format!("Found {} common elements", shared.len()),
            assignments: Vec::new(),
            conflict_report: None,
        }
    }

    fn run_domain(&mut self, call: &FunctionCall) {
        if call.args.is_empty() {
            self.diagnostics.error(SemaError::DirectiveArity {
                directive: "domain".into(),
                expected: "at least 1 argument",
                got: 0,
            });
            return;
        }
        if call.args.iter().any(|arg| arg.as_identifier().is_none()) {
            self.diagnostics.error(SemaError::DirectiveArgument {
                directive: "domain".into(),
            });
            return;
        }
        debug!(args = call.args.len(), "domain() validated; no analysis performed");
    }

    // ---------------------------------------------------------------
    // Engine selection
    // ---------------------------------------------------------------

    fn solve_to_verdict(
        &mut self,
        kind: DirectiveKind,
        clauses: &[ClauseRecord<'_>],
    ) -> DirectiveVerdict {
        match self.solve(clauses) {
            Ok(outcome) => {
                let conflict_report = if outcome.satisfiable {
                    None
                } else {
                    let findings = ConflictFindings::analyze(clauses, &self.ids);
                    Some(findings.render(&self.ids))
                };
                DirectiveVerdict {
                    kind,
                    satisfiable: outcome.satisfiable,
                    detail: outcome.detail,
                    assignments: outcome.assignments,
                    conflict_report,
                }
            }
            Err(err) => {
                let detail = err.to_string();
                self.diagnostics.error(SemaError::Engine(err));
                DirectiveVerdict {
                    kind,
                    satisfiable: false,
                    detail,
                    assignments: Vec::new(),
                    conflict_report: None,
                }
            }
        }
    }

    fn solve(&self, clauses: &[ClauseRecord<'_>]) -> Result<SatOutcome, EngineError> {
        let constructions = self.asset_constructions();
        let job = SolveJob {
            clauses,
            ids: &self.ids,
            constructions: &constructions,
        };
        match self.options.solver_mode {
            SolverMode::Exhaustive => ExhaustiveEngine::new().solve(&job),
            SolverMode::External => {
                let command = self
                    .options
                    .solver_command
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(witness_sat::external::DEFAULT_SOLVER_COMMAND));
                ExternalEngine::with_command_in(command, &self.options.work_dir).solve(&job)
            }
        }
    }

    fn asset_constructions(&self) -> BTreeMap<i32, AssetConstruction> {
        let mut constructions = BTreeMap::new();
        for (name, id) in self.ids.iter() {
            if let Some(info) = self.symbols.get(name) {
                if info.kind == TypeKind::Asset && info.components.len() == 3 {
                    constructions.insert(
                        id,
                        AssetConstruction {
                            subject: info.components[0].clone(),
                            action: info.components[1].clone(),
                            object: info.components[2].clone(),
                        },
                    );
                }
            }
        }
        constructions
    }
}

/// Convenience wrapper: analyze a program with the given options.
pub fn analyze_program(program: &Program, options: AnalyzerOptions) -> AnalysisReport {
    Analyzer::new(options).analyze(program)
}
