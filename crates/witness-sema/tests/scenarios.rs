//! End-to-end analysis scenarios over programmatically built programs.

use witness_ast::{
    AssetDefinition, BinaryOp, ClauseDefinition, Expression as E, FunctionCall, Program,
    Statement, TypeDefinition, TypeKeyword,
};
use witness_sema::{Analyzer, AnalyzerOptions, DirectiveKind, TypeKind, Verbosity};

fn type_def(keyword: TypeKeyword, name: &str, properties: Vec<E>) -> Statement {
    Statement::Type(TypeDefinition {
        keyword,
        name: name.into(),
        properties,
    })
}

fn subject(name: &str) -> Statement {
    type_def(TypeKeyword::Subject, name, vec![E::ident("x")])
}

fn asset(name: &str, value: Vec<E>) -> Statement {
    Statement::Asset(AssetDefinition {
        name: name.into(),
        value,
    })
}

fn clause(name: &str, expression: E) -> Statement {
    Statement::Clause(ClauseDefinition {
        name: name.into(),
        expression,
    })
}

fn directive(name: &str, args: Vec<E>) -> Statement {
    Statement::Directive(FunctionCall::new(name, args))
}

fn analyzer() -> Analyzer {
    let dir = tempfile::tempdir().unwrap();
    let options = AnalyzerOptions {
        verbosity: Verbosity::Verbose,
        work_dir: dir.path().to_path_buf(),
        ..AnalyzerOptions::default()
    };
    // The tempdir is only needed for stale-artifact cleanup; exhaustive
    // mode writes nothing, so letting it drop immediately is fine.
    Analyzer::new(options)
}

/// A movable-object asset wired through an explicit action chain:
/// `<name>_type` (object/movable) ← `<name>_act` ← asset.
fn movable_asset(statements: &mut Vec<Statement>, name: &str, from: &str, to: &str) {
    statements.push(type_def(
        TypeKeyword::Object,
        &format!("{name}_type"),
        vec![E::ident("movable")],
    ));
    statements.push(type_def(
        TypeKeyword::Action,
        &format!("{name}_act"),
        vec![E::string("hand over"), E::ident(format!("{name}_type"))],
    ));
    statements.push(asset(
        name,
        vec![
            E::ident(from),
            E::ident(format!("{name}_act")),
            E::ident(to),
        ],
    ));
}

#[test]
fn s1_trivial_sat() {
    let program = Program::new(vec![
        subject("a"),
        subject("b"),
        asset("k", vec![E::ident("a"), E::string("give"), E::ident("b")]),
        clause("c1", E::call("oblig", vec![E::ident("k")])),
        directive("global", vec![]),
    ]);

    let mut analyzer = analyzer();
    let report = analyzer.analyze(&program);
    assert!(report.success(), "errors: {:?}", report.diagnostics.errors());

    assert_eq!(report.verdicts.len(), 1);
    let verdict = &report.verdicts[0];
    assert_eq!(verdict.to_string(), "Global check SATISFIABLE");
    assert_eq!(verdict.assignments, vec![vec![1]]);
    assert_eq!(analyzer.asset_ids().get("k"), Some(1));

    // "give" was inferred and registered as an action.
    assert!(report
        .diagnostics
        .warnings()
        .iter()
        .any(|w| w.contains("Type inference: action 'give'")));
    assert_eq!(
        analyzer.symbols().get("give").map(|info| info.kind),
        Some(TypeKind::Action)
    );
}

#[test]
fn s2_direct_contradiction() {
    let program = Program::new(vec![
        subject("a"),
        subject("b"),
        asset("k", vec![E::ident("a"), E::string("give"), E::ident("b")]),
        clause("c1", E::call("oblig", vec![E::ident("k")])),
        clause("c2", E::call("not", vec![E::ident("k")])),
        directive("global", vec![]),
    ]);

    let report = analyzer().analyze(&program);
    let verdict = &report.verdicts[0];
    assert!(!verdict.satisfiable);
    assert!(verdict.to_string().starts_with("Global check UNSATISFIABLE:"));

    let conflict = verdict.conflict_report.as_deref().unwrap();
    assert!(conflict.contains("clause 'c1'"));
    assert!(conflict.contains("clause 'c2'"));
    assert!(conflict.contains("k (ID: 1)"));
}

#[test]
fn s3_implication_sat() {
    let program = Program::new(vec![
        subject("a"),
        subject("b"),
        asset("p", vec![E::ident("a"), E::string("give"), E::ident("b")]),
        asset("q", vec![E::ident("b"), E::string("pay"), E::ident("a")]),
        clause(
            "c1",
            E::binary(
                BinaryOp::Implies,
                E::call("oblig", vec![E::ident("p")]),
                E::call("oblig", vec![E::ident("q")]),
            ),
        ),
        directive("global", vec![]),
    ]);

    let report = analyzer().analyze(&program);
    assert!(report.success());
    let verdict = &report.verdicts[0];
    assert!(verdict.satisfiable);
    assert_eq!(verdict.assignments.len(), 3);
    for expected in [vec![-1, -2], vec![-1, 2], vec![1, 2]] {
        assert!(verdict.assignments.contains(&expected), "missing {expected:?}");
    }
}

#[test]
fn s4_reciprocity_failure() {
    let mut statements = Vec::new();
    for name in ["alice", "bob", "charlie"] {
        statements.push(subject(name));
    }
    movable_asset(&mut statements, "a", "alice", "bob");
    movable_asset(&mut statements, "b", "charlie", "alice");
    statements.push(asset(
        "x",
        vec![E::call("transfer", vec![E::ident("a"), E::ident("b")])],
    ));

    let mut analyzer = analyzer();
    let report = analyzer.analyze(&Program::new(statements));

    assert!(!analyzer.symbols().contains("x"), "asset must be rejected");
    assert_eq!(report.diagnostics.errors().len(), 1);
    assert!(report.diagnostics.errors()[0]
        .to_string()
        .contains("reciprocal pattern"));
}

#[test]
fn s5_idempotence_warning() {
    let mut statements = Vec::new();
    statements.push(subject("alice"));
    statements.push(subject("bob"));
    movable_asset(&mut statements, "a", "alice", "bob");
    statements.push(asset(
        "x",
        vec![E::call("transfer", vec![E::ident("a"), E::ident("a")])],
    ));

    let mut analyzer = analyzer();
    let report = analyzer.analyze(&Program::new(statements));

    assert!(report.success());
    assert!(analyzer.symbols().contains("x"), "idempotent join is admitted");
    assert!(report
        .diagnostics
        .warnings()
        .iter()
        .any(|w| w == "Idempotent transfer operation: transfer(a, a) = a"));
}

#[test]
fn s6_litis_scopes_to_mentioned_assets() {
    // c1 constrains k1; c2 is a contradiction on k2. litis(k1) must ignore
    // c2 and report SAT, then clear everything.
    let program = Program::new(vec![
        subject("a"),
        subject("b"),
        asset("k1", vec![E::ident("a"), E::string("give"), E::ident("b")]),
        asset("k2", vec![E::ident("b"), E::string("pay"), E::ident("a")]),
        clause("c1", E::call("oblig", vec![E::ident("k1")])),
        clause("c2", E::call("oblig", vec![E::ident("k2")])),
        clause("c3", E::call("not", vec![E::ident("k2")])),
        directive("litis", vec![E::ident("k1")]),
        // A fresh clause set accumulates after the directive; a trailing
        // global() sees only c4.
        clause("c4", E::call("oblig", vec![E::ident("k1")])),
        directive("global", vec![]),
    ]);

    let report = analyzer().analyze(&program);
    assert_eq!(report.verdicts.len(), 2);

    let litis = &report.verdicts[0];
    assert_eq!(litis.kind, DirectiveKind::Litis);
    assert!(litis.satisfiable, "contradiction on k2 is out of scope");
    assert_eq!(litis.assignments, vec![vec![1]]);

    let global = &report.verdicts[1];
    assert_eq!(global.kind, DirectiveKind::Global);
    assert!(global.satisfiable);
    assert_eq!(global.assignments, vec![vec![1]]);
}

#[test]
fn meet_synthesizes_an_asset_from_shared_elements() {
    let program = Program::new(vec![
        subject("alice"),
        subject("bob"),
        subject("carol"),
        asset("k1", vec![E::ident("alice"), E::string("give"), E::ident("bob")]),
        asset("k2", vec![E::ident("alice"), E::string("pay"), E::ident("carol")]),
        asset("m", vec![E::call("meet", vec![E::ident("k1"), E::ident("k2")])]),
    ]);

    let mut analyzer = analyzer();
    let report = analyzer.analyze(&program);
    assert!(report.success(), "errors: {:?}", report.diagnostics.errors());

    let verdict = &report.verdicts[0];
    assert_eq!(verdict.kind, DirectiveKind::Meet);
    assert_eq!(verdict.to_string(), "Meet check SATISFIABLE");

    let meet_asset = analyzer.symbols().get("m").unwrap();
    assert_eq!(meet_asset.kind, TypeKind::Asset);
    assert_eq!(meet_asset.components, vec!["alice", "meet", "shared"]);
}

#[test]
fn meet_without_common_ground_is_unsat() {
    let program = Program::new(vec![
        subject("alice"),
        subject("bob"),
        subject("carol"),
        subject("dan"),
        asset("k1", vec![E::ident("alice"), E::string("give"), E::ident("bob")]),
        asset("k2", vec![E::ident("carol"), E::string("pay"), E::ident("dan")]),
        asset("m", vec![E::call("meet", vec![E::ident("k1"), E::ident("k2")])]),
    ]);

    let mut analyzer = analyzer();
    let report = analyzer.analyze(&program);

    let verdict = &report.verdicts[0];
    assert!(!verdict.satisfiable);
    assert!(verdict.to_string().contains("No common elements"));
    assert!(!analyzer.symbols().contains("m"));
}

#[test]
fn meet_synthesized_asset_is_visible_to_later_joins() {
    // The meet result is admitted during asset registration, so a later
    // universal join can reference it.
    let program = Program::new(vec![
        subject("alice"),
        subject("bob"),
        asset("k1", vec![E::ident("alice"), E::string("give"), E::ident("bob")]),
        asset("k2", vec![E::ident("alice"), E::string("pay"), E::ident("bob")]),
        asset("m", vec![E::call("meet", vec![E::ident("k1"), E::ident("k2")])]),
        asset("j", vec![E::call("join", vec![E::ident("m"), E::ident("k1")])]),
    ]);

    let mut analyzer = analyzer();
    let report = analyzer.analyze(&program);
    assert!(report.success(), "errors: {:?}", report.diagnostics.errors());
    assert!(analyzer.symbols().contains("j"));
}

#[test]
fn domain_validates_shape_without_clearing_clauses() {
    let program = Program::new(vec![
        subject("a"),
        subject("b"),
        asset("k", vec![E::ident("a"), E::string("give"), E::ident("b")]),
        clause("c1", E::call("oblig", vec![E::ident("k")])),
        directive("domain", vec![E::ident("k")]),
        directive("global", vec![]),
    ]);

    let report = analyzer().analyze(&program);
    assert!(report.success());
    // domain() produced no verdict; global still saw c1.
    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(report.verdicts[0].assignments, vec![vec![1]]);
}

#[test]
fn engine_verdicts_survive_rejected_definitions() {
    // A rejected asset definition must not stop later statements from
    // being analyzed.
    let program = Program::new(vec![
        subject("a"),
        subject("b"),
        asset("bad", vec![E::ident("a"), E::ident("ghost"), E::ident("b")]),
        asset("k", vec![E::ident("a"), E::string("give"), E::ident("b")]),
        clause("c1", E::call("oblig", vec![E::ident("k")])),
        directive("global", vec![]),
    ]);

    let mut analyzer = analyzer();
    let report = analyzer.analyze(&program);

    assert!(!report.success());
    assert!(!analyzer.symbols().contains("bad"));
    assert_eq!(report.verdicts.len(), 1);
    assert!(report.verdicts[0].satisfiable);
}

#[test]
fn global_with_arguments_is_rejected_without_draining() {
    let program = Program::new(vec![
        subject("a"),
        subject("b"),
        asset("k", vec![E::ident("a"), E::string("give"), E::ident("b")]),
        clause("c1", E::call("oblig", vec![E::ident("k")])),
        directive("global", vec![E::ident("k")]),
        directive("global", vec![]),
    ]);

    let report = analyzer().analyze(&program);
    assert!(!report.success());
    // The malformed global produced no verdict; the well-formed one still
    // sees c1.
    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(report.verdicts[0].assignments, vec![vec![1]]);
}

#[cfg(unix)]
mod external_mode {
    use super::*;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use witness_sema::SolverMode;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("mock_solver.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{body}").unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn write_bin_fixture(path: &Path, records: &[Vec<i32>]) {
        let mut file = std::fs::File::create(path).unwrap();
        for rec in records {
            file.write_all(&(rec.len() as i32).to_le_bytes()).unwrap();
            for &lit in rec {
                file.write_all(&lit.to_le_bytes()).unwrap();
            }
        }
    }

    fn external_analyzer(dir: &Path, solver: PathBuf) -> Analyzer {
        Analyzer::new(AnalyzerOptions {
            solver_mode: SolverMode::External,
            verbosity: Verbosity::Verbose,
            solver_command: Some(solver),
            work_dir: dir.to_path_buf(),
        })
    }

    #[test]
    fn global_runs_through_the_external_solver() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("fixture.bin");
        write_bin_fixture(&fixture, &[vec![1]]);
        let script = write_script(dir.path(), &format!("cp {} \"$2\"", fixture.display()));

        let program = Program::new(vec![
            subject("a"),
            subject("b"),
            asset("k", vec![E::ident("a"), E::string("give"), E::ident("b")]),
            clause("c1", E::call("oblig", vec![E::ident("k")])),
            directive("global", vec![]),
        ]);

        let mut analyzer = external_analyzer(dir.path(), script);
        let report = analyzer.analyze(&program);
        assert!(report.success(), "errors: {:?}", report.diagnostics.errors());

        let verdict = &report.verdicts[0];
        assert!(verdict.satisfiable);
        assert_eq!(verdict.assignments, vec![vec![1]]);

        // The export carries the asset construction for the solver.
        let export: serde_json::Value = {
            let json = std::fs::read_dir(dir.path())
                .unwrap()
                .filter_map(|e| e.ok().map(|e| e.path()))
                .find(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("witness_export_"))
                })
                .expect("export file written");
            serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap()
        };
        assert_eq!(export["asset_names"]["1"], "k");
        assert_eq!(export["asset_construction"]["1"]["subject"], "a");
        assert_eq!(export["asset_construction"]["1"]["action"], "give");
        assert_eq!(export["asset_construction"]["1"]["object"], "b");
    }

    #[test]
    fn solver_failure_reports_unsat_and_records_an_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "exit 7");

        let program = Program::new(vec![
            subject("a"),
            subject("b"),
            asset("k", vec![E::ident("a"), E::string("give"), E::ident("b")]),
            clause("c1", E::call("oblig", vec![E::ident("k")])),
            directive("global", vec![]),
        ]);

        let mut analyzer = external_analyzer(dir.path(), script);
        let report = analyzer.analyze(&program);

        assert!(!report.success());
        let verdict = &report.verdicts[0];
        assert!(!verdict.satisfiable);
        assert!(verdict.detail.contains("exited with code 7"));
        // Analysis continued past the failed directive.
        assert_eq!(report.verdicts.len(), 1);
    }

    #[test]
    fn stale_artifacts_are_purged_at_analysis_start() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("witness_export_9.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("zdd_9.bin"), b"").unwrap();

        let program = Program::new(vec![subject("a")]);
        let mut analyzer = Analyzer::new(AnalyzerOptions {
            verbosity: Verbosity::Quiet,
            work_dir: dir.path().to_path_buf(),
            ..AnalyzerOptions::default()
        });
        analyzer.analyze(&program);

        assert!(!dir.path().join("witness_export_9.json").exists());
        assert!(!dir.path().join("zdd_9.bin").exists());
    }
}
