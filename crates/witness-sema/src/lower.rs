//! Lowering of clause definitions into solver clause records.
//!
//! Simple obligation/claim/negation shapes become single signed literals;
//! everything else is recorded as a compound clause evaluated against its
//! AST at solve time. Lowering also owns variable-id assignment: by the
//! time a record is produced, every identifier it mentions has an id.

use witness_ast::{ClauseDefinition, Expression};
use witness_sat::{AssetIdTable, ClauseRecord, BINARY_OP_LABEL};

use crate::diagnostics::Diagnostics;
use crate::errors::SemaError;

/// Lower one clause definition. Returns `None` when the clause is
/// malformed; the error is recorded and the clause is not added.
pub fn lower_clause<'p>(
    def: &'p ClauseDefinition,
    ids: &mut AssetIdTable,
    diagnostics: &mut Diagnostics,
) -> Option<ClauseRecord<'p>> {
    let expr = &def.expression;

    if let Expression::Call(call) = expr {
        match call.name.as_str() {
            "oblig" | "claim" => {
                if call.args.len() != 1 {
                    diagnostics.error(SemaError::LogicalArity {
                        op: call.name.clone(),
                        clause: def.name.clone(),
                        got: call.args.len(),
                    });
                    return None;
                }
                if let Some(asset) = call.sole_identifier() {
                    let id = assign_id(ids, diagnostics, asset);
                    let label = format!("{}({asset})", call.name);
                    return Some(finish(def, diagnostics, vec![id], vec![], label, expr));
                }
            }
            "not" => {
                if call.args.len() != 1 {
                    diagnostics.error(SemaError::LogicalArity {
                        op: call.name.clone(),
                        clause: def.name.clone(),
                        got: call.args.len(),
                    });
                    return None;
                }
                if let Some(asset) = call.sole_identifier() {
                    let id = assign_id(ids, diagnostics, asset);
                    let label = format!("not({asset})");
                    return Some(finish(def, diagnostics, vec![], vec![id], label, expr));
                }
                // not(oblig(x)) / not(claim(x))
                if let Some(inner) = call.args[0].as_call() {
                    if matches!(inner.name.as_str(), "oblig" | "claim") {
                        if let Some(asset) = inner.sole_identifier() {
                            let id = assign_id(ids, diagnostics, asset);
                            let label = format!("not({}({asset}))", inner.name);
                            return Some(finish(
                                def,
                                diagnostics,
                                vec![],
                                vec![id],
                                label,
                                expr,
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // Compound clause: binary operators, nested structure, or other calls.
    // Assign ids for every identifier now so the numbering is complete
    // before any directive solves.
    expr.for_each_identifier(&mut |name| {
        assign_id(ids, diagnostics, name);
    });
    Some(finish(
        def,
        diagnostics,
        vec![],
        vec![],
        BINARY_OP_LABEL.to_string(),
        expr,
    ))
}

fn finish<'p>(
    def: &'p ClauseDefinition,
    diagnostics: &mut Diagnostics,
    positive: Vec<i32>,
    negative: Vec<i32>,
    label: String,
    expr: &'p Expression,
) -> ClauseRecord<'p> {
    let mut literal_text = String::new();
    for id in &positive {
        literal_text.push_str(&format!("+{id} "));
    }
    for id in &negative {
        literal_text.push_str(&format!("-{id} "));
    }
    diagnostics.warn(format!(
        "Clause '{}' added: [{}] from '{label}'",
        def.name,
        literal_text.trim_end()
    ));

    ClauseRecord {
        name: def.name.clone(),
        positive_literals: positive.into_iter().collect(),
        negative_literals: negative.into_iter().collect(),
        label,
        expr,
    }
}

/// Get-or-assign an id, warning on first assignment.
pub fn assign_id(ids: &mut AssetIdTable, diagnostics: &mut Diagnostics, name: &str) -> i32 {
    if let Some(id) = ids.get(name) {
        return id;
    }
    let id = ids.assign(name);
    diagnostics.warn(format!(
        "Asset '{name}' assigned ID {id} for satisfiability checking"
    ));
    id
}
