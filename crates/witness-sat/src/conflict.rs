//! Minimal-conflict reporting for unsatisfiable clause sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::clause::{AssetIdTable, ClauseRecord};

const NO_DIRECT_CONTRADICTIONS: &str = "No direct explicit contradictions detected";
const COMPLEX_INTERACTIONS: &str =
    "Unsatisfiability may be due to complex logical interactions between clauses";
const REVIEW_DEPENDENCIES: &str =
    "Consider reviewing clause dependencies and logical constraints";

/// Outcome of a best-effort minimal-conflict search.
#[derive(Debug, Clone)]
pub struct ConflictFindings {
    /// Rendered clause descriptions, or the informational lines when no
    /// direct contradiction exists.
    pub clauses: Vec<String>,
    /// Whether a literal-level contradiction was found.
    pub direct: bool,
    involved_assets: BTreeSet<i32>,
}

impl ConflictFindings {
    /// Scan the clause records for variables that appear as a positive
    /// literal in one clause and a negative literal in another; every
    /// clause touching such a variable joins the conflict set. Compound
    /// clauses carry no literals, so when nothing direct is found the
    /// findings degrade to three informational lines.
    pub fn analyze(clauses: &[ClauseRecord<'_>], ids: &AssetIdTable) -> Self {
        let mut descriptions = Vec::new();
        let mut involved = BTreeSet::new();

        let mut positive_in: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        let mut negative_in: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (idx, clause) in clauses.iter().enumerate() {
            for &id in &clause.positive_literals {
                positive_in.entry(id).or_default().push(idx);
            }
            for &id in &clause.negative_literals {
                negative_in.entry(id).or_default().push(idx);
            }
        }

        let mut conflicting: BTreeSet<usize> = BTreeSet::new();
        for (&id, pos_clauses) in &positive_in {
            if let Some(neg_clauses) = negative_in.get(&id) {
                conflicting.extend(pos_clauses.iter().copied());
                conflicting.extend(neg_clauses.iter().copied());
                involved.insert(id);
            }
        }

        for &idx in &conflicting {
            descriptions.push(describe_clause(&clauses[idx], ids));
        }
        descriptions.sort();
        descriptions.dedup();

        let direct = !descriptions.is_empty();
        if !direct {
            descriptions = vec![
                NO_DIRECT_CONTRADICTIONS.into(),
                COMPLEX_INTERACTIONS.into(),
                REVIEW_DEPENDENCIES.into(),
            ];
        }

        Self {
            clauses: descriptions,
            direct,
            involved_assets: involved,
        }
    }

    /// Render the full report printed alongside an UNSAT verdict.
    pub fn render(&self, ids: &AssetIdTable) -> String {
        let mut report = String::from("Error: Unsatisfiable clauses detected\n\n");

        if self.direct {
            report.push_str("Minimal conflicting set:\n");
            for (i, clause) in self.clauses.iter().enumerate() {
                report.push_str(&format!("  {}. {clause}\n", i + 1));
            }
            if !self.involved_assets.is_empty() {
                report.push_str("\nAssets involved:\n");
                for &id in &self.involved_assets {
                    let name = ids.name_of(id).unwrap_or("unknown");
                    report.push_str(&format!("  - {name} (ID: {id})\n"));
                }
            }
            report.push_str(
                "\nSuggestion: Review conflicting obligations in your contract specification.",
            );
        } else {
            report.push_str("Analysis Results:\n");
            for (i, line) in self.clauses.iter().enumerate() {
                report.push_str(&format!("  {}. {line}\n", i + 1));
            }
            report.push_str(
                "\nSuggestion: The system is unsatisfiable due to complex logical \
                 interactions. Consider simplifying clause dependencies or reviewing \
                 the overall contract structure.",
            );
        }

        report
    }
}

/// `clause '<name>': <label> [oblig(a), not(b)]`
fn describe_clause(clause: &ClauseRecord<'_>, ids: &AssetIdTable) -> String {
    let mut desc = format!("clause '{}': {}", clause.name, clause.label);

    let mut details = Vec::new();
    for &id in &clause.positive_literals {
        match ids.name_of(id) {
            Some(name) => details.push(format!("oblig({name})")),
            None => details.push(format!("oblig(asset_{id})")),
        }
    }
    for &id in &clause.negative_literals {
        match ids.name_of(id) {
            Some(name) => details.push(format!("not({name})")),
            None => details.push(format!("not(asset_{id})")),
        }
    }
    if !details.is_empty() {
        desc.push_str(&format!(" [{}]", details.join(", ")));
    }

    desc
}
