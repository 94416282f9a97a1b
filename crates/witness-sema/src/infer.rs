//! Heuristic type inference for free action strings.
//!
//! When an asset names its action with a string literal that has no
//! registered definition, the action is classified by case-folded substring
//! match against vocabulary tables, and synthetic symbol-table entries are
//! created so later lookups through the asset's components succeed. The
//! tables are data, not code, so domain vocabularies can grow without
//! touching the classifier.

use crate::symbols::{Constraint, SymbolTable, TypeInfo, TypeKind};

/// Payment, provision and delivery vocabulary.
const POSITIVE_SERVICE_PATTERNS: &[&str] = &[
    "pay", "charge", "bill", "invoice", "compensate", "remunerate", "salary", "wage", "provide",
    "supply", "deliver", "give", "offer", "grant", "award", "bestow", "serve", "assist", "help",
    "support", "maintain", "care", "tend", "feed", "repair", "fix", "restore", "renovate",
    "improve", "enhance", "upgrade", "teach", "train", "educate", "inform", "advise", "counsel",
    "guide", "direct",
];

/// Restriction, prohibition and forbearance vocabulary.
const NEGATIVE_SERVICE_PATTERNS: &[&str] = &[
    "forbid", "prohibit", "ban", "restrict", "limit", "constrain", "confine", "abstain",
    "refrain", "avoid", "prevent", "stop", "cease", "desist", "obligation", "duty",
    "requirement", "compulsion", "mandate", "impose", "burden", "encumber", "bind", "tie",
    "commit", "pledge", "vow", "silence", "secrecy", "confidentiality", "nondisclosure",
    "privacy",
];

/// Transfer and possession vocabulary for movable goods.
const MOVABLE_OBJECT_PATTERNS: &[&str] = &[
    "transfer", "convey", "transport", "move", "shift", "carry", "bear", "sell", "buy",
    "purchase", "acquire", "obtain", "get", "receive", "exchange", "trade", "swap", "barter",
    "negotiate", "deal", "lend", "loan", "borrow", "rent", "lease", "hire", "charter",
    "deliver", "ship", "send", "mail", "post", "dispatch", "forward", "hand", "pass",
    "transmit", "relay", "communicate",
];

/// Real-property and registration vocabulary.
const NON_MOVABLE_OBJECT_PATTERNS: &[&str] = &[
    "own", "possess", "hold", "have", "control", "command", "dominate", "occupy", "inhabit",
    "dwell", "reside", "live", "stay", "remain", "build", "construct", "erect", "establish",
    "found", "create", "demolish", "destroy", "tear", "raze", "level", "flatten", "register",
    "record", "inscribe", "enroll", "list", "catalog", "mortgage", "lien", "secure",
    "guarantee",
];

/// Monetary terms fall back to positive services.
const MONETARY_PATTERNS: &[&str] = &["price", "cost", "fee", "tax", "interest"];

const PATTERN_GROUPS: &[(&[&str], TypeKind, Constraint)] = &[
    (POSITIVE_SERVICE_PATTERNS, TypeKind::Service, Constraint::Positive),
    (NEGATIVE_SERVICE_PATTERNS, TypeKind::Service, Constraint::Negative),
    (MOVABLE_OBJECT_PATTERNS, TypeKind::Object, Constraint::Movable),
    (NON_MOVABLE_OBJECT_PATTERNS, TypeKind::Object, Constraint::NonMovable),
    (MONETARY_PATTERNS, TypeKind::Service, Constraint::Positive),
];

/// Classify an action string. Group order matters: the first group with a
/// matching substring wins, and unknown vocabulary defaults to a movable
/// object.
pub fn classify_action(action: &str) -> (TypeKind, Constraint) {
    let folded = action.to_lowercase();
    for &(patterns, kind, constraint) in PATTERN_GROUPS {
        if patterns.iter().any(|p| folded.contains(p)) {
            return (kind, constraint);
        }
    }
    (TypeKind::Object, Constraint::Movable)
}

/// Create the synthetic entries backing an inferred action: the underlying
/// type `inferred_<kind>_<constraint>` (if missing), the action
/// `inferred_<action>`, and a duplicate under the literal string itself so
/// component lookups resolve.
pub fn register_inferred_action(
    symbols: &mut SymbolTable,
    action: &str,
) -> (TypeKind, Constraint) {
    let (kind, constraint) = classify_action(action);

    let action_name = format!("inferred_{action}");
    if symbols.contains(&action_name) {
        return (kind, constraint);
    }

    let type_name = format!("inferred_{kind}_{constraint}");
    if !symbols.contains(&type_name) {
        symbols.insert(type_name.clone(), TypeInfo::new(kind, Some(constraint)));
    }

    let components = vec![action.to_string(), type_name];
    symbols.insert(
        action_name,
        TypeInfo::with_components(TypeKind::Action, None, components.clone()),
    );
    symbols.insert(
        action,
        TypeInfo::with_components(TypeKind::Action, None, components),
    );

    (kind, constraint)
}
