//! Workflow name resolution.
//!
//! Provider display names are often decorated ("🚀 Deploy Prod",
//! "🗒️n8n terraform plan/apply"), so a configured workflow name matches a run
//! when any of these hold, compared case-insensitively:
//!
//! 1. the names are equal,
//! 2. either name contains the other,
//! 3. either name contains the other once everything except ASCII word
//!    characters and whitespace has been stripped from both.

use std::sync::LazyLock;

use regex::Regex;

use crate::run::WorkflowRun;

static DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("decoration pattern is valid"));

/// Which rule matched a run name against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact,
    Substring,
    Cleaned,
}

/// Strip emoji and punctuation, keeping word characters and whitespace.
pub fn clean_name(name: &str) -> String {
    DECORATION.replace_all(name, "").trim().to_string()
}

fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// First rule under which `run_name` matches `target`, if any.
pub fn match_rule(run_name: &str, target: &str) -> Option<MatchRule> {
    let run_name = run_name.to_lowercase();
    let target = target.to_lowercase();

    if run_name == target {
        return Some(MatchRule::Exact);
    }
    if contains_either(&run_name, &target) {
        return Some(MatchRule::Substring);
    }
    if contains_either(&clean_name(&run_name), &clean_name(&target)) {
        return Some(MatchRule::Cleaned);
    }
    None
}

/// Whether a run belongs to the target workflow.
///
/// An unnamed run never matches. It does not fail the repository either: it
/// stays eligible through the zero-match fallback in [`select_runs`].
pub fn run_matches(run: &WorkflowRun, target: &str) -> bool {
    let Some(name) = run.name.as_deref() else {
        return false;
    };
    match match_rule(name, target) {
        Some(rule) => {
            tracing::trace!(run = name, workflow = target, ?rule, "Workflow name matched");
            true
        },
        None => false,
    }
}

/// Runs from `runs` that belong to `target`, in page order.
///
/// When nothing matches, the whole page is returned instead so that the
/// dashboard still shows the repository's recent activity. This is
/// intentionally surprising; callers that need strict matching should use
/// [`strict_matches`].
pub fn select_runs<'a>(runs: &'a [WorkflowRun], target: &str) -> Vec<&'a WorkflowRun> {
    let matched = strict_matches(runs, target);
    if matched.is_empty() && !runs.is_empty() {
        let available: Vec<&str> = runs.iter().filter_map(|r| r.name.as_deref()).collect();
        tracing::debug!(
            workflow = target,
            ?available,
            "No workflow runs matched, falling back to the full page"
        );
        return runs.iter().collect();
    }
    matched
}

/// Runs whose name matches `target`, without the full-page fallback.
pub fn strict_matches<'a>(runs: &'a [WorkflowRun], target: &str) -> Vec<&'a WorkflowRun> {
    runs.iter().filter(|run| run_matches(run, target)).collect()
}
