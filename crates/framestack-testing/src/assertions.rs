//! Custom assertions for the invariants in spec.md §8.
//!
//! Mirrors the teacher's `assert_session_count`-style helpers: small,
//! readable checks that name the property instead of inlining the
//! comparison at every call site.

use anyhow::{bail, Result};

use framestack_types::{Bundle, Frame};

/// `depth(child) == depth(parent) + 1` for every adjacent pair on a path
/// returned by `active_path` (spec.md §8 invariant 1).
pub fn assert_depth_chain(path: &[Frame]) -> Result<()> {
    for pair in path.windows(2) {
        let (parent, child) = (&pair[0], &pair[1]);
        if child.depth != parent.depth + 1 {
            bail!("expected depth {} for {:?}, got {}", parent.depth + 1, child.id, child.depth);
        }
        if child.parent_id != Some(parent.id) {
            bail!("frame {:?} is not a child of {:?}", child.id, parent.id);
        }
    }
    Ok(())
}

/// A bundle's estimated token usage never exceeds the budget it was built
/// against (spec.md §8 invariant 4).
pub fn assert_within_budget(bundle: &Bundle) -> Result<()> {
    if bundle.usage.tokens_used > bundle.usage.token_budget {
        bail!("bundle used {} tokens against a budget of {}", bundle.usage.tokens_used, bundle.usage.token_budget);
    }
    Ok(())
}

/// Every event id in a trace appears exactly once and in non-decreasing
/// order of appearance (spec.md §8 invariant 7, restricted to what a
/// single trace can check: true global exactly-once coverage needs every
/// trace for the run).
pub fn assert_trace_event_ids_distinct(ids: &[framestack_types::EventId]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(*id) {
            bail!("event {id:?} referenced twice within one trace");
        }
    }
    Ok(())
}
