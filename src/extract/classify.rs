//! Diversity repair for collapsed categorical fields.
//!
//! Models often tag every step with the same icon or area. When that
//! happens on a tutorial with more than [`MIN_STEPS_FOR_DIVERSITY`] steps,
//! values are re-derived from keyword cues in each step's text, with a
//! position-indexed cycle for steps that match nothing.
use crate::document::{CanonicalDocument, Step};
use crate::tables::{KeywordRule, PipelineTables};
use std::collections::BTreeSet;

pub const MIN_STEPS_FOR_DIVERSITY: usize = 3;

/// Restore icon and area diversity. Never fails.
pub fn diversify(mut doc: CanonicalDocument, tables: &PipelineTables) -> CanonicalDocument {
    if reassign(
        &mut doc.steps,
        |step| &mut step.icon,
        &tables.icon_rules,
        &tables.icon_cycle,
    ) {
        tracing::warn!(steps = doc.steps.len(), "icons collapsed; reassigned by keyword");
    }
    if reassign(
        &mut doc.steps,
        |step| &mut step.area,
        &tables.area_rules,
        &tables.area_cycle,
    ) {
        tracing::warn!(steps = doc.steps.len(), "areas collapsed; reassigned by keyword");
    }
    doc
}

/// Returns true when the field was rewritten.
fn reassign<T, F>(steps: &mut [Step], mut field: F, rules: &[KeywordRule<T>], cycle: &[T]) -> bool
where
    T: Copy + Ord,
    F: FnMut(&mut Step) -> &mut T,
{
    if steps.len() <= MIN_STEPS_FOR_DIVERSITY || distinct(steps, &mut field) > 1 {
        return false;
    }

    let cues: Vec<String> = steps.iter().map(Step::cue_text).collect();
    for (idx, step) in steps.iter_mut().enumerate() {
        let inferred = rules.iter().find_map(|rule| rule.matches(&cues[idx]));
        if let Some(value) = inferred.or_else(|| cycled(cycle, idx)) {
            *field(step) = value;
        }
    }

    // Every step landed on one value; fall back to the cycle's distinct
    // values outright.
    if distinct(steps, &mut field) <= 1 {
        let mut seen = BTreeSet::new();
        let spread: Vec<T> = cycle.iter().copied().filter(|value| seen.insert(*value)).collect();
        for (idx, step) in steps.iter_mut().enumerate() {
            if let Some(value) = cycled(&spread, idx) {
                *field(step) = value;
            }
        }
    }
    true
}

fn distinct<T, F>(steps: &mut [Step], field: &mut F) -> usize
where
    T: Copy + Ord,
    F: FnMut(&mut Step) -> &mut T,
{
    steps
        .iter_mut()
        .map(|step| *field(step))
        .collect::<BTreeSet<_>>()
        .len()
}

fn cycled<T: Copy>(cycle: &[T], idx: usize) -> Option<T> {
    if cycle.is_empty() {
        None
    } else {
        Some(cycle[idx % cycle.len()])
    }
}
