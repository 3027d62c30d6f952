//! Template selection strategies.
//!
//! Assignment is random in production. Tests substitute
//! [`SequentialPicker`] so the chosen templates are predictable.

use super::TaskTemplate;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Chooses templates for new and replacement tasks.
pub trait TemplatePicker: Send + Sync {
    /// Pick one template whose id is not in `excluded`.
    ///
    /// When `mood` is given and at least one eligible template lists it, the
    /// pick is restricted to those; otherwise any eligible template may be
    /// chosen. Returns `None` when nothing is eligible.
    fn pick(
        &self,
        candidates: &[TaskTemplate],
        excluded: &HashSet<String>,
        mood: Option<&str>,
    ) -> Option<TaskTemplate>;

    /// Pick `n` distinct templates, or `None` if there are fewer than `n`.
    fn pick_distinct(&self, candidates: &[TaskTemplate], n: usize) -> Option<Vec<TaskTemplate>>;
}

/// Templates not excluded, narrowed to mood matches when any exist.
fn eligible<'a>(
    candidates: &'a [TaskTemplate],
    excluded: &HashSet<String>,
    mood: Option<&str>,
) -> Vec<&'a TaskTemplate> {
    let open: Vec<&TaskTemplate> = candidates
        .iter()
        .filter(|t| !excluded.contains(&t.id))
        .collect();

    if let Some(mood) = mood {
        let matching: Vec<&TaskTemplate> = open
            .iter()
            .copied()
            .filter(|t| t.moods.iter().any(|m| m == mood))
            .collect();
        if !matching.is_empty() {
            return matching;
        }
    }
    open
}

fn distinct_by_id(candidates: &[TaskTemplate]) -> Vec<&TaskTemplate> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|t| seen.insert(t.id.as_str()))
        .collect()
}

/// Uniform random choice.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl TemplatePicker for RandomPicker {
    fn pick(
        &self,
        candidates: &[TaskTemplate],
        excluded: &HashSet<String>,
        mood: Option<&str>,
    ) -> Option<TaskTemplate> {
        let pool = eligible(candidates, excluded, mood);
        let mut rng = rand::thread_rng();
        pool.choose(&mut rng).map(|t| (*t).clone())
    }

    fn pick_distinct(&self, candidates: &[TaskTemplate], n: usize) -> Option<Vec<TaskTemplate>> {
        let pool = distinct_by_id(candidates);
        if pool.len() < n {
            return None;
        }
        let mut rng = rand::thread_rng();
        Some(
            pool.choose_multiple(&mut rng, n)
                .map(|t| (*t).clone())
                .collect(),
        )
    }
}

/// Deterministic round-robin over the eligible pool.
///
/// Each call advances an internal cursor, so repeated picks from the same
/// pool walk through it in catalog order.
#[derive(Debug, Default)]
pub struct SequentialPicker {
    cursor: AtomicUsize,
}

impl SequentialPicker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplatePicker for SequentialPicker {
    fn pick(
        &self,
        candidates: &[TaskTemplate],
        excluded: &HashSet<String>,
        mood: Option<&str>,
    ) -> Option<TaskTemplate> {
        let pool = eligible(candidates, excluded, mood);
        if pool.is_empty() {
            return None;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % pool.len();
        Some(pool[i].clone())
    }

    fn pick_distinct(&self, candidates: &[TaskTemplate], n: usize) -> Option<Vec<TaskTemplate>> {
        let pool = distinct_by_id(candidates);
        if pool.len() < n {
            return None;
        }
        Some(pool.into_iter().take(n).cloned().collect())
    }
}
