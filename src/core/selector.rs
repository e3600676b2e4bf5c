//! Weighted-random selection over a filtered candidate list.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::seed;
use crate::schema::catalog::{CatalogItem, ItemIdentity};
use crate::schema::filter::WhereClause;

pub const DEFAULT_MAX_RETRIES: u32 = 20;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectError {
    #[error("no candidates to select from")]
    Empty,
    #[error("filter {filter} matched none of {candidates} candidates")]
    NoMatch { filter: WhereClause, candidates: usize },
    #[error("no candidate distinct from {excluded} previous selections after {attempts} attempts")]
    DistinctExhausted { attempts: u32, excluded: usize },
}

#[derive(Debug, Clone)]
pub struct SelectOptions {
    pub filter: WhereClause,
    pub distinct_from: FxHashSet<ItemIdentity>,
    pub seed: Option<String>,
    pub max_retries: u32,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            filter: WhereClause::default(),
            distinct_from: FxHashSet::default(),
            seed: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl SelectOptions {
    pub fn filter(mut self, filter: WhereClause) -> Self {
        self.filter = filter;
        self
    }

    pub fn distinct_from(mut self, identities: FxHashSet<ItemIdentity>) -> Self {
        self.distinct_from = identities;
        self
    }

    pub fn seed(mut self, seed: Option<&str>) -> Self {
        self.seed = seed.map(str::to_string);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Pick one item from `items`.
///
/// Items are filtered first; the survivors are drawn from by weight. With a
/// non-empty `distinct_from`, draws repeat (attempt `n` seeded with
/// `seed:retry<n>`) until an item outside the set comes up.
pub fn select<'a>(
    items: &'a [CatalogItem],
    options: &SelectOptions,
) -> Result<&'a CatalogItem, SelectError> {
    if items.is_empty() {
        return Err(SelectError::Empty);
    }

    let candidates: Vec<&CatalogItem> = items
        .iter()
        .filter(|item| options.filter.matches(item))
        .collect();
    if candidates.is_empty() {
        return Err(SelectError::NoMatch {
            filter: options.filter.clone(),
            candidates: items.len(),
        });
    }

    let seed = options.seed.as_deref();
    if options.distinct_from.is_empty() {
        return Ok(weighted_pick(&candidates, seed));
    }

    let exhausted = SelectError::DistinctExhausted {
        attempts: options.max_retries,
        excluded: options.distinct_from.len(),
    };
    let identities: Vec<ItemIdentity> = candidates.iter().map(|c| c.identity()).collect();
    if identities.iter().all(|id| options.distinct_from.contains(id)) {
        return Err(exhausted);
    }

    for attempt in 0..options.max_retries {
        let attempt_seed = seed::for_retry(seed, attempt);
        let picked = weighted_index(&candidates, attempt_seed.as_deref());
        if !options.distinct_from.contains(&identities[picked]) {
            return Ok(candidates[picked]);
        }
    }

    Err(exhausted)
}

fn weighted_pick<'a>(candidates: &[&'a CatalogItem], seed: Option<&str>) -> &'a CatalogItem {
    candidates[weighted_index(candidates, seed)]
}

/// Walk the candidates subtracting weights from a uniform draw in
/// `[0, total)`. The last candidate absorbs floating-point leftovers.
fn weighted_index(candidates: &[&CatalogItem], seed: Option<&str>) -> usize {
    let total: f64 = candidates.iter().map(|c| c.effective_weight()).sum();
    let mut threshold = seed::unit(seed) * total;
    for (i, candidate) in candidates.iter().enumerate() {
        threshold -= candidate.effective_weight();
        if threshold <= 0.0 {
            return i;
        }
    }
    candidates.len() - 1
}
