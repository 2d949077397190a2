//! Identity and rename matching of two element collections.

use crate::error::{MigrationError, Result};
use crate::similarity::similarity;
use apidelta_model::{DeltaIdentifiable, DeltaIdentifier};
use std::collections::HashSet;

/// Pairing of old and new elements.
#[derive(Debug)]
pub struct Matching<'a, T> {
    /// Pairs with equal identifiers, in old declaration order.
    pub matched: Vec<(&'a T, &'a T)>,
    /// Pairs detected as renames, with their similarity.
    pub renamed: Vec<(&'a T, &'a T, f64)>,
    /// Old elements without a partner.
    pub removed: Vec<&'a T>,
    /// New elements without a partner, in new declaration order.
    pub added: Vec<&'a T>,
}

impl<'a, T> Matching<'a, T> {
    /// Matched and renamed pairs, matched first.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a T, &'a T)> + '_ {
        self.matched
            .iter()
            .copied()
            .chain(self.renamed.iter().map(|(l, r, _)| (*l, *r)))
    }
}

fn unique_ids<T: DeltaIdentifiable>(items: &[T], kind: &str) -> Result<Vec<DeltaIdentifier>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = item.delta_identifier();
        if !seen.insert(id.clone()) {
            return Err(MigrationError::structural(format!(
                "duplicate {kind} identifier '{id}'"
            )));
        }
        ids.push(id);
    }
    Ok(ids)
}

/// Pair `lhs` and `rhs` by identifier, then detect renames.
///
/// Each unpaired old element claims the unclaimed new element with the
/// highest identifier similarity of at least `threshold` that also passes
/// `relaxed`. Ties go to the earlier new element.
pub fn match_elements<'a, T, F>(
    lhs: &'a [T],
    rhs: &'a [T],
    threshold: f64,
    kind: &str,
    relaxed: F,
) -> Result<Matching<'a, T>>
where
    T: DeltaIdentifiable,
    F: Fn(&T, &T) -> bool,
{
    let lhs_ids = unique_ids(lhs, kind)?;
    let rhs_ids = unique_ids(rhs, kind)?;

    let rhs_set: HashSet<&DeltaIdentifier> = rhs_ids.iter().collect();
    let lhs_set: HashSet<&DeltaIdentifier> = lhs_ids.iter().collect();

    let mut matched = Vec::new();
    let mut removal_candidates = Vec::new();
    for (item, id) in lhs.iter().zip(&lhs_ids) {
        if rhs_set.contains(id) {
            let index = rhs_ids.iter().position(|r| r == id).ok_or_else(|| {
                MigrationError::structural(format!("missing matched {kind} identifier '{id}'"))
            })?;
            matched.push((item, &rhs[index]));
        } else {
            removal_candidates.push((item, id));
        }
    }

    let addition_candidates: Vec<(&T, &DeltaIdentifier)> = rhs
        .iter()
        .zip(&rhs_ids)
        .filter(|(_, id)| !lhs_set.contains(id))
        .collect();
    let mut claimed = vec![false; addition_candidates.len()];

    let mut renamed = Vec::new();
    let mut removed = Vec::new();
    for (old, old_id) in removal_candidates {
        let mut best: Option<(usize, f64)> = None;
        for (i, (new, new_id)) in addition_candidates.iter().enumerate() {
            if claimed[i] || !relaxed(old, *new) {
                continue;
            }
            let score = similarity(old_id.as_str(), new_id.as_str());
            if score >= threshold && best.map(|(_, b)| score > b).unwrap_or(true) {
                best = Some((i, score));
            }
        }
        match best {
            Some((i, score)) => {
                claimed[i] = true;
                renamed.push((old, addition_candidates[i].0, score));
            }
            None => removed.push(old),
        }
    }

    let added = addition_candidates
        .iter()
        .zip(&claimed)
        .filter(|(_, c)| !**c)
        .map(|((item, _), _)| *item)
        .collect();

    Ok(Matching {
        matched,
        renamed,
        removed,
        added,
    })
}
