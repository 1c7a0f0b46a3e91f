//! Weighted replacement candidates and the algebra that combines them.
//!
//! A `Replacement` is one possible original-script rendering of a Romanized
//! segment. A `ReplacementList` holds every candidate for one segment.
//! Adding two lists concatenates their keys and emits the weighted
//! cross-product of their candidates; sorting is a separate, explicit step.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Add, Index};

use crate::key::QueryError;

/// One candidate rendering of a Romanized segment.
///
/// The candidate text and the Romanized source are both derived from the
/// provenance pairs, so a `Replacement` always knows which Romanized
/// segment produced which original-script segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    weight: i64,
    keyvalue: Vec<(String, String)>,
}

impl Replacement {
    pub fn new(weight: i64, value: impl Into<String>, key: impl Into<String>) -> Self {
        Replacement {
            weight,
            keyvalue: vec![(key.into(), value.into())],
        }
    }

    /// The additive identity: zero weight and *empty* provenance, so adding
    /// it on either side changes nothing.
    pub fn empty() -> Self {
        Replacement {
            weight: 0,
            keyvalue: Vec::new(),
        }
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }

    /// Per-segment `(romanized, original)` provenance, in left-to-right order.
    pub fn keyvalue(&self) -> &[(String, String)] {
        &self.keyvalue
    }

    /// The candidate text in the original script.
    pub fn value(&self) -> String {
        self.keyvalue.iter().map(|(_, v)| v.as_str()).collect()
    }

    /// The Romanized text this candidate was derived from.
    pub fn key(&self) -> String {
        self.keyvalue.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn add_weight(&mut self, offset: i64) {
        self.weight += offset;
    }
}

impl Add<&Replacement> for Replacement {
    type Output = Replacement;

    fn add(mut self, rhs: &Replacement) -> Replacement {
        self.weight += rhs.weight;
        self.keyvalue.extend(rhs.keyvalue.iter().cloned());
        self
    }
}

impl Add for &Replacement {
    type Output = Replacement;

    fn add(self, rhs: &Replacement) -> Replacement {
        self.clone() + rhs
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value())
    }
}

/// All candidates for one Romanized segment, in insertion order until
/// explicitly sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementList {
    key: String,
    reps: Vec<Replacement>,
}

impl ReplacementList {
    pub fn new(key: impl Into<String>) -> Self {
        ReplacementList {
            key: key.into(),
            reps: Vec::new(),
        }
    }

    pub fn from_reps(key: impl Into<String>, reps: Vec<Replacement>) -> Self {
        ReplacementList {
            key: key.into(),
            reps,
        }
    }

    /// The identity under `+`: empty key, one empty candidate.
    pub fn empty() -> Self {
        ReplacementList {
            key: String::new(),
            reps: vec![Replacement::empty()],
        }
    }

    /// The Romanized string this list decodes.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.reps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }

    pub fn push(&mut self, rep: Replacement) {
        self.reps.push(rep);
    }

    /// Append candidates from another source; the key is left untouched.
    pub fn extend(&mut self, reps: impl IntoIterator<Item = Replacement>) {
        self.reps.extend(reps);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Replacement> {
        self.reps.iter()
    }

    /// Shift every candidate's weight by `offset`.
    pub fn add_weight(&mut self, offset: i64) {
        for rep in &mut self.reps {
            rep.add_weight(offset);
        }
    }

    /// Stable ascending sort on weight. Equal-weight candidates keep their
    /// insertion order.
    pub fn sort(&mut self) {
        self.reps.sort_by_key(Replacement::weight);
    }

    /// Sort, then drop candidates whose rendered value repeats, keeping the
    /// lightest occurrence.
    pub fn prune(&mut self) {
        self.sort();
        let mut seen = HashSet::new();
        self.reps.retain(|rep| seen.insert(rep.value()));
    }

    /// Convert integer weights into normalized probabilities: each candidate
    /// scores `max(w)+1 - w`, divided by the total. Smaller weight means
    /// larger probability; the results sum to 1.
    pub fn makestat(&self) -> Vec<(f64, String)> {
        let Some(max) = self.reps.iter().map(Replacement::weight).max() else {
            return Vec::new();
        };
        let scores: Vec<i64> = self.reps.iter().map(|r| max + 1 - r.weight()).collect();
        let total: i64 = scores.iter().sum();
        self.reps
            .iter()
            .zip(scores)
            .map(|(rep, score)| (score as f64 / total as f64, rep.value()))
            .collect()
    }

    /// The list reduced to plain `(weight, value)` pairs. The result is a
    /// valid character-group entry, so simplified keys can be fed back in as
    /// a profile.
    pub fn simplify(&self) -> Vec<(i64, String)> {
        self.reps.iter().map(|r| (r.weight(), r.value())).collect()
    }
}

impl Index<usize> for ReplacementList {
    type Output = Replacement;

    fn index(&self, i: usize) -> &Replacement {
        &self.reps[i]
    }
}

impl<'a> IntoIterator for &'a ReplacementList {
    type Item = &'a Replacement;
    type IntoIter = std::slice::Iter<'a, Replacement>;

    fn into_iter(self) -> Self::IntoIter {
        self.reps.iter()
    }
}

impl IntoIterator for ReplacementList {
    type Item = Replacement;
    type IntoIter = std::vec::IntoIter<Replacement>;

    fn into_iter(self) -> Self::IntoIter {
        self.reps.into_iter()
    }
}

impl Add for &ReplacementList {
    type Output = ReplacementList;

    /// Keys concatenate and every pair of candidates is added, outer
    /// iteration on the left operand. The result is not sorted. Callers
    /// that never need the whole list stream it with [`combinations`]
    /// instead.
    fn add(self, rhs: &ReplacementList) -> ReplacementList {
        let mut key = String::with_capacity(self.key.len() + rhs.key.len());
        key.push_str(&self.key);
        key.push_str(&rhs.key);
        let reps = Combinations::new(vec![self, rhs]).collect();
        ReplacementList { key, reps }
    }
}

impl fmt::Display for ReplacementList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.key)?;
        for rep in &self.reps {
            write!(f, "\n{:2} {}", rep.weight(), rep)?;
        }
        Ok(())
    }
}

/// Reduce a sequence of lists into one via a single multi-way cross-product,
/// equivalent to a left fold over `+` without the intermediate lists.
pub fn add_rlists<'a, I>(lists: I) -> Result<ReplacementList, QueryError>
where
    I: IntoIterator<Item = &'a ReplacementList>,
{
    let combos = combinations(lists)?;
    let key = combos.key();
    let reps = combos.collect();
    Ok(ReplacementList { key, reps })
}

/// Lazy variant of [`add_rlists`]: an iterator over the combined
/// candidates, built one at a time in the same order the reduction
/// materializes them. The cross-product can blow up quickly, so callers
/// that filter or truncate iterate this directly and only `collect` (or
/// sort) when they really need the whole list.
pub fn combinations<'a, I>(lists: I) -> Result<Combinations<'a>, QueryError>
where
    I: IntoIterator<Item = &'a ReplacementList>,
{
    let lists: Vec<&ReplacementList> = lists.into_iter().collect();
    if lists.is_empty() {
        return Err(QueryError::EmptyReduction);
    }
    Ok(Combinations::new(lists))
}

/// On-demand cross-product over a sequence of lists. Candidates come out
/// in lexicographic order, rightmost list fastest: the same order a fold
/// over `+` produces.
#[derive(Debug)]
pub struct Combinations<'a> {
    lists: Vec<&'a ReplacementList>,
    idx: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    pub(crate) fn new(lists: Vec<&'a ReplacementList>) -> Self {
        let done = lists.iter().any(|l| l.is_empty());
        let idx = vec![0; lists.len()];
        Combinations { lists, idx, done }
    }

    /// The concatenated Romanized key of the combined lists.
    pub fn key(&self) -> String {
        self.lists.iter().map(|l| l.key()).collect()
    }
}

impl Iterator for Combinations<'_> {
    type Item = Replacement;

    fn next(&mut self) -> Option<Replacement> {
        if self.done {
            return None;
        }
        let mut combined = Replacement::empty();
        for (list, &i) in self.lists.iter().zip(&self.idx) {
            combined = combined + &list[i];
        }

        // advance the odometer, rightmost wheel fastest
        let mut pos = self.idx.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.idx[pos] += 1;
            if self.idx[pos] < self.lists[pos].len() {
                break;
            }
            self.idx[pos] = 0;
        }
        Some(combined)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let mut total: usize = 1;
        let mut consumed: usize = 0;
        for (list, &i) in self.lists.iter().zip(&self.idx) {
            let Some(t) = total.checked_mul(list.len()) else {
                return (0, None);
            };
            total = t;
            consumed = consumed * list.len() + i;
        }
        let left = total - consumed;
        (left, Some(left))
    }
}
