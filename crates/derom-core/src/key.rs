//! Compiled tokenizer keys and the query-side error type.
//!
//! A `Key` is built once by the profile compiler and read-only afterwards.
//! Candidate lists live in a contiguous arena; the trie and the exact-token
//! index both refer to them by slot, so nothing is stored twice.

use std::collections::BTreeMap;

use crate::reps::ReplacementList;
use crate::trie::Trie;

/// Errors surfaced while querying compiled keys. These are expected control
/// flow for decoders: the front/mid/end strategy catches `NoMatch` at its
/// fallback points.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("no key named {0:?} in this profile")]
    UnknownKey(String),

    #[error("token {token:?} is not in key {key:?}")]
    NoSuchToken { key: String, token: String },

    #[error("cannot tokenize {input:?} with key {key:?}")]
    NoMatch { key: String, input: String },

    #[error("cannot reduce an empty sequence of replacement lists")]
    EmptyReduction,
}

/// A named greedy tokenizer over a merged character group.
#[derive(Debug, Clone)]
pub struct Key {
    name: String,
    suffix: bool,
    lists: Vec<ReplacementList>,
    index: BTreeMap<String, usize>,
    trie: Trie<usize>,
}

impl Key {
    pub(crate) fn build(
        name: String,
        suffix: bool,
        group: BTreeMap<String, ReplacementList>,
    ) -> Self {
        let mut lists = Vec::with_capacity(group.len());
        let mut index = BTreeMap::new();
        let mut trie = Trie::new();
        for (token, list) in group {
            let slot = lists.len();
            if suffix {
                trie.insert_rev(&token, slot);
            } else {
                trie.insert(&token, slot);
            }
            index.insert(token, slot);
            lists.push(list);
        }
        Key {
            name,
            suffix,
            lists,
            index,
            trie,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this key matches from the end of the input toward the front.
    pub fn is_suffix(&self) -> bool {
        self.suffix
    }

    /// Number of Romanized tokens this key knows.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Exact lookup of the list stored for `token`.
    pub fn get(&self, token: &str) -> Result<&ReplacementList, QueryError> {
        self.index
            .get(token)
            .map(|&slot| &self.lists[slot])
            .ok_or_else(|| QueryError::NoSuchToken {
                key: self.name.clone(),
                token: token.to_string(),
            })
    }

    /// One greedy tokenization step: the list for the longest matching
    /// token, plus the unconsumed rest of `word`. Suffix keys match at the
    /// end of the word and return the unconsumed front.
    pub fn getpart<'a>(&self, word: &'a str) -> Result<(&ReplacementList, &'a str), QueryError> {
        let hit = if self.suffix {
            self.trie.getpart_back(word)
        } else {
            self.trie.getpart(word)
        };
        hit.map(|(&slot, rest)| (&self.lists[slot], rest))
            .ok_or_else(|| QueryError::NoMatch {
                key: self.name.clone(),
                input: word.to_string(),
            })
    }

    /// Repeated `getpart` until the word is exhausted. The parts come back
    /// in left-to-right order for both prefix and suffix keys, so their keys
    /// concatenate to `word`.
    pub fn getallparts(&self, word: &str) -> Result<Vec<&ReplacementList>, QueryError> {
        let mut parts = Vec::new();
        let mut rest = word;
        while !rest.is_empty() {
            let (list, remainder) = self.getpart(rest)?;
            parts.push(list);
            rest = remainder;
        }
        if self.suffix {
            parts.reverse();
        }
        Ok(parts)
    }

    /// The compiled table as `token -> [(weight, value)]` pairs: a tree that
    /// is itself a valid character group, usable for caching or diffing.
    pub fn simplify(&self) -> BTreeMap<String, Vec<(i64, String)>> {
        self.index
            .iter()
            .map(|(token, &slot)| (token.clone(), self.lists[slot].simplify()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reps::Replacement;

    fn group(entries: &[(&str, &[(i64, &str)])]) -> BTreeMap<String, ReplacementList> {
        entries
            .iter()
            .map(|(token, reps)| {
                let mut list = ReplacementList::new(*token);
                for (w, v) in reps.iter() {
                    list.push(Replacement::new(*w, *v, *token));
                }
                (token.to_string(), list)
            })
            .collect()
    }

    fn base_key(suffix: bool) -> Key {
        let group = group(&[
            ("sh", &[(0, "ש")]),
            ("a", &[(0, "")]),
            ("l", &[(0, "ל")]),
            ("o", &[(0, "ו"), (1, "")]),
            ("m", &[(0, "מ")]),
        ]);
        Key::build("base".into(), suffix, group)
    }

    #[test]
    fn test_get_exact() {
        let key = base_key(false);
        assert_eq!(key.get("sh").unwrap().simplify(), [(0, "ש".to_string())]);
        let err = key.get("q").unwrap_err();
        assert!(matches!(err, QueryError::NoSuchToken { .. }));
        // 's' is a trie path but not a token
        assert!(key.get("s").is_err());
    }

    #[test]
    fn test_getpart_prefix() {
        let key = base_key(false);
        let (list, rest) = key.getpart("shalom").unwrap();
        assert_eq!(list.key(), "sh");
        assert_eq!(rest, "alom");
        let err = key.getpart("xalom").unwrap_err();
        assert!(matches!(err, QueryError::NoMatch { .. }));
    }

    #[test]
    fn test_getpart_suffix() {
        let key = base_key(true);
        let (list, rest) = key.getpart("shalom").unwrap();
        assert_eq!(list.key(), "m");
        assert_eq!(rest, "shalo");
    }

    #[test]
    fn test_getallparts_coverage() {
        for suffix in [false, true] {
            let key = base_key(suffix);
            let parts = key.getallparts("shalom").unwrap();
            let keys: Vec<&str> = parts.iter().map(|p| p.key()).collect();
            assert_eq!(keys, ["sh", "a", "l", "o", "m"], "suffix={suffix}");
            assert_eq!(keys.concat(), "shalom");
        }
    }

    #[test]
    fn test_getallparts_partial_failure() {
        let key = base_key(false);
        let err = key.getallparts("shaxom").unwrap_err();
        assert!(matches!(err, QueryError::NoMatch { .. }));
    }
}
