//! Whole-word decode strategies built on compiled keys.
//!
//! `front_mid_end` is the canonical three-key strategy: ending clusters
//! first, then beginning clusters, then whatever is left in the middle.
//! `NoMatch` is expected control flow here; the fallback path re-reads the
//! word front-first when the front key cannot continue after an ending
//! match.

use tracing::trace;

use crate::compiler::Engine;
use crate::key::{Key, QueryError};
use crate::reps::{add_rlists, Replacement, ReplacementList};

/// Decode a word with the `front`, `mid` and `end` keys of this engine.
///
/// The ending is matched first; if the rest yields to the front key, the
/// middle is tokenized greedily and the three parts are combined. When the
/// front key cannot continue after the ending match, the word is re-read
/// front-first. A word whose ending matches nothing propagates `NoMatch`
/// directly, as does total failure of the fallback.
pub fn front_mid_end(engine: &Engine, word: &str) -> Result<ReplacementList, QueryError> {
    let end = engine.key("end")?;
    let front = engine.key("front")?;

    let (tail, rest) = end.getpart(word)?;
    if rest.is_empty() {
        return Ok(tail.clone());
    }
    match front.getpart(rest) {
        Ok((head, rest)) => {
            if rest.is_empty() {
                return Ok(head + tail);
            }
            let middle = middle_part(engine, rest)?;
            Ok(&(head + &middle) + tail)
        }
        Err(_) => {
            trace!(word, "front key failed after end match, retrying front-first");
            no_end(engine, front, end, word)
        }
    }
}

/// Front-first fallback: where words go when reading the ending first
/// produces nothing usable.
fn no_end(
    engine: &Engine,
    front: &Key,
    end: &Key,
    word: &str,
) -> Result<ReplacementList, QueryError> {
    let (head, rest) = front.getpart(word)?;
    if rest.is_empty() {
        return Ok(head.clone());
    }
    let (tail, rest) = end.getpart(rest)?;
    if rest.is_empty() {
        return Ok(head + tail);
    }
    let middle = middle_part(engine, rest)?;
    Ok(&(head + &middle) + tail)
}

fn middle_part(engine: &Engine, rest: &str) -> Result<ReplacementList, QueryError> {
    let mid = engine.key("mid")?;
    add_rlists(mid.getallparts(rest)?)
}

/// The identity decode: the word rendered as itself, at weight zero.
/// Callers use this for tokens that should pass through unchanged.
pub fn self_rep(word: &str) -> ReplacementList {
    ReplacementList::from_reps(word, vec![Replacement::new(0, word, word)])
}

/// Greedy tokenization with each part's weights converted to normalized
/// probabilities.
pub fn stat_parts(key: &Key, word: &str) -> Result<Vec<(String, Vec<(f64, String)>)>, QueryError> {
    Ok(key
        .getallparts(word)?
        .into_iter()
        .map(|part| (part.key().to_string(), part.makestat()))
        .collect())
}
