//! Reverse-transliteration key engine.
//!
//! Compiles a declarative profile into greedy tokenizers ("keys") and
//! combines per-token candidates into ranked whole-word spellings through a
//! weighted replacement-list algebra. Weights are ordinal hints from the
//! profile author: smaller means more likely, and they add up when segments
//! concatenate.

pub mod compiler;
pub mod decode;
pub mod key;
pub mod profile;
pub mod reps;
pub mod trie;

pub use compiler::{CompileError, Engine};
pub use key::{Key, QueryError};
pub use profile::{Profile, Value};
pub use reps::{add_rlists, combinations, Combinations, Replacement, ReplacementList};
