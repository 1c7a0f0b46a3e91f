//! Compile-time expansion of pattern rules over character-class aliases.
//!
//! A rule like `FiCC: ['\1\2\3', '\1י\2\3']` generates one concrete entry
//! per combination of member tokens: the LHS aliases are replaced by the
//! tokens themselves, the RHS `\N` references by the captured candidates.
//! The runtime never sees a capture; only the generated entries survive.

use std::collections::BTreeMap;

use super::{CharSetDef, CompileError, SetMember};
use crate::reps::{add_rlists, Replacement, ReplacementList};
use crate::trie::Trie;

/// One scanned segment of a pattern LHS.
pub(super) enum Block {
    /// A single literal character.
    Literal(String),
    /// A char-set alias; each one is a capture group, numbered 1-based in
    /// scan order.
    Alias(String),
}

/// One parsed segment of an RHS template.
enum TmplItem {
    /// A single literal character (or an empty padding segment).
    Literal(String),
    /// A `\N` back-reference to a capture group.
    Ref(usize),
}

/// Whether any declared alias occurs in this LHS, making it a pattern rule.
pub(super) fn contains_alias(lhs: &str, sets: &BTreeMap<String, CharSetDef>) -> bool {
    sets.keys().any(|alias| lhs.contains(alias.as_str()))
}

/// The aliases occurring anywhere in this LHS, for dependency collection.
pub(super) fn aliases_in<'a>(lhs: &str, sets: &'a BTreeMap<String, CharSetDef>) -> Vec<&'a str> {
    sets.keys()
        .filter(|alias| lhs.contains(alias.as_str()))
        .map(String::as_str)
        .collect()
}

/// Tokenize a pattern LHS into literal characters and alias captures,
/// preferring the longest alias at each position. An alias match that
/// starts inside the span of the previous match and runs past its end
/// would claim an overlapping capture, which is rejected.
pub(super) fn scan(lhs: &str, aliases: &Trie<String>) -> Result<Vec<Block>, CompileError> {
    let mut blocks = Vec::new();
    let mut rest = lhs;
    while !rest.is_empty() {
        match aliases.getpart(rest) {
            Some((name, remainder)) => {
                let len = rest.len() - remainder.len();
                for (i, _) in rest.char_indices() {
                    if i == 0 {
                        continue;
                    }
                    if i >= len {
                        break;
                    }
                    if let Some((_, r2)) = aliases.getpart(&rest[i..]) {
                        if rest.len() - r2.len() > len {
                            return Err(CompileError::PatternAmbiguous(lhs.to_string()));
                        }
                    }
                }
                blocks.push(Block::Alias(name.clone()));
                rest = remainder;
            }
            None => {
                let mut chars = rest.chars();
                let Some(ch) = chars.next() else { break };
                blocks.push(Block::Literal(ch.to_string()));
                rest = chars.as_str();
            }
        }
    }
    Ok(blocks)
}

/// Parse a template into per-character items. `\N` is a capture reference,
/// `\\N` escapes to the literal text `\N`.
fn parse_template(template: &str) -> Vec<TmplItem> {
    let chars: Vec<char> = template.chars().collect();
    let mut items = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 2 < chars.len() && chars[i + 1] == '\\' && chars[i + 2].is_ascii_digit()
        {
            items.push(TmplItem::Literal(format!("\\{}", chars[i + 2])));
            i += 3;
        } else if chars[i] == '\\' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
            items.push(TmplItem::Ref(chars[i + 1] as usize - '0' as usize));
            i += 2;
        } else {
            items.push(TmplItem::Literal(chars[i].to_string()));
            i += 1;
        }
    }
    items
}

/// Align templates of differing lengths: wherever the longest template has
/// a literal, shorter templates that carry a reference at that position get
/// an empty literal inserted. This keeps every template's segments aligned
/// with the LHS blocks, so provenance still concatenates to the generated
/// LHS.
fn normalize_templates(templates: &mut [(i64, Vec<TmplItem>)]) {
    let Some(max_len) = templates.iter().map(|(_, t)| t.len()).max() else {
        return;
    };
    if templates.iter().all(|(_, t)| t.len() == max_len) {
        return;
    }
    let longest: Vec<bool> = match templates.iter().find(|(_, t)| t.len() == max_len) {
        Some((_, items)) => items
            .iter()
            .map(|item| matches!(item, TmplItem::Literal(_)))
            .collect(),
        None => return,
    };
    for (j, is_literal) in longest.iter().enumerate() {
        if !is_literal {
            continue;
        }
        for (_, items) in templates.iter_mut() {
            if items.len() < max_len && matches!(items.get(j), Some(TmplItem::Ref(_))) {
                items.insert(j, TmplItem::Literal(String::new()));
            }
        }
    }
}

/// Expand one pattern rule into concrete `(token, list)` entries: the full
/// cross-product over every capture's member tokens, times the RHS
/// templates, times each captured member's own candidates. Entry weights
/// are the template weight plus the captured candidates' weights.
pub(super) fn expand(
    lhs: &str,
    blocks: &[Block],
    templates: &[(i64, String)],
    sets: &BTreeMap<String, Vec<SetMember>>,
) -> Result<Vec<(String, ReplacementList)>, CompileError> {
    let mut parsed: Vec<(i64, Vec<TmplItem>)> = templates
        .iter()
        .map(|(weight, template)| (*weight, parse_template(template)))
        .collect();
    normalize_templates(&mut parsed);

    let captures: Vec<&str> = blocks
        .iter()
        .filter_map(|block| match block {
            Block::Alias(alias) => Some(alias.as_str()),
            Block::Literal(_) => None,
        })
        .collect();
    let members: Vec<&[SetMember]> = captures
        .iter()
        .map(|alias| {
            sets.get(*alias).map(Vec::as_slice).ok_or_else(|| {
                CompileError::BadEntry {
                    at: format!("pattern {lhs:?}"),
                    reason: format!("char set {alias:?} is not resolved"),
                }
            })
        })
        .collect::<Result<_, _>>()?;

    let mut out = Vec::new();
    if members.iter().any(|m| m.is_empty()) {
        return Ok(out);
    }

    let mut idx = vec![0usize; captures.len()];
    loop {
        let mut gen_key = String::new();
        let mut capture = 0;
        for block in blocks {
            match block {
                Block::Literal(text) => gen_key.push_str(text),
                Block::Alias(_) => {
                    gen_key.push_str(&members[capture][idx[capture]].token);
                    capture += 1;
                }
            }
        }

        let mut list = ReplacementList::new(gen_key.clone());
        for (template_weight, items) in &parsed {
            let mut segments: Vec<ReplacementList> = Vec::with_capacity(items.len());
            for (j, item) in items.iter().enumerate() {
                match item {
                    TmplItem::Ref(n) => {
                        if *n == 0 || *n > captures.len() {
                            return Err(CompileError::BadEntry {
                                at: format!("pattern {lhs:?}"),
                                reason: format!("\\{n} does not refer to a capture group"),
                            });
                        }
                        segments.push(members[n - 1][idx[n - 1]].list.clone());
                    }
                    TmplItem::Literal(text) => {
                        // provenance comes from the aligned LHS literal
                        let key = match blocks.get(j) {
                            Some(Block::Literal(c)) => c.as_str(),
                            _ => "",
                        };
                        let mut segment = ReplacementList::new(key);
                        segment.push(Replacement::new(0, text.clone(), key));
                        segments.push(segment);
                    }
                }
            }
            let mut product =
                add_rlists(&segments).unwrap_or_else(|_| ReplacementList::empty());
            product.add_weight(*template_weight);
            list.extend(product);
        }
        out.push((gen_key, list));

        let mut pos = idx.len();
        loop {
            if pos == 0 {
                return Ok(out);
            }
            pos -= 1;
            idx[pos] += 1;
            if idx[pos] < members[pos].len() {
                break;
            }
            idx[pos] = 0;
        }
    }
}
