//! Profile compilation: group merging, key inheritance, pattern expansion
//! and trie construction.
//!
//! The compiler reads the profile tree once, resolves `char_sets`, walks the
//! key-dependency graph leaves-first and materializes one immutable `Key`
//! per entry under `keys`. Everything here is deterministic: the same
//! profile always compiles to the same candidate bytes and weights.

mod patterns;

#[cfg(test)]
mod tests;

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::key::{Key, QueryError};
use crate::profile::{Profile, Value};
use crate::reps::{Replacement, ReplacementList};
use crate::trie::Trie;

/// The implicit parent of every key that does not name one.
const BASE_KEY: &str = "base";

/// Errors raised while compiling a profile. All of them are fatal: they
/// indicate a bug in the profile, not in the input words.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("bad entry at {at}: {reason}")]
    BadEntry { at: String, reason: String },

    #[error("key inheritance cycle through {0:?}")]
    KeyCycle(String),

    #[error("unknown group {group:?} referenced by {by}")]
    UnknownGroup { group: String, by: String },

    #[error("pattern {0:?} has overlapping capture groups")]
    PatternAmbiguous(String),
}

fn bad(at: impl Into<String>, reason: impl Into<String>) -> CompileError {
    CompileError::BadEntry {
        at: at.into(),
        reason: reason.into(),
    }
}

/// A merged character group: token to candidate list.
pub(crate) type Group = BTreeMap<String, ReplacementList>;

/// One member of a resolved char set: a Romanized token together with the
/// candidate list the alias's key stores for it.
pub(crate) struct SetMember {
    pub(crate) token: String,
    pub(crate) list: ReplacementList,
}

#[derive(Debug, Clone)]
enum Parent {
    /// No `base`/`parent` field: inherit from `base` when it exists.
    Default,
    /// Explicit null: no inheritance.
    None,
    Named(String),
}

#[derive(Debug, Clone)]
struct GroupRef {
    name: String,
    offset: i64,
}

#[derive(Debug, Clone)]
struct KeySpec {
    parent: Parent,
    suffix: bool,
    groups: Vec<GroupRef>,
}

#[derive(Debug, Clone)]
enum CharsSource {
    Group(String),
    Tokens(Vec<String>),
}

#[derive(Debug, Clone)]
struct CharSetDef {
    chars: CharsSource,
    key: String,
}

/// A compiled profile: the keyed collection of tokenizers plus whatever
/// top-level user data the profile carried along.
#[derive(Debug, Clone)]
pub struct Engine {
    keys: BTreeMap<String, Key>,
    user_data: BTreeMap<String, Value>,
}

impl Engine {
    /// Compile a profile tree into an immutable engine.
    pub fn from_profile(profile: &Profile) -> Result<Engine, CompileError> {
        Compiler::new(profile)?.run()
    }

    pub fn key(&self, name: &str) -> Result<&Key, QueryError> {
        self.keys
            .get(name)
            .ok_or_else(|| QueryError::UnknownKey(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Key> {
        self.keys.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.values()
    }

    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Top-level profile entries that are neither `keys`, `char_sets` nor a
    /// referenced character group, passed through unchanged.
    pub fn user_data(&self, name: &str) -> Option<&Value> {
        self.user_data.get(name)
    }

    /// Every compiled key reduced to `token -> [(weight, value)]` tables.
    pub fn simplify(&self) -> BTreeMap<String, BTreeMap<String, Vec<(i64, String)>>> {
        self.keys
            .iter()
            .map(|(name, key)| (name.clone(), key.simplify()))
            .collect()
    }
}

struct Compiler<'p> {
    profile: &'p Profile,
    specs: BTreeMap<String, KeySpec>,
    char_sets: BTreeMap<String, CharSetDef>,
    /// Alias text index for longest-match scanning of pattern LHSs.
    alias_trie: Trie<String>,
    /// Merged group per built key, kept for children and char-set lookups.
    groups: BTreeMap<String, Group>,
    keys: BTreeMap<String, Key>,
    /// Resolved char sets, cached on first use.
    resolved_sets: BTreeMap<String, Vec<SetMember>>,
    /// Top-level names consumed as character groups.
    referenced: BTreeSet<String>,
}

impl<'p> Compiler<'p> {
    fn new(profile: &'p Profile) -> Result<Self, CompileError> {
        let specs = parse_specs(profile)?;
        let (char_sets, alias_trie) = parse_char_sets(profile)?;
        Ok(Compiler {
            profile,
            specs,
            char_sets,
            alias_trie,
            groups: BTreeMap::new(),
            keys: BTreeMap::new(),
            resolved_sets: BTreeMap::new(),
            referenced: BTreeSet::new(),
        })
    }

    fn run(mut self) -> Result<Engine, CompileError> {
        for name in self.toposort()? {
            self.build_key(&name)?;
        }
        let mut user_data = BTreeMap::new();
        for (name, value) in self.profile.iter() {
            if name == "keys" || name == "char_sets" || self.referenced.contains(name) {
                continue;
            }
            user_data.insert(name.to_string(), value.clone());
        }
        Ok(Engine {
            keys: self.keys,
            user_data,
        })
    }

    /// The parent a key actually inherits from, after applying the implicit
    /// `base` rule.
    fn parent_of<'a>(&self, name: &str, spec: &'a KeySpec) -> Option<&'a str> {
        match &spec.parent {
            Parent::Named(p) => Some(p.as_str()),
            Parent::None => None,
            Parent::Default => {
                if name != BASE_KEY && self.specs.contains_key(BASE_KEY) {
                    Some(BASE_KEY)
                } else {
                    None
                }
            }
        }
    }

    /// Keys this key must be compiled after: its parent, plus the key of
    /// every char-set alias appearing in its pattern rules.
    fn deps(&self, name: &str, spec: &KeySpec) -> Result<Vec<String>, CompileError> {
        let mut deps = Vec::new();
        if let Some(parent) = self.parent_of(name, spec) {
            if !self.specs.contains_key(parent) {
                return Err(bad(
                    format!("key {name:?}"),
                    format!("parent key {parent:?} is not defined"),
                ));
            }
            deps.push(parent.to_string());
        }
        for gref in &spec.groups {
            let value = self.profile.get(&gref.name).ok_or_else(|| {
                CompileError::UnknownGroup {
                    group: gref.name.clone(),
                    by: format!("key {name:?}"),
                }
            })?;
            let entries = value.as_map().ok_or_else(|| {
                bad(
                    format!("group {:?}", gref.name),
                    format!("expected a map of token entries, found {}", value.kind()),
                )
            })?;
            for lhs in entries.keys() {
                for alias in patterns::aliases_in(lhs, &self.char_sets) {
                    let def = &self.char_sets[alias];
                    if !self.specs.contains_key(&def.key) {
                        return Err(bad(
                            format!("char_set {alias:?}"),
                            format!("key {:?} is not defined", def.key),
                        ));
                    }
                    deps.push(def.key.clone());
                }
            }
        }
        Ok(deps)
    }

    /// Leaves-first ordering of the key graph. Rejects cycles.
    fn toposort(&self) -> Result<Vec<String>, CompileError> {
        let mut order = Vec::with_capacity(self.specs.len());
        let mut state: BTreeMap<String, VisitState> = BTreeMap::new();
        for name in self.specs.keys() {
            self.visit(name, &mut state, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        state: &mut BTreeMap<String, VisitState>,
        order: &mut Vec<String>,
    ) -> Result<(), CompileError> {
        match state.get(name) {
            Some(VisitState::Open) => return Err(CompileError::KeyCycle(name.to_string())),
            Some(VisitState::Done) => return Ok(()),
            None => {}
        }
        state.insert(name.to_string(), VisitState::Open);
        let spec = &self.specs[name];
        for dep in self.deps(name, spec)? {
            self.visit(&dep, state, order)?;
        }
        state.insert(name.to_string(), VisitState::Done);
        order.push(name.to_string());
        Ok(())
    }

    fn build_key(&mut self, name: &str) -> Result<(), CompileError> {
        let profile = self.profile;
        let spec = self.specs[name].clone();

        let mut group: Group = match self.parent_of(name, &spec) {
            Some(parent) => self
                .groups
                .get(parent)
                .cloned()
                .ok_or_else(|| {
                    bad(
                        format!("key {name:?}"),
                        format!("parent key {parent:?} was not compiled first"),
                    )
                })?,
            None => Group::new(),
        };

        for gref in &spec.groups {
            let value = profile.get(&gref.name).ok_or_else(|| {
                CompileError::UnknownGroup {
                    group: gref.name.clone(),
                    by: format!("key {name:?}"),
                }
            })?;
            let entries = value.as_map().ok_or_else(|| {
                bad(
                    format!("group {:?}", gref.name),
                    format!("expected a map of token entries, found {}", value.kind()),
                )
            })?;
            self.referenced.insert(gref.name.clone());

            for (lhs, entry) in entries {
                if patterns::contains_alias(lhs, &self.char_sets) {
                    let blocks = patterns::scan(lhs, &self.alias_trie)?;
                    let aliases: Vec<String> = blocks
                        .iter()
                        .filter_map(|b| match b {
                            patterns::Block::Alias(a) => Some(a.clone()),
                            patterns::Block::Literal(_) => None,
                        })
                        .collect();
                    for alias in &aliases {
                        self.ensure_resolved(alias)?;
                    }
                    let templates = parse_entries(&format!("pattern {lhs:?}"), entry)?;
                    let generated =
                        patterns::expand(lhs, &blocks, &templates, &self.resolved_sets)?;
                    trace!(pattern = %lhs, rules = generated.len(), "expanded pattern rule");
                    for (gen_lhs, mut gen_list) in generated {
                        gen_list.add_weight(gref.offset);
                        merge_into(&mut group, gen_lhs, gen_list);
                    }
                } else {
                    let mut list = parse_entry_list(lhs, entry)?;
                    list.add_weight(gref.offset);
                    merge_into(&mut group, lhs.clone(), list);
                }
            }
        }

        debug!(key = %name, tokens = group.len(), suffix = spec.suffix, "compiled key");
        self.keys
            .insert(name.to_string(), Key::build(name.to_string(), spec.suffix, group.clone()));
        self.groups.insert(name.to_string(), group);
        Ok(())
    }

    /// Resolve a char-set alias to its member tokens and their candidate
    /// lists, drawn from the alias's (already compiled) key.
    fn ensure_resolved(&mut self, alias: &str) -> Result<(), CompileError> {
        if self.resolved_sets.contains_key(alias) {
            return Ok(());
        }
        let def = self
            .char_sets
            .get(alias)
            .cloned()
            .ok_or_else(|| bad(format!("char_set {alias:?}"), "alias is not declared"))?;

        let profile = self.profile;
        let tokens: Vec<String> = match &def.chars {
            CharsSource::Tokens(tokens) => tokens.clone(),
            CharsSource::Group(gname) => {
                let value = profile.get(gname).ok_or_else(|| {
                    CompileError::UnknownGroup {
                        group: gname.clone(),
                        by: format!("char_set {alias:?}"),
                    }
                })?;
                let map = value.as_map().ok_or_else(|| {
                    bad(
                        format!("char_set {alias:?}"),
                        format!("expected {gname:?} to be a map of token entries"),
                    )
                })?;
                self.referenced.insert(gname.clone());
                map.keys().cloned().collect()
            }
        };

        let key_group = self.groups.get(&def.key).ok_or_else(|| {
            bad(
                format!("char_set {alias:?}"),
                format!("key {:?} is not compiled", def.key),
            )
        })?;
        let mut members = Vec::with_capacity(tokens.len());
        for token in tokens {
            let list = key_group.get(&token).ok_or_else(|| {
                bad(
                    format!("char_set {alias:?}"),
                    format!("token {token:?} is not in key {:?}", def.key),
                )
            })?;
            let list = list.clone();
            members.push(SetMember { token, list });
        }
        self.resolved_sets.insert(alias.to_string(), members);
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum VisitState {
    Open,
    Done,
}

/// Union-merge one candidate list into a group: appended to the matching
/// list when the token is already present, inserted otherwise.
fn merge_into(group: &mut Group, token: String, list: ReplacementList) {
    match group.entry(token) {
        Entry::Occupied(mut slot) => slot.get_mut().extend(list),
        Entry::Vacant(slot) => {
            slot.insert(list);
        }
    }
}

/// Normalize one author-supplied entry into `(weight, text)` pairs: a bare
/// string is weight 0, a sequence weights its elements positionally, an
/// `[integer, string]` pair sets the weight explicitly.
fn parse_entries(at: &str, entry: &Value) -> Result<Vec<(i64, String)>, CompileError> {
    fn pair(at: &str, items: &[Value]) -> Result<(i64, String), CompileError> {
        match items {
            [Value::Int(w), Value::Str(v)] => Ok((*w, v.clone())),
            _ => Err(bad(at, "expected an [integer, string] pair")),
        }
    }

    match entry {
        Value::Str(s) => Ok(vec![(0, s.clone())]),
        Value::Seq(items) if matches!(items.first(), Some(Value::Int(_))) => {
            Ok(vec![pair(at, items)?])
        }
        Value::Seq(items) => {
            if items.is_empty() {
                return Err(bad(at, "empty entry sequence"));
            }
            items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Str(s) => Ok((i as i64, s.clone())),
                    Value::Seq(p) => pair(at, p),
                    other => Err(bad(
                        at,
                        format!("unsupported entry element of type {}", other.kind()),
                    )),
                })
                .collect()
        }
        other => Err(bad(at, format!("unsupported entry of type {}", other.kind()))),
    }
}

fn parse_entry_list(token: &str, entry: &Value) -> Result<ReplacementList, CompileError> {
    let mut list = ReplacementList::new(token);
    for (weight, text) in parse_entries(&format!("token {token:?}"), entry)? {
        list.push(Replacement::new(weight, text, token));
    }
    Ok(list)
}

fn parse_specs(profile: &Profile) -> Result<BTreeMap<String, KeySpec>, CompileError> {
    let Some(value) = profile.get("keys") else {
        return Ok(BTreeMap::new());
    };
    let map = value
        .as_map()
        .ok_or_else(|| bad("keys", format!("expected a map, found {}", value.kind())))?;
    map.iter()
        .map(|(name, spec)| Ok((name.clone(), parse_key_spec(name, spec)?)))
        .collect()
}

fn parse_key_spec(name: &str, value: &Value) -> Result<KeySpec, CompileError> {
    let at = format!("key {name:?}");
    match value {
        Value::Str(group) => Ok(KeySpec {
            parent: Parent::Default,
            suffix: false,
            groups: vec![GroupRef {
                name: group.clone(),
                offset: 0,
            }],
        }),
        Value::Seq(items) => Ok(KeySpec {
            parent: Parent::Default,
            suffix: false,
            groups: parse_group_refs(&at, items)?,
        }),
        Value::Map(fields) => {
            let groups = match fields.get("groups") {
                None => Vec::new(),
                Some(Value::Str(group)) => vec![GroupRef {
                    name: group.clone(),
                    offset: 0,
                }],
                Some(Value::Seq(items)) => parse_group_refs(&at, items)?,
                Some(other) => {
                    return Err(bad(
                        &at,
                        format!("`groups` must be a name or sequence, found {}", other.kind()),
                    ))
                }
            };
            let parent = match fields.get("parent").or_else(|| fields.get("base")) {
                None => Parent::Default,
                Some(Value::Null) => Parent::None,
                Some(Value::Str(parent)) => Parent::Named(parent.clone()),
                Some(other) => {
                    return Err(bad(
                        &at,
                        format!("`parent` must be a key name or null, found {}", other.kind()),
                    ))
                }
            };
            let suffix = match fields.get("suffix") {
                None => false,
                Some(Value::Bool(b)) => *b,
                Some(other) => {
                    return Err(bad(
                        &at,
                        format!("`suffix` must be a boolean, found {}", other.kind()),
                    ))
                }
            };
            Ok(KeySpec {
                parent,
                suffix,
                groups,
            })
        }
        other => Err(bad(
            &at,
            format!("expected a group list or key map, found {}", other.kind()),
        )),
    }
}

fn parse_group_refs(at: &str, items: &[Value]) -> Result<Vec<GroupRef>, CompileError> {
    let mut refs = Vec::new();
    for item in items {
        match item {
            Value::Str(name) => refs.push(GroupRef {
                name: name.clone(),
                offset: 0,
            }),
            Value::Map(entries) => {
                for (name, offset) in entries {
                    let offset = offset.as_int().ok_or_else(|| {
                        bad(
                            at,
                            format!("weight offset for group {name:?} must be an integer"),
                        )
                    })?;
                    refs.push(GroupRef {
                        name: name.clone(),
                        offset,
                    });
                }
            }
            other => {
                return Err(bad(
                    at,
                    format!(
                        "group reference must be a name or {{name: offset}}, found {}",
                        other.kind()
                    ),
                ))
            }
        }
    }
    Ok(refs)
}

fn parse_char_sets(
    profile: &Profile,
) -> Result<(BTreeMap<String, CharSetDef>, Trie<String>), CompileError> {
    let mut defs = BTreeMap::new();
    let mut trie = Trie::new();
    if let Some(value) = profile.get("char_sets") {
        let map = value
            .as_map()
            .ok_or_else(|| bad("char_sets", format!("expected a map, found {}", value.kind())))?;
        for (alias, def) in map {
            defs.insert(alias.clone(), parse_char_set(alias, def)?);
            trie.insert(alias, alias.clone());
        }
    }
    Ok((defs, trie))
}

fn parse_char_set(alias: &str, value: &Value) -> Result<CharSetDef, CompileError> {
    let at = format!("char_set {alias:?}");
    match value {
        Value::Str(group) => Ok(CharSetDef {
            chars: CharsSource::Group(group.clone()),
            key: BASE_KEY.to_string(),
        }),
        Value::Map(fields) => {
            let chars = match fields.get("chars") {
                Some(Value::Str(group)) => CharsSource::Group(group.clone()),
                Some(Value::Seq(items)) => {
                    let tokens = items
                        .iter()
                        .map(|item| {
                            item.as_str().map(str::to_string).ok_or_else(|| {
                                bad(&at, format!("`chars` element must be a string, found {}", item.kind()))
                            })
                        })
                        .collect::<Result<Vec<String>, CompileError>>()?;
                    CharsSource::Tokens(tokens)
                }
                Some(other) => {
                    return Err(bad(
                        &at,
                        format!(
                            "`chars` must be a group name or token list, found {}",
                            other.kind()
                        ),
                    ))
                }
                None => return Err(bad(&at, "missing `chars` field")),
            };
            let key = match fields.get("key") {
                None => BASE_KEY.to_string(),
                Some(Value::Str(key)) => key.clone(),
                Some(other) => {
                    return Err(bad(
                        &at,
                        format!("`key` must be a key name, found {}", other.kind()),
                    ))
                }
            };
            Ok(CharSetDef { chars, key })
        }
        other => Err(bad(
            &at,
            format!("expected a group name or {{chars, key}} map, found {}", other.kind()),
        )),
    }
}
