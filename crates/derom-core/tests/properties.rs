//! Property-based tests for the replacement-list algebra and the greedy
//! tokenizers: associativity, identity, ordering and coverage invariants
//! over generated inputs.

use proptest::prelude::*;

use derom_core::{add_rlists, combinations, Engine, Profile, Replacement, ReplacementList};

fn arb_replacement() -> impl Strategy<Value = Replacement> {
    (
        0i64..50,
        prop::sample::select(vec!["א", "ב", "ג", "ש", ""]),
        prop::sample::select(vec!["a", "b", "sh", "o"]),
    )
        .prop_map(|(weight, value, key)| Replacement::new(weight, value, key))
}

fn arb_rlist() -> impl Strategy<Value = ReplacementList> {
    (
        prop::sample::select(vec!["a", "b", "sh", "o"]),
        prop::collection::vec(arb_replacement(), 1..4),
    )
        .prop_map(|(key, reps)| ReplacementList::from_reps(key, reps))
}

proptest! {
    #[test]
    fn addition_is_associative(a in arb_rlist(), b in arb_rlist(), c in arb_rlist()) {
        prop_assert_eq!(&(&a + &b) + &c, &a + &(&b + &c));
    }

    #[test]
    fn empty_list_is_identity(a in arb_rlist()) {
        let id = ReplacementList::empty();
        prop_assert_eq!(&id + &a, a.clone());
        prop_assert_eq!(&a + &id, a);
    }

    #[test]
    fn reduce_matches_fold(lists in prop::collection::vec(arb_rlist(), 1..4)) {
        let reduced = add_rlists(&lists).unwrap();
        let folded = lists[1..]
            .iter()
            .fold(lists[0].clone(), |acc, next| &acc + next);
        prop_assert_eq!(reduced, folded);
    }

    #[test]
    fn lazy_combinations_match_reduce(lists in prop::collection::vec(arb_rlist(), 1..4)) {
        let combos = combinations(&lists).unwrap();
        let reduced = add_rlists(&lists).unwrap();
        prop_assert_eq!(combos.key(), reduced.key());
        let lazy: Vec<Replacement> = combos.collect();
        let eager: Vec<Replacement> = add_rlists(&lists).unwrap().into_iter().collect();
        prop_assert_eq!(lazy, eager);
    }

    #[test]
    fn sort_is_stable_and_idempotent(mut a in arb_rlist()) {
        a.sort();
        let weights: Vec<i64> = a.iter().map(Replacement::weight).collect();
        prop_assert!(weights.windows(2).all(|w| w[0] <= w[1]));
        let once = a.clone();
        a.sort();
        prop_assert_eq!(a, once);
    }

    #[test]
    fn makestat_is_a_distribution(a in arb_rlist()) {
        let stats = a.makestat();
        prop_assert_eq!(stats.len(), a.len());
        prop_assert!(stats.iter().all(|(p, _)| *p >= 0.0));
        let total: f64 = stats.iter().map(|(p, _)| p).sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn provenance_concatenates(a in arb_rlist(), b in arb_rlist()) {
        let sum = &a + &b;
        let expected_key = format!("{}{}", a.key(), b.key());
        prop_assert_eq!(sum.key(), expected_key.as_str());
        for rep in &sum {
            let from_pairs: String = rep.keyvalue().iter().map(|(k, _)| k.as_str()).collect();
            prop_assert_eq!(from_pairs, rep.key());
        }
    }
}

const PROFILE: &str = r#"
consonants:
  l: ל
  m: מ
  s: ס
  sh: ש
vowels:
  a: ''
  o: [ו, '']
keys:
  base:
    groups: [consonants, vowels]
  back:
    suffix: true
"#;

fn tokens() -> Vec<&'static str> {
    vec!["l", "m", "s", "sh", "a", "o"]
}

proptest! {
    #[test]
    fn tokenizer_covers_its_own_words(
        picks in prop::collection::vec(prop::sample::select(tokens()), 1..8)
    ) {
        let profile: Profile = serde_yaml::from_str(PROFILE).unwrap();
        let engine = Engine::from_profile(&profile).unwrap();
        let word: String = picks.concat();
        for name in ["base", "back"] {
            let key = engine.key(name).unwrap();
            let parts = key.getallparts(&word).unwrap();
            let covered: String = parts.iter().map(|p| p.key()).collect();
            prop_assert_eq!(&covered, &word, "key {}", name);
        }
    }

    #[test]
    fn getpart_is_greedy(
        picks in prop::collection::vec(prop::sample::select(tokens()), 1..6)
    ) {
        let profile: Profile = serde_yaml::from_str(PROFILE).unwrap();
        let engine = Engine::from_profile(&profile).unwrap();
        let word: String = picks.concat();
        let key = engine.key("base").unwrap();
        let (list, rest) = key.getpart(&word).unwrap();
        // no strictly longer prefix of the word is a stored token
        let mut end = list.key().len();
        for ch in rest.chars() {
            end += ch.len_utf8();
            let longer = &word[..end];
            prop_assert!(key.get(longer).is_err(), "longer token {:?} exists", longer);
        }
    }
}
