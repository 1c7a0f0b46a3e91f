use super::build;

const PATTERNS: &str = r#"
consonants:
  b: ב
  d: ד
  g: ג
  k: [כ, ק]
vowels:
  a: ''
  i: י
beginning patterns:
  'FiCC': ['\1\2\3', '\1י\2\3']
mid patterns:
  'FiC': ['\1י\2', [7, '\1\2']]
keys:
  base:
    groups: [consonants, vowels]
  front:
    groups: ['beginning patterns']
  mid:
    groups: ['mid patterns']
char_sets:
  C:
    chars: consonants
    key: base
  F:
    chars: [b, k]
    key: base
"#;

#[test]
fn test_generated_token_count() {
    let engine = build(PATTERNS);
    let base = engine.key("base").unwrap();
    let front = engine.key("front").unwrap();
    // 2 F-members x 4 consonants x 4 consonants on top of the inherited base
    assert_eq!(front.len(), base.len() + 2 * 4 * 4);
    assert!(front.get("bibd").is_ok());
    assert!(front.get("kigg").is_ok());
    // aliases never survive into the compiled key
    assert!(front.get("FiCC").is_err());
}

#[test]
fn test_template_cross_product() {
    let engine = build(PATTERNS);
    let front = engine.key("front").unwrap();
    assert_eq!(
        front.get("bibd").unwrap().simplify(),
        [(0, "בבד".to_string()), (1, "ביבד".to_string())]
    );
}

#[test]
fn test_capture_weights_add() {
    let engine = build(PATTERNS);
    let front = engine.key("front").unwrap();
    // k carries two candidates (כ at 0, ק at 1); template order first,
    // combination order within each template
    assert_eq!(
        front.get("kibd").unwrap().simplify(),
        [
            (0, "כבד".to_string()),
            (1, "קבד".to_string()),
            (1, "כיבד".to_string()),
            (2, "קיבד".to_string()),
        ]
    );
}

#[test]
fn test_generated_provenance() {
    let engine = build(PATTERNS);
    let front = engine.key("front").unwrap();
    let list = front.get("kibd").unwrap();
    let rep = &list[0];
    assert_eq!(
        rep.keyvalue(),
        [
            ("k".to_string(), "כ".to_string()),
            ("i".to_string(), "".to_string()),
            ("b".to_string(), "ב".to_string()),
            ("d".to_string(), "ד".to_string()),
        ]
    );
    assert_eq!(rep.key(), "kibd");
    assert_eq!(rep.value(), "כבד");
}

#[test]
fn test_explicit_template_weight() {
    let engine = build(PATTERNS);
    let mid = engine.key("mid").unwrap();
    assert_eq!(
        mid.get("bid").unwrap().simplify(),
        [(0, "ביד".to_string()), (7, "בד".to_string())]
    );
}

#[test]
fn test_tokenization_of_generated_rules() {
    let engine = build(PATTERNS);
    let front = engine.key("front").unwrap();
    // longest match: the generated four-character token beats b + i + ...
    let (list, rest) = front.getpart("bibda").unwrap();
    assert_eq!(list.key(), "bibd");
    assert_eq!(rest, "a");
}

#[test]
fn test_pattern_offset_applies_to_generated() {
    let engine = build(
        r#"
consonants:
  b: ב
  d: ד
vowels:
  i: י
pats:
  'Ci': ['\1\2']
keys:
  base:
    groups: [consonants, vowels]
  front:
    groups:
      - pats: 5
char_sets:
  C:
    chars: consonants
    key: base
"#,
    );
    let front = engine.key("front").unwrap();
    assert_eq!(front.get("bi").unwrap().simplify(), [(5, "בי".to_string())]);
}
