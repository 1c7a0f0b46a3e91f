use crate::compiler::Engine;
use crate::profile::Profile;

mod patterns;

pub(crate) fn build(yaml: &str) -> Engine {
    let profile: Profile = serde_yaml::from_str(yaml).unwrap();
    Engine::from_profile(&profile).unwrap()
}

/// A cut-down Hebrew profile covering inheritance, suffix keys and
/// weighted groups.
pub(crate) const HEBREW: &str = r#"
consonants:
  b: ב
  d: ד
  g: ג
  h: ה
  k: כ
  l: ל
  m: מ
  n: נ
  p: פ
  r: ר
  s: ס
  sh: ש
  t: ת
vowels:
  a: ''
  e: ''
  i: י
  o: [ו, '']
  u: ו
infrequent:
  o: א
final:
  m: ם
  n: ן
keys:
  base:
    - consonants
    - vowels
    - infrequent: 15
  front:
    groups: []
  mid:
    groups: []
  end:
    parent: null
    groups: [final]
    suffix: true
metadata:
  script: hebrew
"#;
