use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use derom_core::{add_rlists, decode, Engine, Profile};

const PROFILE: &str = r#"
consonants:
  b: ב
  d: ד
  g: ג
  h: ה
  k: כ
  l: ל
  m: מ
  n: נ
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
final:
  m: ם
  n: ן
beginning patterns:
  'FiCC': ['\1\2\3', '\1י\2\3']
keys:
  base:
    groups: [consonants, vowels]
  front:
    groups: ['beginning patterns']
  mid:
    groups: []
  end:
    parent: null
    groups: [final]
    suffix: true
char_sets:
  C:
    chars: consonants
    key: base
  F:
    chars: [b, d, g, k]
    key: base
"#;

fn bench_engine() -> Engine {
    let profile: Profile = serde_yaml::from_str(PROFILE).unwrap();
    Engine::from_profile(&profile).unwrap()
}

static INPUTS: &[(&str, &str)] = &[
    ("short", "dag"),
    ("medium", "shalom"),
    ("long", "shalomshalomshalom"),
];

fn bench_compile(c: &mut Criterion) {
    let profile: Profile = serde_yaml::from_str(PROFILE).unwrap();
    c.bench_function("compile/hebrew", |b| {
        b.iter(|| Engine::from_profile(&profile).unwrap());
    });
}

fn bench_getallparts(c: &mut Criterion) {
    let engine = bench_engine();
    let base = engine.key("base").unwrap();
    let mut group = c.benchmark_group("decode/getallparts");
    for &(label, word) in INPUTS {
        group.bench_with_input(BenchmarkId::new(label, word.len()), &word, |b, &word| {
            b.iter(|| add_rlists(base.getallparts(word).unwrap()).unwrap());
        });
    }
    group.finish();
}

fn bench_front_mid_end(c: &mut Criterion) {
    let engine = bench_engine();
    let mut group = c.benchmark_group("decode/front_mid_end");
    for &(label, word) in INPUTS {
        group.bench_with_input(BenchmarkId::new(label, word.len()), &word, |b, &word| {
            b.iter(|| decode::front_mid_end(&engine, word).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_getallparts, bench_front_mid_end);
criterion_main!(benches);
