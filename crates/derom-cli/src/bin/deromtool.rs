use std::fs;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use derom_cli::config::Config;
use derom_core::{add_rlists, decode, Engine, Profile, ReplacementList};

#[derive(Parser)]
#[command(name = "deromtool", about = "Deromanization profile diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode Romanized words into ranked original-script candidates
    Decode {
        /// Path to the profile YAML, or a schema name from the user config
        profile: String,
        /// Words to decode
        words: Vec<String>,
        /// Decode with a single key instead of the front/mid/end strategy
        #[arg(long)]
        key: Option<String>,
        /// Show normalized probabilities instead of raw weights
        #[arg(long)]
        stats: bool,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the keys of a compiled profile
    Inspect {
        /// Path to the profile YAML, or a schema name from the user config
        profile: String,
        /// Dump one key's full token table
        #[arg(long)]
        key: Option<String>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Compile a profile and report its shape
    Check {
        /// Path to the profile YAML, or a schema name from the user config
        profile: String,
    },
}

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Decode {
            profile,
            words,
            key,
            stats,
            json,
        } => decode_cmd(&profile, &words, key.as_deref(), stats, json),
        Command::Inspect { profile, key, json } => inspect_cmd(&profile, key.as_deref(), json),
        Command::Check { profile } => check_cmd(&profile),
    }
}

fn load_engine(profile_arg: &str) -> Engine {
    let config = die!(Config::load(), "Error reading user config: {}");
    let path = die!(config.resolve(profile_arg), "Error locating profile: {}");
    let text = die!(fs::read_to_string(&path), "Error reading profile: {}");
    let profile: Profile = die!(serde_yaml::from_str(&text), "Error parsing profile: {}");
    die!(Engine::from_profile(&profile), "Error compiling profile: {}")
}

#[derive(Serialize)]
struct DecodedWord {
    word: String,
    candidates: Vec<Candidate>,
}

#[derive(Serialize)]
struct Candidate {
    weight: i64,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    probability: Option<f64>,
}

fn decoded(word: &str, list: &ReplacementList, stats: bool) -> DecodedWord {
    let probabilities: Vec<Option<f64>> = if stats {
        list.makestat().into_iter().map(|(p, _)| Some(p)).collect()
    } else {
        vec![None; list.len()]
    };
    DecodedWord {
        word: word.to_string(),
        candidates: list
            .simplify()
            .into_iter()
            .zip(probabilities)
            .map(|((weight, value), probability)| Candidate {
                weight,
                value,
                probability,
            })
            .collect(),
    }
}

fn decode_cmd(profile: &str, words: &[String], key: Option<&str>, stats: bool, json: bool) {
    let engine = load_engine(profile);
    let mut results = Vec::with_capacity(words.len());
    for word in words {
        let mut list = match key {
            Some(name) => {
                let key = die!(engine.key(name), "Error: {}");
                let parts = die!(key.getallparts(word), "Error decoding {word}: {}");
                die!(add_rlists(parts), "Error decoding {word}: {}")
            }
            None => die!(
                decode::front_mid_end(&engine, word),
                "Error decoding {word}: {}"
            ),
        };
        list.sort();
        results.push(decoded(word, &list, stats));
    }

    if json {
        println!(
            "{}",
            die!(serde_json::to_string_pretty(&results), "JSON error: {}")
        );
        return;
    }
    for result in &results {
        println!("{}:", result.word);
        for c in &result.candidates {
            match c.probability {
                Some(p) => println!("{:.3} {}", p, c.value),
                None => println!("{:2} {}", c.weight, c.value),
            }
        }
    }
}

fn inspect_cmd(profile: &str, key: Option<&str>, json: bool) {
    let engine = load_engine(profile);
    match key {
        Some(name) => {
            let key = die!(engine.key(name), "Error: {}");
            let table = key.simplify();
            if json {
                println!(
                    "{}",
                    die!(serde_json::to_string_pretty(&table), "JSON error: {}")
                );
                return;
            }
            for (token, pairs) in &table {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(w, v)| format!("({w}) {v}"))
                    .collect();
                println!("{token}: {}", rendered.join(", "));
            }
        }
        None => {
            if json {
                println!(
                    "{}",
                    die!(serde_json::to_string_pretty(&engine.simplify()), "JSON error: {}")
                );
                return;
            }
            for key in engine.keys() {
                let mode = if key.is_suffix() { "suffix" } else { "prefix" };
                println!("{}: {} tokens ({})", key.name(), key.len(), mode);
            }
        }
    }
}

fn check_cmd(profile: &str) {
    let engine = load_engine(profile);
    let mut keys = 0usize;
    let mut tokens = 0usize;
    let mut candidates = 0usize;
    for key in engine.keys() {
        keys += 1;
        tokens += key.len();
        candidates += key
            .simplify()
            .values()
            .map(Vec::len)
            .sum::<usize>();
    }
    println!("profile OK: {keys} keys, {tokens} tokens, {candidates} candidates");
}
