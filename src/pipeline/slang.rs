//! Deterministic expansion of informal Indonesian money shorthand into digits.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Hokkien-derived street amounts.
const NAMED_AMOUNTS: &[(&str, i64)] = &[
    ("cepek", 100),
    ("gopek", 500),
    ("seceng", 1_000),
    ("serebu", 1_000),
    ("seribu", 1_000),
    ("noceng", 2_000),
    ("goceng", 5_000),
    ("ceban", 10_000),
    ("noban", 20_000),
    ("goban", 50_000),
    ("cetiao", 1_000_000),
    ("cetiau", 1_000_000),
    ("sejuta", 1_000_000),
    ("sejeti", 1_000_000),
];

static NAMED_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = NAMED_AMOUNTS
        .iter()
        .map(|(word, _)| *word)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
});

static HALF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsetengah\s+(juta|jeti|jt)\b").unwrap());

static SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:[.,]\d{3})+|\d+(?:[.,]\d+)?)\s*(rb|rebu|ribu|k|jt|juta|jeti)\b")
        .unwrap()
});

/// A separator followed by exactly three digits groups thousands
/// (`1.500rb`); anything else is a decimal point (`1,5jt`).
fn parse_number(raw: &str) -> Option<f64> {
    let groups: Vec<&str> = raw.split(['.', ',']).collect();
    let grouped = groups.len() > 1 && groups[1..].iter().all(|g| g.len() == 3);
    if grouped {
        groups.concat().parse().ok()
    } else {
        raw.replace(',', ".").parse().ok()
    }
}

fn multiplier(suffix: &str) -> i64 {
    match suffix.to_ascii_lowercase().as_str() {
        "jt" | "juta" | "jeti" => 1_000_000,
        _ => 1_000,
    }
}

/// Rewrite slang amounts as plain digits: `25rb` → `25000`,
/// `1,5jt` → `1500000`, `goceng` → `5000`. Other text is left untouched.
pub fn expand_slang(text: &str) -> String {
    let out = HALF_RE.replace_all(text, "500000");

    let out = SUFFIX_RE.replace_all(&out, |caps: &Captures| {
        match parse_number(&caps[1]) {
            Some(n) => ((n * multiplier(&caps[2]) as f64).round() as i64).to_string(),
            None => caps[0].to_string(),
        }
    });

    let out = NAMED_RE.replace_all(&out, |caps: &Captures| {
        let word = caps[0].to_ascii_lowercase();
        NAMED_AMOUNTS
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    out.into_owned()
}
