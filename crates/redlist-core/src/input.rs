//! Candidate extraction from pasted survey registers.
//!
//! Register exports mix section headers, species rows with counts and
//! measurements, and blank lines. Each line yields at most one candidate
//! name, taken from its leading alphabetic tokens.

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;

/// A candidate species name and the 1-based input line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub line: usize,
    pub name: String,
}

/// Extract candidates lazily, in input line order.
///
/// Per line:
/// 1. trim; skip if empty
/// 2. skip header-looking lines (cased characters present, none lowercase)
/// 3. two leading alphabetic tokens → `"genus species"`, lowercased
/// 4. otherwise one leading alphabetic token → that token, lowercased
/// 5. otherwise skip
pub fn candidates(text: &str) -> impl Iterator<Item = Candidate> + '_ {
    text.lines().enumerate().filter_map(|(i, line)| {
        candidate_from_line(line).map(|name| Candidate { line: i + 1, name })
    })
}

/// Normalise pasted text into candidate names. Duplicates are kept.
pub fn normalize_input(text: &str) -> Vec<String> {
    candidates(text).map(|c| c.name).collect()
}

fn candidate_from_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || is_header(line) {
        return None;
    }

    let mut tokens = line.split_whitespace();
    let first = tokens.next().filter(|t| is_alphabetic(t))?;
    match tokens.next() {
        Some(second) if is_alphabetic(second) => {
            Some(format!("{first} {second}").to_lowercase())
        }
        _ => Some(first.to_lowercase()),
    }
}

/// All-caps heuristic for section labels such as "KAMPELAKANNAT" or
/// "FISH 2023". This also drops all-caps species codes.
fn is_header(line: &str) -> bool {
    let mut cased = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Every char is a letter (general category L*). `char::is_alphabetic` is
/// wider: it also admits letter numbers (Ⅱ), combining marks, and enclosed
/// letters (Ⓐ), none of which count here.
fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(is_letter)
}

fn is_letter(c: char) -> bool {
    c.is_alphabetic()
        && !c.is_numeric()
        && !is_combining_mark(c)
        && !matches!(c, '\u{24B6}'..='\u{24E9}' | '\u{1F130}'..='\u{1F189}')
}
