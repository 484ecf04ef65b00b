//! Name normalisation for catalog keys and pasted candidates.
//!
//! Both sides of a match are compared in the same normalised form so that
//! "Kampela", " kampela " and "KAMPELA" all land on one key.
//!
//! # Conventions
//!
//! - Lowercasing is Unicode-aware ("Särki" → "särki", "ÅL" → "ål")
//! - Only leading/trailing whitespace is removed
//! - Internal whitespace is kept exactly as the reference data spells it

/// Normalise a name into its matching key: Unicode lowercase, trimmed.
///
/// Idempotent: `normalize_name(&normalize_name(s)) == normalize_name(s)`.
pub fn normalize_name(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Split a name into whitespace-delimited tokens, sort them, and rejoin with
/// single spaces.
///
/// "species genus" → "genus species"
pub fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
