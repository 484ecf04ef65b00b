//! Token-order-insensitive string similarity on a 0–100 integer scale.

use std::fmt;
use std::str::FromStr;

use strsim::jaro_winkler;

use crate::normalize::sorted_tokens;

/// Similarity between two already-normalised names, 0 (nothing shared) to
/// 100 (identical).
pub trait Scorer {
    fn score(&self, a: &str, b: &str) -> u8;
}

/// Token-sort ratio: sort each side's tokens, then score the Indel
/// similarity `2·LCS / (len_a + len_b)` over Unicode scalar values.
///
/// "salmo trutta" and "trutta salmo" score 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

impl Scorer for TokenSortRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        indel_ratio(&sorted_tokens(a), &sorted_tokens(b))
    }
}

/// Token-sorted Jaro-Winkler, scaled to 0–100. Favours shared prefixes,
/// which suits genus-first scientific names.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortJaroWinkler;

impl Scorer for TokenSortJaroWinkler {
    fn score(&self, a: &str, b: &str) -> u8 {
        let sim = jaro_winkler(&sorted_tokens(a), &sorted_tokens(b));
        (sim * 100.0).floor().clamp(0.0, 100.0) as u8
    }
}

/// Runtime-selectable scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScorerKind {
    #[default]
    TokenSort,
    JaroWinkler,
}

impl Scorer for ScorerKind {
    fn score(&self, a: &str, b: &str) -> u8 {
        match self {
            Self::TokenSort => TokenSortRatio.score(a, b),
            Self::JaroWinkler => TokenSortJaroWinkler.score(a, b),
        }
    }
}

impl ScorerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenSort => "token-sort",
            Self::JaroWinkler => "jaro-winkler",
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token-sort" => Ok(Self::TokenSort),
            "jaro-winkler" => Ok(Self::JaroWinkler),
            other => Err(format!(
                "unknown scorer '{other}' (expected token-sort or jaro-winkler)"
            )),
        }
    }
}

/// `floor(100 · 2·LCS / (len_a + len_b))`. Two empty strings are identical.
///
/// Flooring keeps `score >= t` equivalent to `raw >= t` for any integer
/// threshold `t`.
fn indel_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    (200 * lcs_len(&a, &b) / total) as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_scores_100() {
        assert_eq!(TokenSortRatio.score("kampela", "kampela"), 100);
    }

    #[test]
    fn word_order_irrelevant() {
        let straight = TokenSortRatio.score("genus species", "genus species");
        let swapped = TokenSortRatio.score("genus species", "species genus");
        assert_eq!(straight, swapped);
        assert_eq!(swapped, 100);
    }

    #[test]
    fn disjoint_scores_0() {
        assert_eq!(TokenSortRatio.score("abc", "xyz"), 0);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(TokenSortRatio.score("", ""), 100);
        assert_eq!(TokenSortRatio.score("kampela", ""), 0);
    }

    #[test]
    fn exact_values() {
        // LCS 4 of 5+5
        assert_eq!(TokenSortRatio.score("abcde", "abcdf"), 80);
        // LCS 3 of 4+4
        assert_eq!(TokenSortRatio.score("abcd", "abce"), 75);
        // LCS 15 of 19+19 → 78.9
        assert_eq!(
            TokenSortRatio.score("abcdefghijklmnopqrs", "abcdefghijklmnowxyz"),
            78
        );
        // one dropped letter: 2·6 / 13 → 92.3
        assert_eq!(TokenSortRatio.score("kampela", "kampla"), 92);
    }

    #[test]
    fn fractional_scores_floor() {
        // LCS 33 of 41+42 → 79.52, which must not reach 80
        let name = format!("{}{}", "a".repeat(33), "b".repeat(8));
        let cand = format!("{}{}", "a".repeat(33), "c".repeat(9));
        assert_eq!(TokenSortRatio.score(&cand, &name), 79);
        // LCS 5 of 6+6 → 83.3
        assert_eq!(TokenSortRatio.score("abcdex", "abcdey"), 83);
    }

    #[test]
    fn typo_scores_above_default_threshold() {
        assert!(TokenSortRatio.score("platichtys flesus", "platichthys flesus") >= 80);
    }

    #[test]
    fn symmetric() {
        let pairs = [("kampela", "kampla"), ("salmo trutta", "salmo salar")];
        for (a, b) in pairs {
            assert_eq!(TokenSortRatio.score(a, b), TokenSortRatio.score(b, a));
        }
    }

    #[test]
    fn jaro_winkler_word_order_irrelevant() {
        let s = TokenSortJaroWinkler;
        assert_eq!(s.score("salmo trutta", "trutta salmo"), 100);
        assert!(s.score("kampela", "kampla") > 80);
        assert_eq!(s.score("abc", "xyz"), 0);
    }

    #[test]
    fn scorer_kind_parse() {
        assert_eq!("token-sort".parse::<ScorerKind>(), Ok(ScorerKind::TokenSort));
        assert_eq!(
            "jaro-winkler".parse::<ScorerKind>(),
            Ok(ScorerKind::JaroWinkler)
        );
        assert!("levenshtein".parse::<ScorerKind>().is_err());
        assert_eq!(ScorerKind::default().to_string(), "token-sort");
    }
}
