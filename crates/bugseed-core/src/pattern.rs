//! Bug-seeding patterns mined from single-line bug-fixing commits.
//!
//! A pattern carries the abstracted token sequences of the fixed and the
//! buggy line (identifiers and literals replaced by `Idf_n` / `Lit_n`) next
//! to the concrete tokens they were derived from.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::{BugSeedError, Result};

pub const IDENTIFIER_PREFIX: &str = "Idf_";
pub const LITERAL_PREFIX: &str = "Lit_";

/// Category of an abstracted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Literal,
    Other,
}

impl TokenKind {
    pub fn of(abstract_token: &str) -> Self {
        if abstract_token.starts_with(IDENTIFIER_PREFIX) {
            TokenKind::Identifier
        } else if abstract_token.starts_with(LITERAL_PREFIX) {
            TokenKind::Literal
        } else {
            TokenKind::Other
        }
    }

    pub fn is_placeholder(self) -> bool {
        !matches!(self, TokenKind::Other)
    }
}

pub fn is_placeholder(abstract_token: &str) -> bool {
    TokenKind::of(abstract_token).is_placeholder()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugSeedingPattern {
    /// Abstracted tokens of the fixed (correct) line
    pub fix: Vec<String>,
    /// Concrete tokens of the fixed line
    pub fix_actual: Vec<String>,
    /// Abstracted tokens of the buggy line
    pub buggy: Vec<String>,
    /// Concrete tokens of the buggy line
    pub buggy_actual: Vec<String>,
    /// Commit the pattern was mined from
    #[serde(default)]
    pub url: String,
    #[serde(rename = "fix_tokenType", default, skip_serializing_if = "Option::is_none")]
    pub fix_token_type: Option<String>,
    #[serde(rename = "buggy_tokenType", default, skip_serializing_if = "Option::is_none")]
    pub buggy_token_type: Option<String>,
    /// Remaining provenance (file paths, commit metadata), kept as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BugSeedingPattern {
    /// Checks that every abstracted sequence lines up with its concrete one.
    pub fn validate(&self) -> Result<()> {
        if self.fix.len() != self.fix_actual.len() {
            return Err(BugSeedError::InvalidPattern(format!(
                "fix has {} tokens but fix_actual has {} ({})",
                self.fix.len(),
                self.fix_actual.len(),
                self.url
            )));
        }
        if self.buggy.len() != self.buggy_actual.len() {
            return Err(BugSeedError::InvalidPattern(format!(
                "buggy has {} tokens but buggy_actual has {} ({})",
                self.buggy.len(),
                self.buggy_actual.len(),
                self.url
            )));
        }
        Ok(())
    }

    /// True if either side mentions at least one identifier or literal.
    pub fn has_placeholder(&self) -> bool {
        self.fix.iter().chain(self.buggy.iter()).any(|t| is_placeholder(t))
    }

    fn dedup_key(&self) -> String {
        format!("{}{}", self.fix.join(" "), self.buggy.join(" "))
    }
}

/// Parses a JSON array of patterns and drops the malformed ones.
pub fn parse_patterns(json: &str) -> Result<Vec<BugSeedingPattern>> {
    let patterns: Vec<BugSeedingPattern> = serde_json::from_str(json)?;
    let total = patterns.len();
    let valid: Vec<_> = patterns
        .into_iter()
        .filter(|p| match p.validate() {
            Ok(()) => true,
            Err(e) => {
                debug!("Dropping pattern: {}", e);
                false
            }
        })
        .collect();
    debug!("Parsed {} of {} patterns", valid.len(), total);
    Ok(valid)
}

/// Patterns without any identifier or literal cannot be seeded.
pub fn retain_placeholder_patterns(patterns: Vec<BugSeedingPattern>) -> Vec<BugSeedingPattern> {
    patterns.into_iter().filter(|p| p.has_placeholder()).collect()
}

/// Splits patterns into a training and a validation part, keeping order.
pub fn split_training_validation(
    mut patterns: Vec<BugSeedingPattern>,
    train_percent: u8,
) -> (Vec<BugSeedingPattern>, Vec<BugSeedingPattern>) {
    let percent = usize::from(train_percent.min(100));
    let cut = patterns.len() * percent / 100;
    let validation = patterns.split_off(cut);
    (patterns, validation)
}

const BINARY_OPERATORS: &[&str] = &[
    "==", "!=", "===", "!==", "<", "<=", ">", ">=", "<<", ">>", ">>>", "+", "-", "*", "/", "%",
    "|", "^", "&", "in", "instanceof",
];

const BINARY_EXPRESSION: &str = "BinaryExpression";

static OPERAND_TRIPLE_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    BINARY_OPERATORS
        .iter()
        .map(|op| {
            Regex::new(&format!(
                r"(Idf_\d+|Lit_\d+)\s({})\s(Idf_\d+|Lit_\d+)",
                regex::escape(op)
            ))
            .expect("escaped operator regex")
        })
        .collect()
});

/// `(left, operator, right)` placeholder triples found in an abstracted line.
fn operand_triples(regexes: &[Regex], abstracted: &str) -> Vec<(String, String, String)> {
    regexes
        .iter()
        .flat_map(|re| {
            re.captures_iter(abstracted)
                .map(|c| (c[1].to_string(), c[2].to_string(), c[3].to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Keeps binary-expression patterns that swap exactly one operand while
/// keeping the operator, deduplicated by their abstracted text.
pub fn wrong_binary_operand_patterns(patterns: &[BugSeedingPattern]) -> Vec<BugSeedingPattern> {
    let mut seen = HashSet::new();
    let mut filtered = Vec::new();
    for pattern in patterns {
        let is_binary = pattern.fix_token_type.as_deref() == Some(BINARY_EXPRESSION)
            && pattern.buggy_token_type.as_deref() == Some(BINARY_EXPRESSION);
        if !is_binary {
            continue;
        }
        let in_fix = operand_triples(&OPERAND_TRIPLE_REGEXES, &pattern.fix.join(" "));
        let in_buggy = operand_triples(&OPERAND_TRIPLE_REGEXES, &pattern.buggy.join(" "));
        let swaps_one_operand = in_fix.iter().any(|(fl, fop, fr)| {
            in_buggy.iter().any(|(bl, bop, br)| {
                fop == bop && ((fl != bl && fr == br) || (fl == bl && fr != br))
            })
        });
        if swaps_one_operand && seen.insert(pattern.dedup_key()) {
            filtered.push(pattern.clone());
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(fix: &[&str], buggy: &[&str]) -> BugSeedingPattern {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        BugSeedingPattern {
            fix: owned(fix),
            fix_actual: owned(fix),
            buggy: owned(buggy),
            buggy_actual: owned(buggy),
            url: "https://github.com/example/repo/commit/abc".into(),
            fix_token_type: Some(BINARY_EXPRESSION.into()),
            buggy_token_type: Some(BINARY_EXPRESSION.into()),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_token_kind() {
        assert_eq!(TokenKind::of("Idf_1"), TokenKind::Identifier);
        assert_eq!(TokenKind::of("Lit_3"), TokenKind::Literal);
        assert_eq!(TokenKind::of("=="), TokenKind::Other);
        assert!(!TokenKind::Other.is_placeholder());
    }

    #[test]
    fn test_parse_patterns_keeps_extra_fields_and_drops_misaligned() {
        let json = r#"[
            {"fix": ["Idf_1", "==", "Idf_2"], "fix_actual": ["a", "==", "b"],
             "buggy": ["Idf_1", "!=", "Idf_2"], "buggy_actual": ["a", "!=", "b"],
             "url": "u1", "file_paths": {"old": "x.js"}},
            {"fix": ["Idf_1"], "fix_actual": [],
             "buggy": ["Idf_1"], "buggy_actual": ["a"], "url": "u2"}
        ]"#;
        let patterns = parse_patterns(json).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].url, "u1");
        assert!(patterns[0].extra.contains_key("file_paths"));
    }

    #[test]
    fn test_retain_placeholder_patterns() {
        let kept = pattern(&["Idf_1", ";"], &["Idf_1", "(", ")", ";"]);
        let dropped = pattern(&["break", ";"], &["continue", ";"]);
        let result = retain_placeholder_patterns(vec![kept.clone(), dropped]);
        assert_eq!(result, vec![kept]);
    }

    #[test]
    fn test_split_training_validation() {
        let patterns: Vec<_> = (0..10).map(|_| pattern(&["Idf_1"], &["Idf_2"])).collect();
        let (train, validation) = split_training_validation(patterns, 80);
        assert_eq!(train.len(), 8);
        assert_eq!(validation.len(), 2);

        let (train, validation) = split_training_validation(vec![pattern(&["Idf_1"], &["Idf_2"])], 80);
        assert!(train.is_empty());
        assert_eq!(validation.len(), 1);
    }

    #[test]
    fn test_every_operator_has_a_triple_regex() {
        assert_eq!(OPERAND_TRIPLE_REGEXES.len(), BINARY_OPERATORS.len());
        for op in BINARY_OPERATORS {
            let line = format!("Idf_1 {} Lit_2", op);
            let triples = operand_triples(&OPERAND_TRIPLE_REGEXES, &line);
            assert!(
                triples.contains(&("Idf_1".to_string(), op.to_string(), "Lit_2".to_string())),
                "no triple for {}",
                op
            );
        }
    }

    #[test]
    fn test_wrong_binary_operand_patterns() {
        let swapped_right = pattern(&["Idf_1", "<", "Idf_2"], &["Idf_1", "<", "Idf_3"]);
        let swapped_op = pattern(&["Idf_1", "<", "Idf_2"], &["Idf_1", "<=", "Idf_2"]);
        let duplicate = swapped_right.clone();
        let mut not_binary = pattern(&["Idf_1", "+", "Lit_1"], &["Idf_2", "+", "Lit_1"]);
        not_binary.fix_token_type = Some("CallExpression".into());

        let result =
            wrong_binary_operand_patterns(&[swapped_right.clone(), swapped_op, duplicate, not_binary]);
        assert_eq!(result, vec![swapped_right]);
    }
}
