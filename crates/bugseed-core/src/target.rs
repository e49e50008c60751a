//! Candidate seeding sites and the per-file analysis they come from.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::pattern::TokenKind;
use crate::{BugSeedError, Result};

/// A mutable AST location inside an analysed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetLocation {
    /// Concrete tokens of the location
    pub tokens: Vec<String>,
    /// Same tokens with identifiers and literals abstracted
    #[serde(rename = "abstractedTokens")]
    pub abstracted_tokens: Vec<String>,
    /// Line span, e.g. `"6-6"`
    #[serde(default)]
    pub line: String,
    /// Character offsets `[start, end]` in the formatted file
    pub range: [usize; 2],
    /// AST node type of the location
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belongs_to_function: Option<String>,
    /// Key into the per-function identifier/literal maps
    #[serde(default)]
    pub belonging_function_range: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Concrete placeholder tokens of a sequence, split by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderTokens {
    pub all: Vec<String>,
    pub identifiers: Vec<String>,
    pub literals: Vec<String>,
}

impl TargetLocation {
    pub fn start(&self) -> usize {
        self.range[0]
    }

    pub fn end(&self) -> usize {
        self.range[1]
    }

    /// True if `other` lies inside this location and is not the same span.
    pub fn strictly_contains(&self, other: &TargetLocation) -> bool {
        self.range != other.range && other.start() >= self.start() && other.end() <= self.end()
    }

    /// Abstract placeholder (`Idf_1`) to the concrete token it stands for.
    pub fn placeholder_mapping(&self) -> HashMap<&str, &str> {
        self.abstracted_tokens
            .iter()
            .zip(self.tokens.iter())
            .filter(|(abstract_token, _)| TokenKind::of(abstract_token).is_placeholder())
            .map(|(a, c)| (a.as_str(), c.as_str()))
            .collect()
    }

    /// Picks the tokens of `sequence` sitting at this location's placeholder
    /// positions. `sequence` must align with the abstracted tokens.
    pub fn placeholder_tokens(&self, sequence: &[String]) -> Result<PlaceholderTokens> {
        if sequence.len() != self.abstracted_tokens.len() {
            return Err(BugSeedError::ContractViolation(format!(
                "token sequence of length {} does not align with {} abstracted tokens",
                sequence.len(),
                self.abstracted_tokens.len()
            )));
        }
        let mut out = PlaceholderTokens::default();
        for (abstract_token, concrete) in self.abstracted_tokens.iter().zip(sequence) {
            match TokenKind::of(abstract_token) {
                TokenKind::Identifier => out.identifiers.push(concrete.clone()),
                TokenKind::Literal => out.literals.push(concrete.clone()),
                TokenKind::Other => continue,
            }
            out.all.push(concrete.clone());
        }
        Ok(out)
    }
}

/// Character range of a single token, serialized as `"start-end"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenRange {
    pub start: usize,
    pub end: usize,
}

impl FromStr for TokenRange {
    type Err = BugSeedError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| BugSeedError::InvalidRecord(format!("malformed token range '{}'", s)))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| BugSeedError::InvalidRecord(format!("malformed token range '{}': {}", s, e)))
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Static-analysis output for one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysedFile {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub nodes: Vec<TargetLocation>,
    #[serde(rename = "tokenList", default)]
    pub token_list: Vec<String>,
    #[serde(rename = "tokenRangesList", default)]
    pub token_ranges_list: Vec<String>,
    #[serde(default)]
    pub range_to_identifier: HashMap<String, String>,
    #[serde(default)]
    pub range_to_literal: HashMap<String, String>,
    #[serde(default)]
    pub functions_to_identifiers: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub functions_to_literals: HashMap<String, Vec<String>>,
}

impl AnalysedFile {
    /// Parses an analysis result. The extractor writes `{}` when it could not
    /// analyse the file; that case yields `None`.
    pub fn from_json(json: &str) -> Result<Option<Self>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.as_object().is_some_and(|o| o.is_empty()) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Token ranges parsed from `tokenRangesList`.
    pub fn token_ranges(&self) -> Result<Vec<TokenRange>> {
        self.token_ranges_list.iter().map(|r| r.parse()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(tokens: &[&str], abstracted: &[&str], range: [usize; 2]) -> TargetLocation {
        TargetLocation {
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
            abstracted_tokens: abstracted.iter().map(|s| s.to_string()).collect(),
            line: "1-1".into(),
            range,
            node_type: Some("BinaryExpression".into()),
            belongs_to_function: None,
            belonging_function_range: "0-100".into(),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_placeholder_mapping() {
        let t = target(&["a", "==", "1"], &["Idf_1", "==", "Lit_1"], [0, 6]);
        let mapping = t.placeholder_mapping();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["Idf_1"], "a");
        assert_eq!(mapping["Lit_1"], "1");
    }

    #[test]
    fn test_placeholder_tokens_by_kind() {
        let t = target(&["a", "+", "b", "+", "2"], &["Idf_1", "+", "Idf_2", "+", "Lit_1"], [0, 9]);
        let tokens = t.placeholder_tokens(&t.tokens).unwrap();
        assert_eq!(tokens.all, vec!["a", "b", "2"]);
        assert_eq!(tokens.identifiers, vec!["a", "b"]);
        assert_eq!(tokens.literals, vec!["2"]);

        let misaligned = vec!["a".to_string()];
        assert!(matches!(
            t.placeholder_tokens(&misaligned),
            Err(BugSeedError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_strictly_contains() {
        let outer = target(&["a"], &["Idf_1"], [0, 20]);
        let inner = target(&["b"], &["Idf_1"], [4, 10]);
        let same = target(&["c"], &["Idf_1"], [0, 20]);
        assert!(outer.strictly_contains(&inner));
        assert!(!inner.strictly_contains(&outer));
        assert!(!outer.strictly_contains(&same));
    }

    #[test]
    fn test_token_range_parse() {
        let range: TokenRange = "12-15".parse().unwrap();
        assert_eq!(range, TokenRange { start: 12, end: 15 });
        assert_eq!(range.to_string(), "12-15");
        assert!("12".parse::<TokenRange>().is_err());
        assert!("a-b".parse::<TokenRange>().is_err());
    }

    #[test]
    fn test_analysed_file_empty_object_means_failed_analysis() {
        assert!(AnalysedFile::from_json("{}").unwrap().is_none());

        let json = r#"{
            "file_path": "data/1.js",
            "nodes": [{"tokens": ["a", "==", "b"], "abstractedTokens": ["Idf_1", "==", "Idf_2"],
                       "range": [4, 10], "line": "1-1", "type": "BinaryExpression",
                       "belongs_to_function": "__GLOBAL_0-20", "belonging_function_range": "0-20",
                       "tokenTypes": ["Identifier", "Punctuator", "Identifier"]}],
            "tokenList": ["if", "(", "a", "==", "b", ")"],
            "tokenRangesList": ["0-2", "3-4", "4-5", "6-8", "9-10", "10-11"],
            "range_to_identifier": {"4-5": "a", "9-10": "b"},
            "range_to_literal": {},
            "functions_to_identifiers": {"0-20": ["a", "b"]},
            "functions_to_literals": {"0-20": []}
        }"#;
        let file = AnalysedFile::from_json(json).unwrap().unwrap();
        assert_eq!(file.nodes.len(), 1);
        assert!(file.nodes[0].extra.contains_key("tokenTypes"));
        assert_eq!(file.token_ranges().unwrap().len(), 6);
    }
}
