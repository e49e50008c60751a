//! Tokens an unbound placeholder may be filled with.

use bugseed_core::{AnalysedFile, BugSeedError, Result, ScopeOfSelection, TokenKind};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// The most frequent identifiers and literals across the mined commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopFrequent {
    pub identifiers: Vec<String>,
    pub literals: Vec<String>,
}

impl TopFrequent {
    pub fn new(identifiers: Vec<String>, literals: Vec<String>) -> Self {
        Self {
            identifiers,
            literals,
        }
    }

    /// Reads two JSON arrays of strings. A missing path contributes nothing.
    pub fn load(identifiers: Option<&Path>, literals: Option<&Path>) -> Result<Self> {
        let frequent = Self::new(read_token_list(identifiers)?, read_token_list(literals)?);
        info!(
            "Loaded {} frequent identifiers and {} frequent literals",
            frequent.identifiers.len(),
            frequent.literals.len()
        );
        Ok(frequent)
    }
}

fn read_token_list(path: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path).map_err(|e| {
        BugSeedError::Config(format!("cannot read token list {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Identifiers and literals of one analysed file, by scope.
#[derive(Debug, Clone)]
pub struct AvailableTokens<'a> {
    file: &'a AnalysedFile,
    frequent: &'a TopFrequent,
    file_identifiers: BTreeSet<String>,
    file_literals: BTreeSet<String>,
}

impl<'a> AvailableTokens<'a> {
    pub fn new(file: &'a AnalysedFile, frequent: &'a TopFrequent) -> Self {
        Self {
            file,
            frequent,
            file_identifiers: file.range_to_identifier.values().cloned().collect(),
            file_literals: file.range_to_literal.values().cloned().collect(),
        }
    }

    /// Candidate tokens of `kind` for a location inside the function keyed
    /// by `function_range`. An unknown function has no candidates.
    pub fn candidates(
        &self,
        kind: TokenKind,
        scope: ScopeOfSelection,
        function_range: &str,
    ) -> BTreeSet<String> {
        let (in_file, per_function, frequent) = match kind {
            TokenKind::Identifier => (
                &self.file_identifiers,
                &self.file.functions_to_identifiers,
                &self.frequent.identifiers,
            ),
            TokenKind::Literal => (
                &self.file_literals,
                &self.file.functions_to_literals,
                &self.frequent.literals,
            ),
            TokenKind::Other => return BTreeSet::new(),
        };
        match scope {
            ScopeOfSelection::Function => per_function
                .get(function_range)
                .map(|tokens| tokens.iter().cloned().collect())
                .unwrap_or_default(),
            ScopeOfSelection::File => in_file.clone(),
            ScopeOfSelection::TopK => in_file.iter().chain(frequent.iter()).cloned().collect(),
        }
    }
}
