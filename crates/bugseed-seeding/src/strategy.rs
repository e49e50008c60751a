//! Matching a pattern against a location and resolving its buggy side.
//!
//! A pattern applies to a location when the location's abstracted tokens
//! equal the pattern's `fix` side. The buggy side is then rebuilt with the
//! location's own identifiers and literals. Placeholders that only appear on
//! the buggy side (unbound) are filled by analogy: the candidate that
//! relates to the location's tokens the way the pattern's new token related
//! to the pattern's tokens.

use bugseed_core::{
    BugSeedError, BugSeedingPattern, ScopeOfSelection, SeedingConfig, TargetLocation, TokenKind,
};
use bugseed_vector::{TokenAnalogy, TokenEmbedder};
use std::collections::BTreeSet;
use std::fmt;
use tracing::trace;

use crate::{expand_variants, AvailableTokens, SeedingRejection, SeedingResult, Slot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedingStrategy {
    /// Exact abstraction match; only bound placeholders can be resolved.
    Syntactic,
    /// Abstraction match plus mean token similarity of at least `threshold`;
    /// unbound placeholders get the `k` best analogies from `scope`.
    Semantic {
        threshold: f32,
        k: usize,
        scope: ScopeOfSelection,
    },
}

impl Default for SeedingStrategy {
    fn default() -> Self {
        SeedingStrategy::Semantic {
            threshold: 0.3,
            k: 1,
            scope: ScopeOfSelection::TopK,
        }
    }
}

impl SeedingStrategy {
    pub fn from_config(config: &SeedingConfig) -> bugseed_core::Result<Self> {
        match config.strategy.to_lowercase().as_str() {
            "syntactic" => Ok(SeedingStrategy::Syntactic),
            "semantic" => Ok(SeedingStrategy::Semantic {
                threshold: config.similarity_threshold,
                k: config.k,
                scope: config.scope,
            }),
            other => Err(BugSeedError::Config(format!(
                "unknown seeding strategy '{}'",
                other
            ))),
        }
    }

    /// Checks whether `pattern` applies at `target`.
    pub fn matches(
        &self,
        pattern: &BugSeedingPattern,
        target: &TargetLocation,
        ctx: &SeedingContext<'_>,
    ) -> SeedingResult<MatchOutcome> {
        if target.abstracted_tokens != pattern.fix {
            return Err(SeedingRejection::PatternMismatch.into());
        }
        let SeedingStrategy::Semantic { threshold, .. } = *self else {
            return Ok(MatchOutcome::default());
        };

        let in_pattern = target.placeholder_tokens(&pattern.fix_actual)?;
        let in_target = target.placeholder_tokens(&target.tokens)?;
        if in_target.all.is_empty() {
            return Err(SeedingRejection::NoPlaceholder.into());
        }

        let analogy = TokenAnalogy::new(ctx.embedder);
        let mut total = 0.0f32;
        for (p, t) in in_pattern.all.iter().zip(&in_target.all) {
            total += analogy.similarity(p, t)?;
        }
        let mean = total / in_target.all.len() as f32;
        trace!("Mean similarity {:.3} against threshold {}", mean, threshold);
        if mean < threshold {
            return Err(SeedingRejection::BelowSimilarityThreshold.into());
        }
        Ok(MatchOutcome {
            mean_similarity: Some(mean),
        })
    }

    /// Concrete buggy token sequences for `target`, one per combination of
    /// selected unbound tokens.
    pub fn apply(
        &self,
        pattern: &BugSeedingPattern,
        target: &TargetLocation,
        ctx: &SeedingContext<'_>,
    ) -> SeedingResult<Mutation> {
        let bound = target.placeholder_mapping();
        let in_target = target.placeholder_tokens(&target.tokens)?;
        let in_pattern = target.placeholder_tokens(&pattern.fix_actual)?;

        let (identifiers, literals) = match *self {
            SeedingStrategy::Syntactic => (BTreeSet::new(), BTreeSet::new()),
            SeedingStrategy::Semantic { scope, .. } => (
                ctx.available
                    .candidates(TokenKind::Identifier, scope, &target.belonging_function_range),
                ctx.available
                    .candidates(TokenKind::Literal, scope, &target.belonging_function_range),
            ),
        };
        let free_identifiers = without(&identifiers, &in_target.identifiers);
        let free_literals = without(&literals, &in_target.literals);

        let mut slots = Vec::with_capacity(pattern.buggy.len());
        for (i, abstract_token) in pattern.buggy.iter().enumerate() {
            let kind = TokenKind::of(abstract_token);
            if !kind.is_placeholder() {
                slots.push(Slot::Fixed(abstract_token.clone()));
                continue;
            }
            if let Some(concrete) = bound.get(abstract_token.as_str()) {
                slots.push(Slot::Fixed(concrete.to_string()));
                continue;
            }

            let SeedingStrategy::Semantic { k, .. } = *self else {
                return Err(SeedingRejection::UnboundWithoutEmbedding.into());
            };
            let unbound = pattern.buggy_actual.get(i).ok_or_else(|| {
                BugSeedError::InvalidPattern(format!(
                    "buggy_actual has no token at position {} ({})",
                    i, pattern.url
                ))
            })?;
            let candidates = if kind == TokenKind::Identifier {
                &free_identifiers
            } else {
                &free_literals
            };
            if candidates.is_empty() {
                return Err(SeedingRejection::EmptyCandidateScope.into());
            }
            let selected = TokenAnalogy::new(ctx.embedder).top_k(
                &in_pattern.all,
                unbound,
                &in_target.all,
                candidates,
                k,
            )?;
            if selected.is_empty() {
                return Err(SeedingRejection::EmptyCandidateScope.into());
            }
            trace!("Unbound '{}' at {} resolved to {:?}", unbound, i, selected);
            slots.push(Slot::Choices(selected));
        }

        Ok(Mutation {
            variants: expand_variants(&slots),
            identifiers_available: identifiers.len(),
            literals_available: literals.len(),
        })
    }
}

impl fmt::Display for SeedingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedingStrategy::Syntactic => write!(f, "syntactic"),
            SeedingStrategy::Semantic {
                threshold,
                k,
                scope,
            } => write!(f, "semantic (threshold {}, k {}, scope {})", threshold, k, scope),
        }
    }
}

fn without(available: &BTreeSet<String>, present: &[String]) -> Vec<String> {
    available
        .iter()
        .filter(|t| !present.contains(t))
        .cloned()
        .collect()
}

/// What a strategy may consult while seeding one file.
#[derive(Clone, Copy)]
pub struct SeedingContext<'a> {
    pub embedder: &'a dyn TokenEmbedder,
    pub available: &'a AvailableTokens<'a>,
}

/// A successful match. Semantic matches carry their mean similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchOutcome {
    pub mean_similarity: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    /// Buggy token sequences, one per variant.
    pub variants: Vec<Vec<String>>,
    /// Size of the identifier scope before excluding the target's own tokens.
    pub identifiers_available: usize,
    pub literals_available: usize,
}
