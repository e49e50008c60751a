//! Analogy queries over token embeddings.
//!
//! Given the tokens of a known change (`a = b + c` became `a = b + c + m`)
//! and the tokens of a new location (`x = y + z`), find the candidate token
//! that relates to `x, y, z` the way `m` relates to `a, b, c`:
//! `mean_i(e(m) - e(pattern_i) + e(target_i))`, ranked by cosine similarity.

use bugseed_core::{BugSeedError, Result};
use std::cmp::Ordering;
use tracing::trace;

use crate::{TokenEmbedder, VectorOps};

pub struct TokenAnalogy<'a> {
    embedder: &'a dyn TokenEmbedder,
}

impl<'a> TokenAnalogy<'a> {
    pub fn new(embedder: &'a dyn TokenEmbedder) -> Self {
        Self { embedder }
    }

    /// Similarity used for matching: identical tokens score 1.0, otherwise
    /// `1 - cosine_distance` with the distance rounded to three decimals.
    pub fn similarity(&self, a: &str, b: &str) -> Result<f32> {
        if a == b {
            return Ok(1.0);
        }
        let distance = VectorOps::cosine_distance(&self.embedder.embed(a), &self.embedder.embed(b))?;
        Ok(1.0 - distance)
    }

    /// Candidate nearest to `token`. First one wins on ties.
    pub fn closest(&self, token: &str, candidates: &[String]) -> Result<Option<String>> {
        let reference = self.embedder.embed(token);
        let mut best: Option<(f32, &String)> = None;
        for candidate in candidates {
            let distance = VectorOps::cosine_distance(&reference, &self.embedder.embed(candidate))?;
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, candidate));
            }
        }
        Ok(best.map(|(_, c)| c.clone()))
    }

    /// The `k` candidates most similar to the analogy vector, best first.
    /// Ties keep candidate order. With no paired tokens to build an analogy
    /// from, falls back to the single candidate closest to `unbound`.
    pub fn top_k(
        &self,
        tokens_in_pattern: &[String],
        unbound: &str,
        tokens_in_target: &[String],
        candidates: &[String],
        k: usize,
    ) -> Result<Vec<String>> {
        if tokens_in_pattern.len() != tokens_in_target.len() {
            return Err(BugSeedError::ContractViolation(format!(
                "analogy needs aligned tokens, got {} pattern and {} target tokens",
                tokens_in_pattern.len(),
                tokens_in_target.len()
            )));
        }
        if candidates.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if tokens_in_pattern.is_empty() {
            return Ok(self.closest(unbound, candidates)?.into_iter().collect());
        }

        let reference = self.embedder.embed(unbound);
        let analogous = tokens_in_pattern
            .iter()
            .zip(tokens_in_target)
            .map(|(p, t)| VectorOps::offset(&reference, &self.embedder.embed(p), &self.embedder.embed(t)))
            .collect::<Result<Vec<_>>>()?;
        let query = VectorOps::mean(&analogous)?;

        let mut scored = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| -> Result<(usize, f32)> {
                Ok((i, VectorOps::cosine_similarity(&query, &self.embedder.embed(c))?))
            })
            .collect::<Result<Vec<_>>>()?;
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        trace!("Analogy for '{}' selected {:?}", unbound, scored);
        Ok(scored.into_iter().map(|(i, _)| candidates[i].clone()).collect())
    }
}
