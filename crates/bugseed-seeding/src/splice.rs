use bugseed_core::{BugSeedError, Result, TargetLocation, TokenRange};

/// Replaces the target's tokens in the file token list with `variant`.
///
/// The replaced tokens are those whose character range lies inside the
/// target range. The result has `len(file) - len(target) + len(variant)`
/// tokens; anything else means the analysis output is inconsistent.
pub fn splice_variant(
    token_list: &[String],
    token_ranges: &[TokenRange],
    target: &TargetLocation,
    variant: &[String],
) -> Result<Vec<String>> {
    if token_list.len() != token_ranges.len() {
        return Err(BugSeedError::ContractViolation(format!(
            "{} tokens but {} token ranges",
            token_list.len(),
            token_ranges.len()
        )));
    }

    let mut inside = token_ranges
        .iter()
        .enumerate()
        .filter(|(_, r)| r.start >= target.start() && r.end <= target.end())
        .map(|(i, _)| i);
    let first = inside.next().ok_or_else(|| {
        BugSeedError::ContractViolation(format!(
            "target range {}-{} covers no token",
            target.start(),
            target.end()
        ))
    })?;
    let last = inside.last().unwrap_or(first);

    let mut spliced = Vec::with_capacity(token_list.len() + variant.len());
    spliced.extend_from_slice(&token_list[..first]);
    spliced.extend_from_slice(variant);
    spliced.extend_from_slice(&token_list[last + 1..]);

    let expected = token_list.len() + variant.len();
    if spliced.len() + target.tokens.len() != expected {
        return Err(BugSeedError::ContractViolation(format!(
            "splice produced {} tokens, expected {} - {} + {}",
            spliced.len(),
            token_list.len(),
            target.tokens.len(),
            variant.len()
        )));
    }
    Ok(spliced)
}
