//! Sub-vector lookups shared by the vectorizers.

use bugseed_vector::{EmbeddingLookup, EmbeddingOracles};

use crate::SkipReason;

/// Name embedding of an identifier or literal, e.g. `ID:i` or `LIT:0`.
pub fn name_vector<'a>(oracles: &'a EmbeddingOracles, name: &str) -> Result<&'a [f32], SkipReason> {
    oracles
        .names
        .lookup(name)
        .ok_or(SkipReason::MissingEmbedding)
}

/// Embedding of an AST node type. Unseen node types skip the record.
pub fn node_type_vector<'a>(
    oracles: &'a EmbeddingOracles,
    node_type: &str,
) -> Result<&'a [f32], SkipReason> {
    oracles
        .node_types
        .lookup(node_type)
        .ok_or(SkipReason::MissingEmbedding)
}

/// Type embedding, or zeros when the type was never seen. The zero vector
/// has the table's dimension; `size` is only used for an empty table.
pub fn type_vector(oracles: &EmbeddingOracles, type_name: &str, size: usize) -> Vec<f32> {
    let types = &oracles.types;
    types.lookup(type_name).map(<[f32]>::to_vec).unwrap_or_else(|| {
        let dimension = if types.is_empty() { size } else { types.dimension() };
        vec![0.0; dimension]
    })
}

pub fn one_hot(index: usize, len: usize) -> Vec<f32> {
    let mut v = vec![0.0; len];
    v[index] = 1.0;
    v
}

/// Concatenates sub-vectors in order.
pub fn concat(parts: &[&[f32]]) -> Vec<f32> {
    let mut v = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        v.extend_from_slice(part);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_and_fallbacks() {
        let mut oracles = EmbeddingOracles::default();
        oracles.names.insert("ID:a", vec![1.0, 2.0]).unwrap();
        oracles.types.insert("number", vec![0.5, 0.5, 0.5]).unwrap();

        assert_eq!(name_vector(&oracles, "ID:a").unwrap(), &[1.0f32, 2.0][..]);
        assert_eq!(name_vector(&oracles, "ID:b"), Err(SkipReason::MissingEmbedding));
        assert_eq!(node_type_vector(&oracles, "IfStatement"), Err(SkipReason::MissingEmbedding));
        assert_eq!(type_vector(&oracles, "number", 3), vec![0.5, 0.5, 0.5]);
        assert_eq!(type_vector(&oracles, "string", 3), vec![0.0; 3]);
    }

    #[test]
    fn test_unseen_type_follows_table_dimension() {
        let mut oracles = EmbeddingOracles::default();
        assert_eq!(type_vector(&oracles, "string", 5).len(), 5);

        oracles.types.insert("number", vec![1.0; 8]).unwrap();
        assert_eq!(type_vector(&oracles, "number", 5).len(), 8);
        assert_eq!(type_vector(&oracles, "string", 5), vec![0.0; 8]);
    }

    #[test]
    fn test_one_hot_and_concat() {
        assert_eq!(one_hot(2, 4), vec![0.0, 0.0, 1.0, 0.0]);
        let parts: [&[f32]; 3] = [&[1.0], &[], &[2.0, 3.0]];
        assert_eq!(concat(&parts), vec![1.0, 2.0, 3.0]);
    }
}
