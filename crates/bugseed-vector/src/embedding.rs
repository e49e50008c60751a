//! Precomputed embedding tables.
//!
//! The tables are opaque oracles trained elsewhere: identifier names, type
//! names, AST node types and source tokens each map to a fixed-length vector.
//! On disk a table is a JSON object `{ "key": [f32, ...], ... }`.

use bugseed_core::{BugSeedError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::VectorError;

/// Read-only key to vector lookup. Absent keys mean "no vector available".
pub trait EmbeddingLookup: Send + Sync {
    fn dimension(&self) -> usize;
    fn lookup(&self, key: &str) -> Option<&[f32]>;

    fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }
}

/// Token embeddings always answer; unknown tokens map to the zero vector.
pub trait TokenEmbedder: Send + Sync {
    fn dimension(&self) -> usize;
    fn embed(&self, token: &str) -> Cow<'_, [f32]>;
}

#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    name: String,
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingTable {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            vectors: HashMap::new(),
        }
    }

    /// Builds a table, requiring every vector to share one dimension.
    pub fn from_map(name: impl Into<String>, vectors: HashMap<String, Vec<f32>>) -> Result<Self> {
        let name = name.into();
        let dimension = vectors.values().next().map(Vec::len).unwrap_or(0);
        if let Some((key, v)) = vectors.iter().find(|(_, v)| v.len() != dimension) {
            return Err(VectorError::InvalidTable {
                table: name,
                reason: format!(
                    "vector for '{}' has {} entries, expected {}",
                    key,
                    v.len(),
                    dimension
                ),
            }
            .into());
        }
        Ok(Self {
            name,
            dimension,
            vectors,
        })
    }

    pub fn from_json_str(name: impl Into<String>, json: &str) -> Result<Self> {
        let vectors: HashMap<String, Vec<f32>> = serde_json::from_str(json)?;
        Self::from_map(name, vectors)
    }

    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self> {
        let name = name.into();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BugSeedError::Embedding(format!("failed to read {}: {}", path.display(), e))
        })?;
        let table = Self::from_json_str(name, &content)?;
        info!(
            "Loaded {} embedding table: {} vectors of dimension {} from {}",
            table.name,
            table.len(),
            table.dimension,
            path.display()
        );
        Ok(table)
    }

    pub fn insert(&mut self, key: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        if self.vectors.is_empty() && self.dimension == 0 {
            self.dimension = vector.len();
        }
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch(self.dimension, vector.len()).into());
        }
        self.vectors.insert(key.into(), vector);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl EmbeddingLookup for EmbeddingTable {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn lookup(&self, key: &str) -> Option<&[f32]> {
        self.vectors.get(key).map(Vec::as_slice)
    }
}

impl TokenEmbedder for EmbeddingTable {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, token: &str) -> Cow<'_, [f32]> {
        match self.vectors.get(token) {
            Some(v) => Cow::Borrowed(v.as_slice()),
            None => Cow::Owned(vec![0.0; self.dimension]),
        }
    }
}

/// The three lookups the vectorizers consult, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingOracles {
    pub names: EmbeddingTable,
    pub types: EmbeddingTable,
    pub node_types: EmbeddingTable,
}

impl EmbeddingOracles {
    pub fn new(names: EmbeddingTable, types: EmbeddingTable, node_types: EmbeddingTable) -> Self {
        Self {
            names,
            types,
            node_types,
        }
    }

    pub fn load(names: &Path, types: &Path, node_types: &Path) -> Result<Self> {
        Ok(Self::new(
            EmbeddingTable::load("name", names)?,
            EmbeddingTable::load("type", types)?,
            EmbeddingTable::load("node type", node_types)?,
        ))
    }
}
