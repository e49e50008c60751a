use bugseed_core::Result;

use crate::VectorError;

/// Scalar vector arithmetic used by the similarity and analogy code.
pub struct VectorOps;

impl VectorOps {
    fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
        if a.len() != b.len() {
            return Err(VectorError::DimensionMismatch(a.len(), b.len()).into());
        }
        Ok(())
    }

    /// Cosine similarity. A zero vector is similar to nothing (0.0).
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
        Self::check_dimensions(a, b)?;

        let mut dot_product = 0.0f32;
        let mut norm_a_squared = 0.0f32;
        let mut norm_b_squared = 0.0f32;

        for (&va, &vb) in a.iter().zip(b.iter()) {
            dot_product += va * vb;
            norm_a_squared += va * va;
            norm_b_squared += vb * vb;
        }

        let norm_product = (norm_a_squared * norm_b_squared).sqrt();
        if norm_product == 0.0 {
            Ok(0.0)
        } else {
            Ok(dot_product / norm_product)
        }
    }

    /// `1 - cosine_similarity`, rounded to three decimals.
    pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
        Ok(round3(1.0 - Self::cosine_similarity(a, b)?))
    }

    /// `a - b + c`, element-wise.
    pub fn offset(a: &[f32], b: &[f32], c: &[f32]) -> Result<Vec<f32>> {
        Self::check_dimensions(a, b)?;
        Self::check_dimensions(a, c)?;
        Ok(a.iter()
            .zip(b.iter())
            .zip(c.iter())
            .map(|((x, y), z)| x - y + z)
            .collect())
    }

    /// Element-wise mean of equally sized vectors.
    pub fn mean(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
        let first = vectors.first().ok_or(VectorError::EmptyVector)?;
        let mut sum = vec![0.0f32; first.len()];
        for vector in vectors {
            Self::check_dimensions(&sum, vector)?;
            for (acc, v) in sum.iter_mut().zip(vector.iter()) {
                *acc += v;
            }
        }
        let count = vectors.len() as f32;
        sum.iter_mut().for_each(|v| *v /= count);
        Ok(sum)
    }
}

/// Rounds to three decimals.
pub fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
