//! Embedding vector type shared by the similarity-matching stage and the
//! `VectorIndex` boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedding vector with dynamic dimensions, so any embedding model
/// (384, 768, 1536, ...) can be plugged in without a recompile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    pub data: Vec<f32>,
    pub model_id: String,
    pub dimensions: i32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: i32, got: i32 },
}

impl EmbeddingVector {
    pub fn new(data: Vec<f32>, model_id: impl Into<String>) -> Self {
        let dimensions = data.len() as i32;
        Self {
            data,
            model_id: model_id.into(),
            dimensions,
        }
    }

    /// Cosine similarity against another vector of the same dimensionality.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> Result<f32, VectorError> {
        if self.dimensions != other.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: other.dimensions,
            });
        }

        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for (a, b) in self.data.iter().zip(other.data.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }
        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom == 0.0 {
            return Ok(0.0);
        }
        Ok(dot / denom)
    }

    pub fn is_valid(&self) -> bool {
        self.dimensions > 0 && self.data.len() == self.dimensions as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = EmbeddingVector::new(vec![1.0, 0.0, 0.0], "test");
        let sim = v.cosine_similarity(&v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_dimensions_error() {
        let a = EmbeddingVector::new(vec![1.0, 0.0], "test");
        let b = EmbeddingVector::new(vec![1.0, 0.0, 0.0], "test");
        assert!(a.cosine_similarity(&b).is_err());
    }
}
