use std::{
    collections::HashSet,
    fmt::{self, Write as _},
};

use serde::{Deserialize, Serialize};

use crate::{
    config::NormalizationMode,
    utils::{math::l2_normalize, sort::sort_by_weight_desc},
    vectorizer::{token::TokenSet, vocabulary::Vocabulary},
};

/// Separator inside the `dimensions` and `weights` fields.
pub const FIELD_SEPARATOR: char = '|';

/// A document as (dimension id, weight) pairs.
///
/// Stored as two parallel arrays sorted by weight descending, ties broken by
/// id descending. Ids are unique within a vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub dims: Vec<u32>,
    pub weights: Vec<f64>,
}

impl SparseVector {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from pairs, sorting them into encoding order.
    pub fn from_pairs(mut pairs: Vec<(u32, f64)>) -> Self {
        sort_by_weight_desc(&mut pairs);
        let (dims, weights) = pairs.into_iter().unzip();
        Self { dims, weights }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.dims.iter().copied().zip(self.weights.iter().copied())
    }

    /// The `dimensions` field: ids joined by `|`.
    pub fn dimensions_field(&self) -> String {
        let mut out = String::with_capacity(self.dims.len() * 6);
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                out.push(FIELD_SEPARATOR);
            }
            let _ = write!(out, "{dim}");
        }
        out
    }

    /// The `weights` field: shortest round-trip decimal of each weight.
    pub fn weights_field(&self) -> String {
        let mut buffer = ryu::Buffer::new();
        let mut out = String::with_capacity(self.weights.len() * 20);
        for (i, weight) in self.weights.iter().enumerate() {
            if i > 0 {
                out.push(FIELD_SEPARATOR);
            }
            out.push_str(buffer.format(*weight));
        }
        out
    }

    /// Inverse of the two fields. Empty fields give an empty vector; a repeated
    /// dimension id is an error.
    pub fn parse(dimensions: &str, weights: &str) -> Result<Self, String> {
        if dimensions.is_empty() && weights.is_empty() {
            return Ok(Self::empty());
        }
        let dims = dimensions
            .split(FIELD_SEPARATOR)
            .map(|d| d.parse::<u32>().map_err(|e| format!("bad dimension {d:?}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        let weights = weights
            .split(FIELD_SEPARATOR)
            .map(|w| w.parse::<f64>().map_err(|e| format!("bad weight {w:?}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        if dims.len() != weights.len() {
            return Err(format!(
                "{} dimensions but {} weights",
                dims.len(),
                weights.len()
            ));
        }
        let mut seen = HashSet::with_capacity(dims.len());
        if let Some(d) = dims.iter().find(|&&d| !seen.insert(d)) {
            return Err(format!("duplicate dimension {d}"));
        }
        Ok(Self { dims, weights })
    }
}

impl fmt::Display for SparseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.dimensions_field(), self.weights_field())
    }
}

/// Turns token sets into sparse vectors against a fixed vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct VectorEncoder<'v> {
    vocabulary: &'v Vocabulary,
    mode: NormalizationMode,
}

impl<'v> VectorEncoder<'v> {
    pub fn new(vocabulary: &'v Vocabulary, mode: NormalizationMode) -> Self {
        Self { vocabulary, mode }
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    /// Map the document's tokens to (id, idf), drop the ones outside the
    /// vocabulary, optionally L2 normalize, then sort.
    pub fn encode(&self, doc: &TokenSet) -> SparseVector {
        let mut dims = Vec::with_capacity(doc.len());
        let mut weights = Vec::with_capacity(doc.len());
        for token in doc.iter() {
            if let Some(entry) = self.vocabulary.get(token) {
                dims.push(entry.id);
                weights.push(entry.idf);
            }
        }
        if dims.is_empty() {
            return SparseVector::empty();
        }
        if self.mode == NormalizationMode::Normalized && !l2_normalize(&mut weights) {
            // only reachable with a zero weight engine
            return SparseVector::empty();
        }
        SparseVector::from_pairs(dims.into_iter().zip(weights).collect())
    }
}
