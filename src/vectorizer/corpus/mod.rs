pub mod scanner;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::vectorizer::token::TokenSet;

/// Document frequency table.
///
/// Keeps the number of documents and, for every token, the number of documents
/// containing it at least once. Tokens are stored in the order they were
/// first counted, so iterating the table is deterministic as long as documents
/// are added in a deterministic order.
///
/// Owned by a single aggregator; workers never touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    /// number of documents added
    doc_num: u64,
    /// token -> document frequency
    #[serde(with = "indexmap::map::serde_seq")]
    token_counts: IndexMap<Box<str>, u64>,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            doc_num: 0,
            token_counts: IndexMap::new(),
        }
    }

    /// Count one document. Its tokens are unique, so each gets at most +1.
    pub fn add_set(&mut self, doc: &TokenSet) {
        self.doc_num += 1;
        for token in doc.iter() {
            if let Some(count) = self.token_counts.get_mut(token) {
                *count += 1;
            } else {
                self.token_counts.insert(token.into(), 1);
            }
        }
    }

    /// Get the number of documents in the corpus
    #[inline]
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num
    }

    /// document frequency, 0 for unknown tokens
    #[inline]
    pub fn get_token_count(&self, token: &str) -> u64 {
        self.token_counts.get(token).copied().unwrap_or(0)
    }

    /// Get the current vocabulary size (number of unique tokens)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.token_counts.len()
    }

    /// (token, df) in first counted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.token_counts.iter().map(|(token, &df)| (token.as_ref(), df))
    }
}

/// for analyze usage
impl Corpus {
    /// The `k` most frequent tokens, df descending then token ascending.
    pub fn most_common(&self, k: usize) -> Vec<(&str, u64)> {
        let mut list: Vec<(&str, u64)> = self.iter().collect();
        list.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        list.truncate(k);
        list
    }

    /// df / N, 0.0 on an empty corpus
    pub fn relative_frequency(&self, token: &str) -> f64 {
        if self.doc_num == 0 {
            return 0.0;
        }
        self.get_token_count(token) as f64 / self.doc_num as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(tokens: &[&str]) -> TokenSet {
        tokens.iter().collect()
    }

    #[test]
    fn counts_documents_not_occurrences() {
        let mut corpus = Corpus::new();
        corpus.add_set(&doc(&["cat", "dog", "cat"]));
        corpus.add_set(&doc(&["dog", "fish"]));
        corpus.add_set(&doc(&[]));

        assert_eq!(corpus.get_doc_num(), 3);
        assert_eq!(corpus.get_token_count("cat"), 1);
        assert_eq!(corpus.get_token_count("dog"), 2);
        assert_eq!(corpus.get_token_count("bird"), 0);
        assert_eq!(corpus.vocab_size(), 3);
    }

    #[test]
    fn iteration_follows_first_count() {
        let mut corpus = Corpus::new();
        corpus.add_set(&doc(&["b", "a"]));
        corpus.add_set(&doc(&["c", "a"]));
        let order: Vec<&str> = corpus.iter().map(|(t, _)| t).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn most_common_breaks_ties_on_token() {
        let mut corpus = Corpus::new();
        corpus.add_set(&doc(&["z", "y", "x"]));
        corpus.add_set(&doc(&["z", "y"]));
        corpus.add_set(&doc(&["y"]));
        corpus.add_set(&doc(&["x"]));
        assert_eq!(corpus.most_common(2), vec![("y", 3), ("x", 2)]);
        assert_eq!(corpus.most_common(10).len(), 3);
        assert_eq!(corpus.relative_frequency("y"), 0.75);
        assert_eq!(Corpus::new().relative_frequency("y"), 0.0);
    }

    #[test]
    fn serde_roundtrip_cbor_keeps_order() {
        let mut corpus = Corpus::new();
        corpus.add_set(&doc(&["b", "a", "c"]));
        let bytes = serde_cbor::to_vec(&corpus).unwrap();
        let de: Corpus = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(de, corpus);
        assert_eq!(de.iter().map(|(t, _)| t).collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }
}
