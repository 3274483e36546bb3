/// This crate turns large collections of short texts (tweets) into sparse TF-IDF vectors.
pub mod config;
pub mod error;
pub mod linker;
pub mod pipeline;
pub mod tokenizer;
pub mod utils;
pub mod vectorizer;

/// TF-IDF Vectorizer
/// The second pass of the pipeline. It holds every document's token set in input
/// order, the document frequency table of the whole corpus and the vocabulary
/// trimmed from it, and encodes documents into sparse vectors.
///
/// Internally, it holds:
/// - The token sets of all documents
/// - The document frequency table (`Corpus`)
/// - The trimmed `Vocabulary` (token -> id, IDF)
/// - The normalization mode
///
/// Build it from a `ScanOutput` (parallel scan) or from documents directly.
/// `write_vectors` writes the `dimensions,weights` table, one row per document.
pub use vectorizer::TFIDFVectorizer;

/// Corpus for TF-IDF Vectorizer
/// Document frequency table.
/// It does not store document text; it only manages:
/// - The number of documents
/// - The number of documents in which each token appears
///
/// Tokens are kept in first seen order, which is the default vocabulary id order.
///
/// # Serialization
/// Supported.
pub use vectorizer::corpus::Corpus;

/// Parallel corpus scan
/// `CorpusScanner` reads a csv table, tokenizes its text column in a worker
/// pool and merges the results in input order on the calling thread.
/// `ScanOutput` carries the documents, the corpus and the skipped rows.
pub use vectorizer::corpus::scanner::{CorpusScanner, ScanOutput};

/// Token Set structure
/// The unique tokens of one document, in order of first appearance.
/// A token counts at most once per document for document frequency.
pub use vectorizer::token::TokenSet;

/// Vocabulary
/// Tokens retained as vector dimensions (`df > threshold`), with a dense id
/// and an IDF weight each. Immutable once built.
///
/// # Serialization
/// `Vocabulary::save` / `Vocabulary::load` go through `VocabularyData`, a
/// CBOR document that also records the run parameters.
pub use vectorizer::vocabulary::{VocabEntry, Vocabulary};
pub use vectorizer::serde::VocabularyData;

/// Sparse vectors and their encoder
/// - `SparseVector`: (id, weight) pairs, weight descending then id descending
/// - `VectorEncoder`: maps a `TokenSet` to a `SparseVector`, raw or L2 normalized
pub use vectorizer::encoder::{SparseVector, VectorEncoder};

/// IDF Calculation Engine Trait
/// By implementing this trait, you can plug a different IDF weighting into
/// `Vocabulary::build_with` and `TFIDFVectorizer::with_engine`.
/// The default, `DefaultIDFEngine`, computes `1 + ln((N + 1) / (df + 1))`.
pub use vectorizer::tfidf::{DefaultIDFEngine, IDFEngine};

/// Tokenizers
/// - `Tokenizer`: the text -> token set interface the scanner calls
/// - `TweetTokenizer`: rule based tweet tokenizer (entities, hashtags, folding, stopwords, stemming)
/// - `WhitespaceTokenizer`: whitespace split
pub use tokenizer::{Tokenizer, TweetTokenizer, WhitespaceTokenizer};

/// Errors
pub use error::{Result, RowError, VectorizerError};

/// Configuration
pub use config::{
    EncoderConfig, LinkConfig, NormalizationMode, PipelineConfig, ScanConfig, TokenClass,
    TokenizerConfig, VocabularyConfig, VocabularyOrder,
};

/// Entry points of the two passes
/// - `run_vectorize`: input table -> vectors table (+ vocabulary)
/// - `run_link`: vectors table -> nearest neighbors table
pub use linker::{run_link, LinkSummary, NeighborLinker};
pub use pipeline::{run_vectorize, RunSummary};
