use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizerError};

/// Parameters of the corpus scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// size of the tokenizer worker pool
    pub workers: usize,
    /// 0-based column holding the document text
    pub text_column: usize,
    /// skip the first row
    pub has_headers: bool,
    /// log progress every n rows, 0 disables it
    pub progress_every: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: rayon::current_num_threads(),
            text_column: 3,
            has_headers: true,
            progress_every: 100_000,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(VectorizerError::InvalidConfig("worker pool size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Order in which surviving tokens receive their ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum VocabularyOrder {
    /// order of first appearance during the scan
    #[default]
    FirstSeen,
    /// byte order of the token strings
    Lexicographic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// tokens are kept only when `df > min_df_threshold`
    pub min_df_threshold: u64,
    pub order: VocabularyOrder,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            min_df_threshold: 10,
            order: VocabularyOrder::FirstSeen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalizationMode {
    /// weight = idf
    #[default]
    Raw,
    /// weight = idf / ||idf||_2
    Normalized,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub mode: NormalizationMode,
}

/// Token classes produced by the tweet tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum TokenClass {
    Word,
    Mention,
    Hashtag,
    Number,
    Url,
}

/// Languages with a snowball stemmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum StemmerLanguage {
    French,
    English,
    German,
    Spanish,
    Italian,
    Portuguese,
}

impl StemmerLanguage {
    pub fn algorithm(self) -> rust_stemmers::Algorithm {
        use rust_stemmers::Algorithm;
        match self {
            StemmerLanguage::French => Algorithm::French,
            StemmerLanguage::English => Algorithm::English,
            StemmerLanguage::German => Algorithm::German,
            StemmerLanguage::Spanish => Algorithm::Spanish,
            StemmerLanguage::Italian => Algorithm::Italian,
            StemmerLanguage::Portuguese => Algorithm::Portuguese,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopwordConfig {
    /// use the bundled french list
    pub builtin_french: bool,
    /// extra list, one word per line
    pub extra_file: Option<PathBuf>,
}

impl Default for StopwordConfig {
    fn default() -> Self {
        Self {
            builtin_french: true,
            extra_file: None,
        }
    }
}

/// Switches of the tweet tokenizer. Fixed for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    /// fold accents and ligatures to ascii
    pub unidecode: bool,
    pub split_hashtags: bool,
    pub decode_html_entities: bool,
    /// collapse elongated words (`loooool` -> `loool`)
    pub reduce_words: bool,
    pub keep: Vec<TokenClass>,
    pub stopwords: StopwordConfig,
    pub stemmer: Option<StemmerLanguage>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            unidecode: true,
            split_hashtags: true,
            decode_html_entities: true,
            reduce_words: true,
            keep: vec![TokenClass::Word, TokenClass::Mention],
            stopwords: StopwordConfig::default(),
            stemmer: None,
        }
    }
}

/// Everything a vectorize run needs besides its paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub scan: ScanConfig,
    pub vocabulary: VocabularyConfig,
    pub encoder: EncoderConfig,
    pub tokenizer: TokenizerConfig,
}

/// Parameters of the nearest neighbor pass over a vectors table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// candidates at this cosine distance or more are ignored
    pub threshold: f64,
    /// number of most recent vectors kept searchable
    pub window: usize,
    /// leading (heaviest) dimensions used to gather candidates
    pub query_size: usize,
    /// stop after this many vectors
    pub limit: Option<usize>,
    /// log progress every n vectors, 0 disables it
    pub progress_every: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            threshold: 0.69,
            window: 1_500_000,
            query_size: 5,
            limit: None,
            progress_every: 100_000,
        }
    }
}

impl LinkConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(VectorizerError::InvalidConfig(format!(
                "distance threshold must be a positive number, got {}",
                self.threshold
            )));
        }
        if self.window == 0 {
            return Err(VectorizerError::InvalidConfig("window must hold at least 1 vector".into()));
        }
        if self.query_size == 0 {
            return Err(VectorizerError::InvalidConfig("query size must be at least 1".into()));
        }
        Ok(())
    }
}
