use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    config::{PipelineConfig, VocabularyOrder},
    error::{Result, VectorizerError},
    vectorizer::vocabulary::{check_dimension_count, VocabEntry, Vocabulary},
};

/// One vocabulary row as stored on disk; its position is its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabRecord {
    pub token: String,
    pub df: u64,
    pub idf: f64,
}

/// Vocabularyのシリアライズ用のデータ構造
/// Self contained and written as CBOR. `into_vocabulary` rebuilds the exact
/// same ids and weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyData {
    /// tokens in id order
    pub tokens: Vec<VocabRecord>,
    pub doc_num: u64,
    pub min_df_threshold: u64,
    pub order: VocabularyOrder,
    /// distinct tokens before trimming
    pub vocabulary_size: usize,
    /// parameters of the run that produced it
    pub config: Option<PipelineConfig>,
}

impl VocabularyData {
    pub fn from_vocabulary(vocab: &Vocabulary, config: Option<&PipelineConfig>) -> Self {
        Self {
            tokens: vocab
                .iter()
                .map(|(token, entry)| VocabRecord {
                    token: token.to_owned(),
                    df: entry.df,
                    idf: entry.idf,
                })
                .collect(),
            doc_num: vocab.doc_num(),
            min_df_threshold: vocab.min_df_threshold(),
            order: vocab.order(),
            vocabulary_size: vocab.vocabulary_size(),
            config: config.cloned(),
        }
    }

    /// Fails on duplicate tokens, which would break the id mapping, and on
    /// more tokens than `u32` ids.
    pub fn into_vocabulary(self) -> std::result::Result<Vocabulary, String> {
        check_dimension_count(self.tokens.len()).map_err(|e| e.to_string())?;
        let mut entries = IndexMap::with_capacity(self.tokens.len());
        for (id, record) in (0u32..).zip(self.tokens) {
            let entry = VocabEntry {
                id,
                df: record.df,
                idf: record.idf,
            };
            if entries.insert(record.token.into_boxed_str(), entry).is_some() {
                return Err(format!("duplicate token at id {id}"));
            }
        }
        Ok(Vocabulary {
            entries,
            doc_num: self.doc_num,
            min_df_threshold: self.min_df_threshold,
            order: self.order,
            vocabulary_size: self.vocabulary_size,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let persist_err = |reason: String| VectorizerError::Persist {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::create(path).map_err(|e| persist_err(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_cbor::to_writer(&mut writer, self).map_err(|e| persist_err(e.to_string()))?;
        writer.flush().map_err(|e| persist_err(e.to_string()))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let persist_err = |reason: String| VectorizerError::Persist {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|e| persist_err(e.to_string()))?;
        serde_cbor::from_reader(BufReader::new(file)).map_err(|e| persist_err(e.to_string()))
    }
}

impl Vocabulary {
    /// Write the vocabulary, and optionally the run parameters, as CBOR.
    pub fn save<P: AsRef<Path>>(&self, path: P, config: Option<&PipelineConfig>) -> Result<()> {
        VocabularyData::from_vocabulary(self, config).save(path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        VocabularyData::load(path)?
            .into_vocabulary()
            .map_err(|reason| VectorizerError::Persist {
                path: path.to_path_buf(),
                reason,
            })
    }
}
