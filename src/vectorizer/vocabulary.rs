use indexmap::IndexMap;

use crate::{
    config::{VocabularyConfig, VocabularyOrder},
    error::{Result, VectorizerError},
    vectorizer::{
        corpus::Corpus,
        tfidf::{DefaultIDFEngine, IDFEngine},
    },
};

/// A retained token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VocabEntry {
    /// dense dimension id, 0-based
    pub id: u32,
    /// document frequency
    pub df: u64,
    pub idf: f64,
}

/// Ids are `u32`, so a vocabulary holds at most `u32::MAX` tokens.
pub(crate) fn check_dimension_count(size: usize) -> Result<()> {
    match u32::try_from(size) {
        Ok(_) => Ok(()),
        Err(_) => Err(VectorizerError::VocabularyTooLarge { size }),
    }
}

/// Tokens kept as vector dimensions, with their id and IDF weight.
///
/// Built once from a finished [`Corpus`]; immutable afterwards. Entries are
/// stored in id order, so `token(id)` is a plain index lookup.
/// Ids are only meaningful for the run that built them.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    pub(crate) entries: IndexMap<Box<str>, VocabEntry>,
    pub(crate) doc_num: u64,
    pub(crate) min_df_threshold: u64,
    pub(crate) order: VocabularyOrder,
    /// distinct tokens before trimming
    pub(crate) vocabulary_size: usize,
}

impl Vocabulary {
    /// Trim the table with the default smoothed IDF.
    pub fn build(corpus: &Corpus, config: &VocabularyConfig) -> Result<Self> {
        Self::build_with::<DefaultIDFEngine>(corpus, config)
    }

    /// Keep the tokens with `df > min_df_threshold`, assign ids in the
    /// configured order and weight them with `E`.
    /// An empty corpus gives an empty vocabulary. Fails when more tokens
    /// survive than a `u32` id can address.
    pub fn build_with<E: IDFEngine>(corpus: &Corpus, config: &VocabularyConfig) -> Result<Self> {
        let doc_num = corpus.get_doc_num();
        let mut vocab = Self {
            entries: IndexMap::new(),
            doc_num,
            min_df_threshold: config.min_df_threshold,
            order: config.order,
            vocabulary_size: corpus.vocab_size(),
        };
        if doc_num == 0 {
            return Ok(vocab);
        }

        let mut kept: Vec<(&str, u64)> = corpus
            .iter()
            .filter(|&(_, df)| df > config.min_df_threshold)
            .collect();
        check_dimension_count(kept.len())?;
        if config.order == VocabularyOrder::Lexicographic {
            kept.sort_unstable_by(|a, b| a.0.cmp(b.0));
        }

        vocab.entries.reserve(kept.len());
        for (id, (token, df)) in (0u32..).zip(kept) {
            vocab.entries.insert(
                token.into(),
                VocabEntry {
                    id,
                    df,
                    idf: E::idf(doc_num, df),
                },
            );
        }
        Ok(vocab)
    }

    #[inline]
    pub fn get(&self, token: &str) -> Option<&VocabEntry> {
        self.entries.get(token)
    }

    /// reverse lookup
    #[inline]
    pub fn token(&self, id: u32) -> Option<&str> {
        self.entries.get_index(id as usize).map(|(token, _)| token.as_ref())
    }

    #[inline]
    pub fn contains_id(&self, id: u32) -> bool {
        (id as usize) < self.entries.len()
    }

    /// (token, entry) in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VocabEntry)> + '_ {
        self.entries.iter().map(|(token, entry)| (token.as_ref(), entry))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// distinct tokens before trimming
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    /// distinct tokens after trimming
    pub fn trimmed_vocabulary_size(&self) -> usize {
        self.entries.len()
    }

    /// corpus size the weights were computed with
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    pub fn min_df_threshold(&self) -> u64 {
        self.min_df_threshold
    }

    pub fn order(&self) -> VocabularyOrder {
        self.order
    }
}
