pub mod corpus;
pub mod encoder;
pub mod serde;
pub mod tfidf;
pub mod token;
pub mod vocabulary;

use std::{fs::File, io, path::Path};

use crate::{
    config::{NormalizationMode, VocabularyConfig},
    error::{Result, VectorizerError},
    vectorizer::{
        corpus::{scanner::ScanOutput, Corpus},
        encoder::{SparseVector, VectorEncoder},
        tfidf::{DefaultIDFEngine, IDFEngine},
        token::TokenSet,
        vocabulary::Vocabulary,
    },
};

/// Header of the vectors table.
pub const VECTORS_HEADER: [&str; 2] = ["dimensions", "weights"];

/// Second pass of the pipeline.
///
/// Keeps every document's token set resident next to the finished corpus and
/// the vocabulary derived from it. IDF needs the document frequency of the
/// whole corpus, so nothing can be encoded before the scan is over.
///
/// Rows the scan could not decode have no document but keep their place in
/// the output table as an empty row.
#[derive(Debug, Clone)]
pub struct TFIDFVectorizer {
    /// token sets in input order
    pub documents: Vec<TokenSet>,
    /// input rows without a document, ascending
    pub skipped_rows: Vec<usize>,
    /// document frequency table over `documents`
    pub corpus: Corpus,
    pub vocabulary: Vocabulary,
    mode: NormalizationMode,
}

/// Counters of a write pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub rows: usize,
    /// documents with no surviving token
    pub empty_rows: usize,
    /// placeholder rows of undecodable input rows
    pub skipped_rows: usize,
}

impl TFIDFVectorizer {
    /// Build the vocabulary from a finished corpus with the default IDF.
    pub fn new(
        documents: Vec<TokenSet>,
        corpus: Corpus,
        vocab_config: &VocabularyConfig,
        mode: NormalizationMode,
    ) -> Result<Self> {
        Self::with_engine::<DefaultIDFEngine>(documents, corpus, vocab_config, mode)
    }

    pub fn with_engine<E: IDFEngine>(
        documents: Vec<TokenSet>,
        corpus: Corpus,
        vocab_config: &VocabularyConfig,
        mode: NormalizationMode,
    ) -> Result<Self> {
        debug_assert_eq!(corpus.get_doc_num(), documents.len() as u64);
        let vocabulary = Vocabulary::build_with::<E>(&corpus, vocab_config)?;
        Ok(Self {
            documents,
            skipped_rows: Vec::new(),
            corpus,
            vocabulary,
            mode,
        })
    }

    /// Keeps the positions of the skipped rows for the output table.
    pub fn from_scan(
        scan: ScanOutput,
        vocab_config: &VocabularyConfig,
        mode: NormalizationMode,
    ) -> Result<Self> {
        let mut vectorizer = Self::new(scan.documents, scan.corpus, vocab_config, mode)?;
        vectorizer.skipped_rows = scan.skipped.into_iter().map(|row| row.index).collect();
        debug_assert!(vectorizer.skipped_rows.windows(2).all(|w| w[0] < w[1]));
        Ok(vectorizer)
    }

    /// Count the documents sequentially, then build.
    pub fn from_documents(
        documents: Vec<TokenSet>,
        vocab_config: &VocabularyConfig,
        mode: NormalizationMode,
    ) -> Result<Self> {
        let mut corpus = Corpus::new();
        for doc in &documents {
            corpus.add_set(doc);
        }
        Self::new(documents, corpus, vocab_config, mode)
    }

    pub fn doc_num(&self) -> usize {
        self.documents.len()
    }

    /// input rows covered, skipped ones included
    pub fn row_count(&self) -> usize {
        self.documents.len() + self.skipped_rows.len()
    }

    /// The document of every input row in input order, `None` for a skipped row.
    pub fn rows(&self) -> impl Iterator<Item = Option<&TokenSet>> + '_ {
        let mut documents = self.documents.iter();
        let mut skipped = self.skipped_rows.iter().peekable();
        (0..self.row_count()).map(move |row| {
            if skipped.next_if_eq(&&row).is_some() {
                None
            } else {
                documents.next()
            }
        })
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    pub fn encoder(&self) -> VectorEncoder<'_> {
        VectorEncoder::new(&self.vocabulary, self.mode)
    }

    /// Vector of the document at `index` (input order).
    pub fn vector(&self, index: usize) -> Option<SparseVector> {
        self.documents.get(index).map(|doc| self.encoder().encode(doc))
    }

    /// All vectors in input order.
    pub fn vectors(&self) -> impl Iterator<Item = SparseVector> + '_ {
        let encoder = self.encoder();
        self.documents.iter().map(move |doc| encoder.encode(doc))
    }

    /// Write the `dimensions,weights` table, one row per input row.
    /// Skipped rows are written with two empty fields.
    pub fn write_vectors<W: io::Write>(&self, writer: W) -> csv::Result<WriteStats> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(VECTORS_HEADER)?;
        let encoder = self.encoder();
        let mut stats = WriteStats::default();
        for row in self.rows() {
            let vector = match row {
                Some(doc) => encoder.encode(doc),
                None => {
                    stats.skipped_rows += 1;
                    SparseVector::empty()
                }
            };
            if row.is_some() && vector.is_empty() {
                stats.empty_rows += 1;
            }
            wtr.write_record([vector.dimensions_field(), vector.weights_field()])?;
            stats.rows += 1;
        }
        wtr.flush()?;
        Ok(stats)
    }

    pub fn write_vectors_to_path<P: AsRef<Path>>(&self, path: P) -> Result<WriteStats> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| VectorizerError::output_io(path, source))?;
        self.write_vectors(io::BufWriter::new(file))
            .map_err(|err| VectorizerError::from_output_csv(path, err))
    }

    /// Log vocabulary sizes and the `top` most frequent tokens.
    pub fn log_diagnostics(&self, top: usize) {
        log::info!("Size of vocabulary: {}", self.vocabulary.vocabulary_size());
        log::info!(
            "Size of vocabulary after df trimming (df > {}): {}",
            self.vocabulary.min_df_threshold(),
            self.vocabulary.trimmed_vocabulary_size()
        );
        if top == 0 {
            return;
        }
        for (rank, (token, df)) in self.corpus.most_common(top).into_iter().enumerate() {
            log::info!(
                "#{:<3} {:<24} df={:<10} {:.4}%",
                rank + 1,
                token,
                df,
                self.corpus.relative_frequency(token) * 100.0
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ScanConfig, VocabularyOrder},
        tokenizer::WhitespaceTokenizer,
        vectorizer::corpus::scanner::CorpusScanner,
    };

    fn docs(raw: &[&str]) -> Vec<TokenSet> {
        raw.iter().map(|text| text.split_whitespace().collect()).collect()
    }

    fn config(threshold: u64) -> VocabularyConfig {
        VocabularyConfig {
            min_df_threshold: threshold,
            order: VocabularyOrder::FirstSeen,
        }
    }

    fn render(vectorizer: &TFIDFVectorizer) -> String {
        let mut out = Vec::new();
        vectorizer.write_vectors(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn read_back(table: &str) -> Vec<(String, String)> {
        let mut rdr = csv::Reader::from_reader(table.as_bytes());
        assert!(rdr.headers().unwrap().iter().eq(VECTORS_HEADER));
        rdr.records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_owned(), r[1].to_owned())
            })
            .collect()
    }

    #[test]
    fn three_animals_table() {
        let v = TFIDFVectorizer::from_documents(
            docs(&["cat dog", "dog fish", "cat fish"]),
            &config(0),
            NormalizationMode::Raw,
        )
        .unwrap();
        let w = ryu::Buffer::new().format(1.0 + (4.0f64 / 3.0).ln()).to_owned();
        let lines: Vec<String> = render(&v).lines().map(str::to_owned).collect();
        assert_eq!(
            lines,
            vec![
                "dimensions,weights".to_owned(),
                format!("1|0,{w}|{w}"),
                format!("2|1,{w}|{w}"),
                format!("2|0,{w}|{w}"),
            ]
        );
    }

    #[test]
    fn below_threshold_document_gives_empty_fields() {
        let v = TFIDFVectorizer::from_documents(
            docs(&["a b", "a", "rare", ""]),
            &config(1),
            NormalizationMode::Raw,
        )
        .unwrap();
        let rows = read_back(&render(&v));
        assert_eq!(rows.len(), 4);
        let idf_a = ryu::Buffer::new().format(v.vocabulary.get("a").unwrap().idf).to_owned();
        assert_eq!(rows[0], ("0".to_owned(), idf_a));
        assert_eq!(rows[2], (String::new(), String::new()));
        assert_eq!(rows[3], (String::new(), String::new()));

        let stats = v.write_vectors(io::sink()).unwrap();
        assert_eq!(
            stats,
            WriteStats {
                rows: 4,
                empty_rows: 2,
                skipped_rows: 0
            }
        );
    }

    #[test]
    fn skipped_rows_keep_their_place() {
        let data = "id,text\n0,cat dog\n1\n2,dog fish\n3,cat fish\n";
        let scan = CorpusScanner::new(
            &WhitespaceTokenizer,
            ScanConfig {
                workers: 2,
                text_column: 1,
                has_headers: true,
                progress_every: 0,
            },
        )
        .scan_reader(data.as_bytes(), Path::new("mem.csv"))
        .unwrap();
        let v = TFIDFVectorizer::from_scan(scan, &config(0), NormalizationMode::Raw).unwrap();
        assert_eq!(v.doc_num(), 3);
        assert_eq!(v.corpus.get_doc_num(), 3);
        assert_eq!(v.skipped_rows, vec![1]);
        assert_eq!(v.row_count(), 4);
        assert_eq!(v.rows().map(|row| row.is_some()).collect::<Vec<_>>(), vec![true, false, true, true]);

        let rows = read_back(&render(&v));
        let dims: Vec<&str> = rows.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(dims, vec!["1|0", "", "2|1", "2|0"]);
        let stats = v.write_vectors(io::sink()).unwrap();
        assert_eq!(
            stats,
            WriteStats {
                rows: 4,
                empty_rows: 0,
                skipped_rows: 1
            }
        );
    }

    #[test]
    fn every_dimension_is_a_vocabulary_id() {
        let v = TFIDFVectorizer::from_documents(
            docs(&["a b c", "a b", "b c d", "d e", "a e f"]),
            &config(1),
            NormalizationMode::Normalized,
        )
        .unwrap();
        for vector in v.vectors() {
            for (dim, _) in vector.iter() {
                let token = v.vocabulary.token(dim).unwrap();
                assert!(v.corpus.get_token_count(token) > 1);
            }
        }
        assert!(v.vector(5).is_none());
    }

    #[test]
    fn output_is_reproducible() {
        let build = || {
            TFIDFVectorizer::from_documents(
                docs(&["x y z", "y z", "z w", "w x y"]),
                &config(0),
                NormalizationMode::Normalized,
            )
            .unwrap()
        };
        assert_eq!(render(&build()), render(&build()));
    }

    #[test]
    fn empty_corpus_writes_only_the_header() {
        let v = TFIDFVectorizer::from_documents(Vec::new(), &config(0), NormalizationMode::Raw)
            .unwrap();
        assert!(v.vocabulary.is_empty());
        assert_eq!(render(&v).lines().collect::<Vec<_>>(), vec!["dimensions,weights"]);
    }

    #[test]
    fn unwritable_output_is_fatal() {
        let v = TFIDFVectorizer::from_documents(docs(&["a"]), &config(0), NormalizationMode::Raw)
            .unwrap();
        let err = v.write_vectors_to_path("/no/such/dir/vectors.csv").unwrap_err();
        assert!(matches!(err, VectorizerError::OutputIo { .. }));
    }
}
