use std::{
    path::Path,
    time::{Duration, Instant},
};

use crate::{
    config::PipelineConfig,
    error::Result,
    tokenizer::Tokenizer,
    vectorizer::{corpus::scanner::CorpusScanner, TFIDFVectorizer},
};

/// number of most frequent tokens listed in the run diagnostics
pub const TOP_TOKENS: usize = 20;

/// Counters of a finished `vectorize` run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// data rows read, skipped ones included
    pub rows: usize,
    pub documents: usize,
    pub skipped: usize,
    pub vocabulary_size: usize,
    pub trimmed_vocabulary_size: usize,
    /// decoded documents with no surviving token
    pub empty_vectors: usize,
    pub elapsed: Duration,
}

/// Scan `input`, build the vocabulary, write the vectors table to `output`
/// and, when asked, the vocabulary to `vocabulary_path`.
///
/// Row level decode errors never abort the run; they are counted in the
/// summary and keep their place in the output as empty rows. Any I/O failure
/// on the input, the output or the vocabulary file does.
pub fn run_vectorize<T: Tokenizer + ?Sized>(
    input: &Path,
    output: &Path,
    vocabulary_path: Option<&Path>,
    config: &PipelineConfig,
    tokenizer: &T,
) -> Result<RunSummary> {
    let start = Instant::now();

    let scan = CorpusScanner::new(tokenizer, config.scan.clone()).scan_path(input)?;
    let rows = scan.rows;
    let skipped = scan.skipped.len();

    let vectorizer = TFIDFVectorizer::from_scan(scan, &config.vocabulary, config.encoder.mode)?;
    vectorizer.log_diagnostics(TOP_TOKENS);

    if let Some(path) = vocabulary_path {
        vectorizer.vocabulary.save(path, Some(config))?;
        log::info!("vocabulary written to {}", path.display());
    }

    let stats = vectorizer.write_vectors_to_path(output)?;
    log::info!(
        "wrote {} vectors to {} ({} empty)",
        stats.rows,
        output.display(),
        stats.empty_rows
    );
    if skipped > 0 {
        log::warn!("{skipped} rows could not be decoded, written as empty vectors");
    }

    Ok(RunSummary {
        rows,
        documents: vectorizer.doc_num(),
        skipped,
        vocabulary_size: vectorizer.vocabulary.vocabulary_size(),
        trimmed_vocabulary_size: vectorizer.vocabulary.trimmed_vocabulary_size(),
        empty_vectors: stats.empty_rows,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        config::{ScanConfig, VocabularyConfig},
        error::VectorizerError,
        tokenizer::WhitespaceTokenizer,
        vectorizer::vocabulary::Vocabulary,
    };

    fn config() -> PipelineConfig {
        PipelineConfig {
            scan: ScanConfig {
                workers: 2,
                text_column: 1,
                has_headers: true,
                progress_every: 0,
            },
            vocabulary: VocabularyConfig {
                min_df_threshold: 0,
                ..VocabularyConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn summary_counts_rows_and_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tweets.csv");
        let output = dir.path().join("vectors.csv");
        let vocab = dir.path().join("vocab.cbor");
        fs::write(&input, "id,text\n0,cat dog\n1\n2,dog fish\n3,cat fish\n").unwrap();

        let summary = run_vectorize(&input, &output, Some(&vocab), &config(), &WhitespaceTokenizer).unwrap();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.documents, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.vocabulary_size, 3);
        assert_eq!(summary.trimmed_vocabulary_size, 3);
        assert_eq!(summary.empty_vectors, 0);

        let table = fs::read_to_string(&output).unwrap();
        assert_eq!(table.lines().count(), 5);
        let mut rdr = csv::Reader::from_path(&output).unwrap();
        let dims: Vec<String> = rdr.records().map(|r| r.unwrap()[0].to_owned()).collect();
        assert_eq!(dims, vec!["1|0", "", "2|1", "2|0"]);
        let loaded = Vocabulary::load(&vocab).unwrap();
        assert_eq!(loaded.token(0), Some("cat"));
    }

    #[test]
    fn missing_input_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("vectors.csv");
        let err = run_vectorize(
            &dir.path().join("nope.csv"),
            &output,
            None,
            &config(),
            &WhitespaceTokenizer,
        )
        .unwrap_err();
        assert!(matches!(err, VectorizerError::InputIo { .. }));
        assert!(!output.exists());
    }
}
