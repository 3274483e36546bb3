use std::{
    collections::BTreeMap,
    fs::File,
    io,
    path::{Path, PathBuf},
    sync::mpsc,
    time::Instant,
};

use rayon::prelude::*;

use crate::{
    config::ScanConfig,
    error::{Result, RowError, VectorizerError},
    tokenizer::Tokenizer,
    vectorizer::{corpus::Corpus, token::TokenSet},
};

/// What a worker hands back for one row.
type RowOutcome = std::result::Result<TokenSet, VectorizerError>;

/// Result of a full corpus scan.
#[derive(Debug, Default)]
pub struct ScanOutput {
    /// token sets indexed by input order (skipped rows excluded)
    pub documents: Vec<TokenSet>,
    /// document frequency table over `documents`
    pub corpus: Corpus,
    /// rows that could not be decoded
    pub skipped: Vec<RowError>,
    /// data rows read, skipped ones included
    pub rows: usize,
}

/// Reads every row, tokenizes in a worker pool and accumulates the corpus.
///
/// Only tokenization runs on the pool. Results travel over a bounded channel,
/// tagged with their row index, to the calling thread which owns the
/// `Corpus` and the document list. A reorder buffer commits rows strictly in
/// input order, so the output (and the first seen order of the table) does
/// not depend on worker scheduling.
pub struct CorpusScanner<'t, T: Tokenizer + ?Sized> {
    tokenizer: &'t T,
    config: ScanConfig,
}

impl<'t, T: Tokenizer + ?Sized> CorpusScanner<'t, T> {
    pub fn new(tokenizer: &'t T, config: ScanConfig) -> Self {
        Self { tokenizer, config }
    }

    /// Scan a csv file. A missing or unreadable file is fatal.
    pub fn scan_path<P: AsRef<Path>>(&self, path: P) -> Result<ScanOutput> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| VectorizerError::input_io(path, source))?;
        self.scan_reader(file, path)
    }

    /// Scan any csv source; `source` only names it in errors.
    pub fn scan_reader<R>(&self, reader: R, source: &Path) -> Result<ScanOutput>
    where
        R: io::Read + Send,
    {
        self.config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("tokenizer-{i}"))
            .build()
            .map_err(|e| VectorizerError::InvalidConfig(format!("cannot build worker pool: {e}")))?;

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(self.config.has_headers)
            .flexible(true)
            .from_reader(reader);

        let start = Instant::now();
        log::info!(
            "scanning {} with {} workers (text column {})",
            source.display(),
            self.config.workers,
            self.config.text_column
        );

        // bounded so a slow aggregator applies back pressure on the readers
        let (tx, rx) = mpsc::sync_channel::<(usize, RowOutcome)>(self.config.workers * 256);
        let tokenizer = self.tokenizer;
        let text_column = self.config.text_column;
        let source_buf = source.to_path_buf();

        let output = std::thread::scope(|scope| {
            let pool = &pool;
            let csv_reader = &mut csv_reader;
            scope.spawn(move || {
                let rows = RowSource::new(csv_reader.records(), text_column, source_buf);
                pool.install(|| {
                    rows.par_bridge().for_each_with(tx, |tx, (index, row)| {
                        let outcome = row.map(|text| tokenizer.tokenize(&text));
                        // receiver gone means the run is aborting
                        let _ = tx.send((index, outcome));
                    });
                });
            });

            let mut aggregator = Aggregator::new(self.config.progress_every);
            for (index, outcome) in rx {
                aggregator.push(index, outcome)?;
            }
            aggregator.finish()
        })?;

        log::info!(
            "scanned {} rows into {} documents in {:.2}s ({} distinct tokens, {} rows skipped)",
            output.rows,
            output.documents.len(),
            start.elapsed().as_secs_f64(),
            output.corpus.vocab_size(),
            output.skipped.len()
        );
        Ok(output)
    }
}

/// Sequential row reader feeding the pool.
///
/// Yields `(row index, text)` pairs. Decode problems become row errors; an
/// I/O failure of the source is yielded once and ends the iteration.
struct RowSource<I> {
    records: I,
    text_column: usize,
    source: PathBuf,
    index: usize,
    done: bool,
}

impl<I> RowSource<I> {
    fn new(records: I, text_column: usize, source: PathBuf) -> Self {
        Self {
            records,
            text_column,
            source,
            index: 0,
            done: false,
        }
    }
}

impl<I> Iterator for RowSource<I>
where
    I: Iterator<Item = csv::Result<csv::StringRecord>>,
{
    type Item = (usize, std::result::Result<String, VectorizerError>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let record = self.records.next()?;
        let index = self.index;
        self.index += 1;

        let row = match record {
            Ok(record) => match record.get(self.text_column) {
                Some(text) => Ok(text.to_owned()),
                None => Err(VectorizerError::RowDecode {
                    row: record.position().map(|p| p.line()).unwrap_or(0),
                    reason: format!(
                        "missing text column {} ({} fields)",
                        self.text_column,
                        record.len()
                    ),
                }),
            },
            Err(err) => {
                let err = VectorizerError::from_input_csv(self.source.clone(), err);
                if err.is_fatal() {
                    self.done = true;
                }
                Err(err)
            }
        };
        Some((index, row))
    }
}

/// Owns the shared state of the scan; lives on the consumer thread only.
struct Aggregator {
    next: usize,
    pending: BTreeMap<usize, RowOutcome>,
    output: ScanOutput,
    progress_every: usize,
    started: Instant,
}

/// first skipped rows are logged at warn, the rest at debug
const WARN_ROWS: usize = 10;

impl Aggregator {
    fn new(progress_every: usize) -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
            output: ScanOutput::default(),
            progress_every,
            started: Instant::now(),
        }
    }

    fn push(&mut self, index: usize, outcome: RowOutcome) -> Result<()> {
        if index == self.next {
            self.commit(outcome)?;
        } else {
            self.pending.insert(index, outcome);
        }
        while let Some(outcome) = self.pending.remove(&self.next) {
            self.commit(outcome)?;
        }
        Ok(())
    }

    fn commit(&mut self, outcome: RowOutcome) -> Result<()> {
        let index = self.next;
        self.next += 1;
        self.output.rows += 1;

        match outcome {
            Ok(doc) => {
                self.output.corpus.add_set(&doc);
                self.output.documents.push(doc);
            }
            Err(VectorizerError::RowDecode { row, reason }) => {
                if self.output.skipped.len() < WARN_ROWS {
                    log::warn!("skipping row {index} (line {row}): {reason}");
                } else {
                    log::debug!("skipping row {index} (line {row}): {reason}");
                }
                self.output.skipped.push(RowError { index, line: row, reason });
            }
            Err(fatal) => return Err(fatal),
        }

        if self.progress_every > 0 && self.output.rows % self.progress_every == 0 {
            let elapsed = self.started.elapsed().as_secs_f64();
            log::info!(
                "scanned {} rows | {} distinct tokens | {:.0} rows/s",
                self.output.rows,
                self.output.corpus.vocab_size(),
                if elapsed > 0.0 { self.output.rows as f64 / elapsed } else { 0.0 }
            );
        }
        Ok(())
    }

    fn finish(self) -> Result<ScanOutput> {
        debug_assert!(self.pending.is_empty(), "rows left in the reorder buffer");
        Ok(self.output)
    }
}
