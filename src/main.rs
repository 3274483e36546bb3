use std::{path::PathBuf, process};

use clap::{Parser, Subcommand};
use env_logger::Env;
use tweet_vectorizer::{
    config::{
        EncoderConfig, LinkConfig, NormalizationMode, PipelineConfig, ScanConfig, StemmerLanguage,
        StopwordConfig, TokenClass, TokenizerConfig, VocabularyConfig, VocabularyOrder,
    },
    run_link, run_vectorize, Result, TweetTokenizer, WhitespaceTokenizer,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// Sparse TF-IDF vectors for tweet dumps
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn a csv of tweets into a `dimensions,weights` table
    Vectorize {
        /// input csv
        input: PathBuf,
        /// output table
        #[arg(short, long, default_value = "vectors.csv")]
        output: PathBuf,
        /// keep the vocabulary (CBOR) at this path
        #[arg(long)]
        vocabulary: Option<PathBuf>,
        /// keep tokens seen in strictly more than this many documents
        #[arg(long, default_value_t = 10)]
        min_df: u64,
        /// tokenizer threads, defaults to the number of cpus
        #[arg(short, long)]
        workers: Option<usize>,
        /// 0-based column holding the text
        #[arg(long, default_value_t = 3)]
        text_column: usize,
        /// the input has no header row
        #[arg(long)]
        no_headers: bool,
        /// L2 normalize the vectors
        #[arg(long)]
        normalize: bool,
        /// order of the vocabulary ids
        #[arg(long, value_enum, default_value_t = VocabularyOrder::FirstSeen)]
        order: VocabularyOrder,
        /// token classes to keep
        #[arg(long, value_enum, value_delimiter = ',', default_values_t = [TokenClass::Word, TokenClass::Mention])]
        keep: Vec<TokenClass>,
        /// stem tokens in this language
        #[arg(long, value_enum)]
        stemmer: Option<StemmerLanguage>,
        /// extra stopwords, one per line
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// do not use the bundled french stopwords
        #[arg(long)]
        no_builtin_stopwords: bool,
        /// split on whitespace only
        #[arg(long)]
        whitespace: bool,
        /// log progress every n rows, 0 disables it
        #[arg(long, default_value_t = 100_000)]
        progress_every: usize,
    },
    /// Find the nearest earlier neighbor of every vector of a table
    Link {
        /// vectors table written by `vectorize --normalize`
        vectors: PathBuf,
        /// vocabulary written by the same run
        #[arg(long)]
        vocabulary: PathBuf,
        /// output table
        #[arg(short, long, default_value = "neighbors.csv")]
        output: PathBuf,
        /// ignore candidates at this cosine distance or more
        #[arg(long, default_value_t = 0.69)]
        threshold: f64,
        /// number of recent vectors kept searchable
        #[arg(long, default_value_t = 1_500_000)]
        window: usize,
        /// dimensions used to gather candidates
        #[arg(long, default_value_t = 5)]
        query_size: usize,
        /// stop after this many vectors
        #[arg(long)]
        limit: Option<usize>,
        /// log progress every n vectors, 0 disables it
        #[arg(long, default_value_t = 100_000)]
        progress_every: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(err) = exec(Args::parse().command) {
        log::error!("{err}");
        process::exit(1);
    }
}

fn exec(command: Command) -> Result<()> {
    match command {
        Command::Vectorize {
            input,
            output,
            vocabulary,
            min_df,
            workers,
            text_column,
            no_headers,
            normalize,
            order,
            keep,
            stemmer,
            stopwords,
            no_builtin_stopwords,
            whitespace,
            progress_every,
        } => {
            let config = PipelineConfig {
                scan: ScanConfig {
                    workers: workers.unwrap_or_else(rayon::current_num_threads),
                    text_column,
                    has_headers: !no_headers,
                    progress_every,
                },
                vocabulary: VocabularyConfig {
                    min_df_threshold: min_df,
                    order,
                },
                encoder: EncoderConfig {
                    mode: if normalize {
                        NormalizationMode::Normalized
                    } else {
                        NormalizationMode::Raw
                    },
                },
                tokenizer: TokenizerConfig {
                    keep,
                    stemmer,
                    stopwords: StopwordConfig {
                        builtin_french: !no_builtin_stopwords,
                        extra_file: stopwords,
                    },
                    ..TokenizerConfig::default()
                },
            };
            log::debug!("{config:?}");

            let summary = if whitespace {
                run_vectorize(&input, &output, vocabulary.as_deref(), &config, &WhitespaceTokenizer)?
            } else {
                let tokenizer = TweetTokenizer::new(config.tokenizer.clone())?;
                run_vectorize(&input, &output, vocabulary.as_deref(), &config, &tokenizer)?
            };
            log::info!(
                "done: {} documents, {} skipped rows, {} / {} tokens kept, {} empty vectors, {:.2}s",
                summary.documents,
                summary.skipped,
                summary.trimmed_vocabulary_size,
                summary.vocabulary_size,
                summary.empty_vectors,
                summary.elapsed.as_secs_f64()
            );
        }
        Command::Link {
            vectors,
            vocabulary,
            output,
            threshold,
            window,
            query_size,
            limit,
            progress_every,
        } => {
            let config = LinkConfig {
                threshold,
                window,
                query_size,
                limit,
                progress_every,
            };
            run_link(&vectors, &vocabulary, &output, &config)?;
        }
    }
    Ok(())
}
