pub mod fold;
pub mod html;
pub mod stopwords;

use std::fmt;

use crate::{
    config::{TokenClass, TokenizerConfig},
    error::{Result, VectorizerError},
    vectorizer::token::TokenSet,
};

use self::stopwords::{StopWordList, TYPOGRAPHIC_APOSTROPHE};

/// Text to unique tokens.
///
/// Implementations must be pure and deterministic: the same text always
/// yields the same set, in the same order. Malformed or empty input yields an
/// empty set, never an error. The scanner calls `tokenize` from several
/// worker threads at once.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> TokenSet;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> TokenSet + Send + Sync,
{
    fn tokenize(&self, text: &str) -> TokenSet {
        self(text)
    }
}

/// Splits on whitespace and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> TokenSet {
        text.split_whitespace().collect()
    }
}

/// Rule based tokenizer for tweets.
///
/// Recognizes urls, `@mentions`, `#hashtags`, numbers and words, then applies
/// the folding, stopword and class filters selected in [`TokenizerConfig`].
/// A word followed by an apostrophe and a letter keeps the apostrophe
/// (`l'homme` -> `l'`, `homme`) so elided stopwords can be listed as such.
pub struct TweetTokenizer {
    config: TokenizerConfig,
    stop_words: StopWordList,
    stemmer: Option<rust_stemmers::Stemmer>,
}

impl fmt::Debug for TweetTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweetTokenizer")
            .field("config", &self.config)
            .field("stop_words", &self.stop_words.len())
            .finish()
    }
}

/// A raw span found by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span<'a> {
    class: TokenClass,
    text: &'a str,
}

const MAX_CHAR_RUN: usize = 3;

impl TweetTokenizer {
    /// Build the tokenizer, loading the extra stopword file when configured.
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        let mut stop_words = if config.stopwords.builtin_french {
            StopWordList::french()
        } else {
            StopWordList::new()
        };
        if let Some(path) = &config.stopwords.extra_file {
            let words = StopWordList::load(path)
                .map_err(|source| VectorizerError::input_io(path.clone(), source))?;
            log::debug!("loaded {} extra stopwords from {}", words.len(), path.display());
            // same folding as the tokens they are compared against
            stop_words.extend(words.iter().map(|w| Self::fold_with(&config, w)));
        }
        let stemmer = config
            .stemmer
            .map(|lang| rust_stemmers::Stemmer::create(lang.algorithm()));
        Ok(Self {
            config,
            stop_words,
            stemmer,
        })
    }

    fn fold_with(config: &TokenizerConfig, raw: &str) -> String {
        let mut token = if config.unidecode {
            fold::unidecode(raw)
        } else {
            raw.to_owned()
        };
        if config.lowercase {
            token = token.to_lowercase();
        }
        if config.reduce_words {
            token = fold::reduce_elongation(&token, MAX_CHAR_RUN);
        }
        token
    }

    fn keeps(&self, class: TokenClass) -> bool {
        self.config.keep.contains(&class)
    }

    /// fold, filter and stem one token, then add it to `out`
    fn emit(&self, class: TokenClass, raw: &str, out: &mut TokenSet) {
        if !self.keeps(class) {
            return;
        }
        let token = match class {
            TokenClass::Url => raw.to_owned(),
            _ => Self::fold_with(&self.config, raw),
        };
        if token.is_empty() || self.stop_words.contains(&token) {
            return;
        }
        match (&self.stemmer, class) {
            (Some(stemmer), TokenClass::Word) => {
                let stemmed = stemmer.stem(&token);
                if !stemmed.is_empty() {
                    out.add_token(&stemmed);
                }
            }
            _ => {
                out.add_token(&token);
            }
        }
    }

    fn scan(text: &str) -> Vec<Span<'_>> {
        let mut spans = Vec::new();
        let bytes_len = text.len();
        let mut pos = 0usize;

        while pos < bytes_len {
            let rest = &text[pos..];
            let Some(c) = rest.chars().next() else { break };

            if c.is_whitespace() {
                pos += c.len_utf8();
                continue;
            }

            if starts_url(rest) {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                spans.push(Span { class: TokenClass::Url, text: &rest[..end] });
                pos += end;
                continue;
            }

            if c == '@' || c == '#' {
                let body_len = word_run(&rest[1..], false);
                if body_len > 0 {
                    let class = if c == '@' { TokenClass::Mention } else { TokenClass::Hashtag };
                    spans.push(Span { class, text: &rest[..1 + body_len] });
                    pos += 1 + body_len;
                    continue;
                }
                pos += 1;
                continue;
            }

            if c.is_alphanumeric() {
                let mut end = word_run(rest, true);
                let word = &rest[..end];
                let class = if word.chars().all(|c| c.is_numeric() || c == '.' || c == ',') {
                    TokenClass::Number
                } else {
                    TokenClass::Word
                };
                // elision: keep the apostrophe on the elided word
                if class == TokenClass::Word {
                    let mut after = rest[end..].chars();
                    if let (Some(apos), Some(next)) = (after.next(), after.next()) {
                        if (apos == '\'' || apos == TYPOGRAPHIC_APOSTROPHE) && next.is_alphabetic() {
                            end += apos.len_utf8();
                        }
                    }
                }
                spans.push(Span { class, text: &rest[..end] });
                pos += end;
                continue;
            }

            // punctuation, emoji and the like
            pos += c.len_utf8();
        }
        spans
    }
}

impl Tokenizer for TweetTokenizer {
    fn tokenize(&self, text: &str) -> TokenSet {
        let text = if self.config.decode_html_entities {
            html::decode_entities(text)
        } else {
            std::borrow::Cow::Borrowed(text)
        };

        let mut out = TokenSet::new();
        for span in Self::scan(&text) {
            match span.class {
                TokenClass::Hashtag if self.config.split_hashtags => {
                    for part in fold::split_hashtag(&span.text[1..]) {
                        let class = if part.chars().all(char::is_numeric) {
                            TokenClass::Number
                        } else {
                            TokenClass::Word
                        };
                        self.emit(class, part, &mut out);
                    }
                }
                class => self.emit(class, span.text, &mut out),
            }
        }
        out
    }
}

fn starts_url(text: &str) -> bool {
    let head: String = text.chars().take(8).collect::<String>().to_ascii_lowercase();
    head.starts_with("http://") || head.starts_with("https://") || head.starts_with("www.")
}

/// Byte length of the leading run of word characters.
/// With `inner_joiners`, single `-` `.` `,` between alphanumerics stay inside the run
/// (`peut-etre`, `3,5`).
fn word_run(text: &str, inner_joiners: bool) -> usize {
    let mut end = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c.is_alphanumeric() || c == '_' {
            end = idx + c.len_utf8();
            continue;
        }
        let joined = inner_joiners
            && end > 0
            && end == idx
            && matches!(c, '-' | '.' | ',')
            && chars.peek().map_or(false, |(_, n)| n.is_alphanumeric());
        if !joined {
            break;
        }
    }
    end
}
