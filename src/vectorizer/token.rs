use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// TokenSet 構造体
/// The unique tokens of one document.
///
/// Repeated tokens collapse to a single entry, so each document contributes at
/// most one count per token to the document frequency table.
/// Iteration follows the order in which tokens first appeared in the text,
/// which keeps id assignment reproducible.
///
/// # Examples
/// ```
/// use tweet_vectorizer::TokenSet;
/// let mut doc = TokenSet::new();
/// doc.add_token("dog");
/// doc.add_token("cat");
/// doc.add_token("dog");
///
/// assert_eq!(doc.len(), 2);
/// assert_eq!(doc.token_set_ref_str(), vec!["dog", "cat"]);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    tokens: IndexSet<Box<str>>,
}

/// Tokenの追加
impl TokenSet {
    pub fn new() -> Self {
        TokenSet {
            tokens: IndexSet::new(),
        }
    }

    /// tokenを追加する
    ///
    /// # Arguments
    /// * `token` - 追加するトークン
    ///
    /// # Returns
    /// * `bool` - true when the token was not present yet
    #[inline]
    pub fn add_token(&mut self, token: &str) -> bool {
        if self.tokens.contains(token) {
            return false;
        }
        self.tokens.insert(token.into())
    }

    /// 複数のtokenを追加する
    ///
    /// # Arguments
    /// * `tokens` - 追加するトークンのスライス
    #[inline]
    pub fn add_tokens<T>(&mut self, tokens: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for token in tokens {
            self.add_token(token.as_ref());
        }
        self
    }
}

/// 情報取得
impl TokenSet {
    #[inline]
    pub fn contains_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// tokens in first appearance order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(|token| token.as_ref())
    }

    #[inline]
    pub fn token_set(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }

    #[inline]
    pub fn token_set_ref_str(&self) -> Vec<&str> {
        self.iter().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TokenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TokenSet::new();
        for token in iter {
            set.add_token(token.as_ref());
        }
        set
    }
}
