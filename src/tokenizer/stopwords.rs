use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

/// Bundled french stopwords, already lowercased and accent folded.
pub const STOP_WORDS_FR: &[&str] = &[
    "a", "ai", "aie", "aient", "aies", "ait", "alors", "as", "au", "aucun", "aucune", "aupres",
    "aura", "aurai", "auraient", "aurais", "aurait", "auras", "aurez", "auriez", "aurions",
    "aurons", "auront", "aussi", "autre", "autres", "aux", "avaient", "avais", "avait", "avant",
    "avec", "avez", "aviez", "avions", "avoir", "avons", "ayant", "ayez", "ayons", "bon", "c",
    "ca", "car", "ce", "ceci", "cela", "celle", "celles", "celui", "ces", "cet", "cette", "ceux",
    "chez", "ci", "comme", "comment", "d", "dans", "de", "des", "deja", "depuis", "donc", "dont",
    "du", "elle", "elles", "en", "encore", "entre", "es", "est", "et", "etaient", "etais",
    "etait", "etant", "ete", "etes", "etiez", "etions", "etre", "eu", "eue", "eues", "eurent",
    "eus", "eut", "eux", "fait", "faire", "fois", "font", "furent", "fut", "ici", "il", "ils",
    "j", "je", "jusqu", "l", "la", "le", "les", "leur", "leurs", "lui", "m", "ma", "mais", "me",
    "meme", "memes", "mes", "moi", "mon", "n", "ne", "ni", "nos", "notre", "nous", "on", "ont",
    "ou", "par", "parce", "pas", "peu", "peut", "plus", "pour", "pourquoi", "qu", "quand", "que",
    "quel", "quelle", "quelles", "quels", "qui", "s", "sa", "sans", "se", "sera", "serai",
    "seraient", "serais", "serait", "seras", "serez", "seriez", "serions", "serons", "seront",
    "ses", "si", "sien", "sienne", "soi", "soient", "sois", "soit", "sommes", "son", "sont",
    "sous", "soyez", "soyons", "suis", "sur", "t", "ta", "te", "tes", "toi", "ton", "tous",
    "tout", "toute", "toutes", "tres", "tu", "un", "une", "vos", "votre", "vous", "vu", "y",
    "rt", "via",
];

/// Typographic apostrophe, frequent in tweets typed on phones.
pub const TYPOGRAPHIC_APOSTROPHE: char = '’';

/// A set of words removed by the tokenizer.
///
/// Every entry is also stored in its elided form (`l'`, `l’`) since the
/// tokenizer keeps the apostrophe attached to the word it elides.
#[derive(Debug, Clone, Default)]
pub struct StopWordList {
    words: HashSet<String>,
}

impl StopWordList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn french() -> Self {
        let mut list = Self::new();
        list.extend(STOP_WORDS_FR.iter().copied());
        list
    }

    /// Read one word per line, blank lines and `#` comments are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
        let reader = BufReader::new(File::open(path)?);
        let mut words = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            words.push(word.to_owned());
        }
        Ok(words)
    }

    pub fn insert(&mut self, word: &str) {
        self.words.insert(format!("{word}'"));
        self.words.insert(format!("{word}{TYPOGRAPHIC_APOSTROPHE}"));
        self.words.insert(word.to_owned());
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.insert(word.as_ref());
        }
    }

    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
