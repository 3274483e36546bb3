use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Strip accents and expand the common latin ligatures.
pub fn unidecode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'ß' => out.push_str("ss"),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            c => out.push(c),
        }
    }
    out
}

/// Collapse runs of more than `max_run` identical characters.
pub fn reduce_elongation(text: &str, max_run: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = None;
    let mut run = 0usize;
    for c in text.chars() {
        if Some(c) == last {
            run += 1;
        } else {
            last = Some(c);
            run = 1;
        }
        if run <= max_run {
            out.push(c);
        }
    }
    out
}

/// Split a hashtag body on case and digit boundaries.
/// `MachineLearning2024` -> `Machine`, `Learning`, `2024`
pub fn split_hashtag(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut prev: Option<char> = None;
    for (idx, c) in body.char_indices() {
        if let Some(p) = prev {
            let boundary = (p.is_lowercase() && c.is_uppercase())
                || (p.is_alphabetic() && c.is_numeric())
                || (p.is_numeric() && c.is_alphabetic())
                || c == '_';
            if boundary && idx > start {
                parts.push(&body[start..idx]);
                start = idx;
            }
        }
        if c == '_' {
            start = idx + c.len_utf8();
        }
        prev = Some(c);
    }
    if start < body.len() {
        parts.push(&body[start..]);
    }
    parts
}
