//! Text normalization shared by lexicon loading and classification
//!
//! Normalized text is lower-case ASCII letters and digits separated by
//! single spaces, so byte offsets are character offsets.

/// Normalize free text for matching.
///
/// Lower-cases, folds French diacritics to ASCII, turns apostrophes and
/// punctuation into spaces and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut buf = [0u8; 4];

    for c in text.chars().flat_map(char::to_lowercase) {
        let folded: &str = if c.is_ascii_alphanumeric() {
            c.encode_utf8(&mut buf)
        } else {
            fold_diacritic(c)
        };
        if folded.is_empty() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push_str(folded);
    }

    out
}

fn fold_diacritic(c: char) -> &'static str {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => "a",
        'ç' => "c",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'î' | 'ï' | 'í' | 'ì' => "i",
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => "o",
        'û' | 'ü' | 'ù' | 'ú' => "u",
        'ÿ' => "y",
        'ñ' => "n",
        'æ' => "ae",
        'œ' => "oe",
        _ => "",
    }
}

/// Whether `text[start..end]` sits on word boundaries.
///
/// The end boundary also accepts a plural suffix (`s`, `x`, `es`) directly
/// followed by a boundary. Returns the end offset including the suffix.
pub fn word_match_end(text: &str, start: usize, end: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if start > 0 && bytes[start - 1] != b' ' {
        return None;
    }
    let is_boundary = |pos: usize| pos == bytes.len() || bytes[pos] == b' ';
    if is_boundary(end) {
        return Some(end);
    }
    for suffix in ["s", "x", "es"] {
        let suffix_end = end + suffix.len();
        if text[end..].starts_with(suffix) && is_boundary(suffix_end) {
            return Some(suffix_end);
        }
    }
    None
}

/// Whether a normalized term occurs as a word (or plural) in normalized text
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    text.match_indices(term)
        .any(|(start, m)| word_match_end(text, start, start + m.len()).is_some())
}
