//! Small text helpers shared by classification, extraction and the adapters.

/// Split prose into sentences at whitespace that follows `.`, `!` or `?`.
///
/// The whitespace run is consumed; sentences keep their terminal punctuation.
/// Empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut iter = text.char_indices().peekable();

    while let Some((idx, ch)) = iter.next() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            let piece = &text[start..idx];
            if !piece.is_empty() {
                sentences.push(piece);
            }
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next)) = iter.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = next_idx + next.len_utf8();
                iter.next();
            }
            start = end;
            prev = None;
            continue;
        }
        prev = Some(ch);
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Title-case a phrase: the first letter after any non-letter is upper-cased,
/// the rest lower-cased. Words made only of upper-case Roman numeral letters
/// (`II`, `IV`, `XII`) are kept as written.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if is_roman_numeral(word) {
            out.push_str(word);
            continue;
        }
        let mut prev_is_letter = false;
        let mut prev: Option<char> = None;
        for ch in word.chars() {
            if ch.is_alphabetic() {
                // "Pompey's" keeps a lower-case "s"
                if prev_is_letter || prev == Some('\'') {
                    out.extend(ch.to_lowercase());
                } else {
                    out.extend(ch.to_uppercase());
                }
                prev_is_letter = true;
            } else {
                out.push(ch);
                prev_is_letter = false;
            }
            prev = Some(ch);
        }
    }
    out
}

fn is_roman_numeral(word: &str) -> bool {
    word.len() >= 2 && word.chars().all(|c| matches!(c, 'I' | 'V' | 'X'))
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collapse every whitespace run into a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether the text contains any character of the Arabic block (U+0600..=U+06FF).
pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
}
