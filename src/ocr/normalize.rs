//! Text normalization and plate validation
//!
//! Cleans raw OCR output into a canonical plate code: strip decoration
//! words, keep only uppercase letters and digits, then try the two fixed
//! 7-character plate formats against the head of the string.

/// Normalize raw OCR text into a plate code.
///
/// Ignore words are removed case-insensitively wherever they occur as
/// substrings, in the order given (longer words must come before their own
/// prefixes, e.g. `BRASIL` before `BR`). Every character outside A-Z0-9 is
/// dropped, including lowercase letters.
///
/// When the cleaned string has at least 7 characters and its first 7 match
/// either plate format, the result is truncated to those 7. Otherwise the
/// full cleaned string is returned unchanged: a deliberate lenient
/// fallback, not an error. Short input is never padded.
pub fn normalize_plate(raw: &str, ignore_words: &[String]) -> String {
    let mut text = raw.trim().to_string();
    for word in ignore_words {
        text = strip_word_ci(&text, word);
    }

    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();

    let head: Vec<u8> = cleaned.bytes().take(7).collect();
    if head.len() == 7 && (is_new_format(&head) || is_old_format(&head)) {
        return String::from_utf8_lossy(&head).into_owned();
    }
    cleaned
}

/// Mercosul convention: 3 letters, 1 digit, 1 letter, 2 digits
fn is_new_format(code: &[u8]) -> bool {
    code.len() == 7
        && code[..3].iter().all(u8::is_ascii_uppercase)
        && code[3].is_ascii_digit()
        && code[4].is_ascii_uppercase()
        && code[5..7].iter().all(u8::is_ascii_digit)
}

/// Legacy convention: 3 letters, 4 digits
fn is_old_format(code: &[u8]) -> bool {
    code.len() == 7
        && code[..3].iter().all(u8::is_ascii_uppercase)
        && code[3..7].iter().all(u8::is_ascii_digit)
}

/// Remove every case-insensitive occurrence of an ASCII word
fn strip_word_ci(text: &str, word: &str) -> String {
    let needle = word.as_bytes();
    if needle.is_empty() {
        return text.to_string();
    }
    let hay = text.as_bytes();
    let mut out = Vec::with_capacity(hay.len());
    let mut i = 0;
    while i < hay.len() {
        if i + needle.len() <= hay.len() && hay[i..i + needle.len()].eq_ignore_ascii_case(needle) {
            i += needle.len();
        } else {
            out.push(hay[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore_words() -> Vec<String> {
        crate::config::OcrSettings::default().ignore_words
    }

    #[test]
    fn test_strips_country_word_and_matches_new_format() {
        assert_eq!(normalize_plate("BRASILABC1D23", &ignore_words()), "ABC1D23");
    }

    #[test]
    fn test_old_format_truncates_trailing_noise() {
        assert_eq!(normalize_plate("ABC1234XYZ", &ignore_words()), "ABC1234");
    }

    #[test]
    fn test_non_matching_long_string_returned_whole() {
        // First 7 chars start with a digit, so neither format matches.
        assert_eq!(normalize_plate("1ABCDEF99", &ignore_words()), "1ABCDEF99");
    }

    #[test]
    fn test_short_input_never_padded() {
        assert_eq!(normalize_plate("AB12", &ignore_words()), "AB12");
    }

    #[test]
    fn test_whitespace_and_punctuation_stripped() {
        assert_eq!(
            normalize_plate("  ABC-1D23 \n", &ignore_words()),
            "ABC1D23"
        );
    }

    #[test]
    fn test_lowercase_characters_are_dropped() {
        // The character filter keeps only A-Z0-9; lowercase OCR output is
        // discarded rather than uppercased.
        assert_eq!(normalize_plate("abc1d23", &ignore_words()), "123");
    }

    #[test]
    fn test_ignore_words_removed_case_insensitively() {
        assert_eq!(
            normalize_plate("mercosul BR ABC1D23", &ignore_words()),
            "ABC1D23"
        );
    }

    #[test]
    fn test_longer_ignore_word_wins_over_prefix() {
        // BRASIL is removed whole before the BR pass runs.
        assert_eq!(normalize_plate("Brasil XYZ1A23", &ignore_words()), "XYZ1A23");
    }

    #[test]
    fn test_empty_input_yields_empty_plate() {
        assert_eq!(normalize_plate("   ", &ignore_words()), "");
    }
}
