//! Text decoding, case folding and word extraction.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use unicode_normalization::UnicodeNormalization;

/// Control characters replaced by a plain space before tokenizing.
const CONTROL_WHITESPACE: [char; 7] = ['\u{07}', '\u{08}', '\u{0C}', '\n', '\r', '\t', '\u{0B}'];

/// Decode raw bytes into canonical (NFC), case-folded text.
///
/// A byte-order mark selects the encoding when present. Otherwise valid UTF-8
/// is used as is and anything else is read as windows-1252.
pub fn normalize(bytes: &[u8]) -> String {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => WINDOWS_1252,
    };
    let (decoded, _, _) = encoding.decode(bytes);

    decoded
        .nfc()
        .map(|c| if CONTROL_WHITESPACE.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Split text into word and non-word segments.
///
/// Word segments are maximal runs of alphanumeric characters, allowing a
/// single apostrophe between two alphanumerics ("don't"). Every other
/// character becomes a one-character segment.
pub fn segments(text: &str) -> Segments<'_> {
    Segments { text, pos: 0 }
}

pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = &self.text[self.pos..];
        let mut chars = rest.char_indices().peekable();
        let (_, first) = chars.next()?;

        let mut end = first.len_utf8();
        if first.is_alphanumeric() {
            while let Some(&(idx, c)) = chars.peek() {
                if c.is_alphanumeric() {
                    end = idx + c.len_utf8();
                    chars.next();
                } else if is_apostrophe(c) {
                    chars.next();
                    match chars.peek() {
                        Some(&(next_idx, next)) if next.is_alphanumeric() => {
                            end = next_idx + next.len_utf8();
                            chars.next();
                        }
                        _ => break,
                    }
                } else {
                    break;
                }
            }
        }

        let segment = &rest[..end];
        self.pos += end;
        Some(segment)
    }
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Whether a segment counts as a word.
///
/// Rejects empty segments, segments starting with whitespace, segments with
/// punctuation at both edges and segments with a digit at either edge.
pub fn is_valid_word(segment: &str) -> bool {
    let (Some(first), Some(last)) = (segment.chars().next(), segment.chars().next_back()) else {
        return false;
    };

    let not_punct = !is_punct(first) || !is_punct(last);
    let not_space = !first.is_whitespace();
    let not_digit = !first.is_numeric() && !last.is_numeric();

    not_punct && not_space && not_digit
}

fn is_punct(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace() && !c.is_control())
}

/// Valid words of already-normalized text, in order.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    segments(text).filter(|segment| is_valid_word(segment))
}
