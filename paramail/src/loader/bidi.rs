//! # Bidi correction module
//!
//! Legacy 8-bit Hebrew documents are usually stored in visual order:
//! right-to-left runs are written reversed. This module puts them
//! back in logical order using a coarse heuristic: every line
//! containing at least one Hebrew character is reversed as a whole.
//!
//! Mixed-direction lines are not handled and will be corrupted.

/// Return `true` if the given char belongs to the Hebrew Unicode
/// block (U+0590 to U+05FF).
pub fn is_hebrew(c: char) -> bool {
    ('\u{0590}'..='\u{05FF}').contains(&c)
}

/// Correct a single line.
///
/// Lines without any Hebrew character are returned unchanged.
pub fn correct_line(line: &str) -> String {
    if line.chars().any(is_hebrew) {
        line.chars().rev().collect()
    } else {
        line.to_owned()
    }
}

/// Correct every line of the given text.
///
/// Lines are split on `\n` or `\r\n`, corrected then joined back with
/// `\n`. A single trailing line terminator is dropped.
pub fn correct(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    let text = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text);

    text.split('\n')
        .map(|line| correct_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect::<Vec<_>>()
        .join("\n")
}
