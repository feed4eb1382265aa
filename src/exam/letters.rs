// src/exam/letters.rs

//! Positional letter assignment for answer options.
//!
//! Options are labelled by their storage position: the first option is `A`,
//! the second `B`, and so on. Selected answers are persisted as strings of
//! these letters, so the mapping must stay position-based.

use std::collections::BTreeSet;

use super::ExamError;

/// Number of distinct labels available (`A` through `Z`).
pub const MAX_OPTIONS: usize = 26;

/// Returns the label for the option at `index`, or `None` past `Z`.
pub fn option_label(index: usize) -> Option<char> {
    if index < MAX_OPTIONS {
        Some((b'A' + index as u8) as char)
    } else {
        None
    }
}

/// Returns the position a label refers to.
pub fn label_index(label: char) -> Option<usize> {
    let upper = label.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        Some((upper as u8 - b'A') as usize)
    } else {
        None
    }
}

/// Labels for a question with `count` options.
///
/// Fails instead of truncating when the question has more options than labels.
pub fn labels_for(question_id: i64, count: usize) -> Result<Vec<char>, ExamError> {
    if count > MAX_OPTIONS {
        return Err(ExamError::TooManyOptions { question_id, count });
    }
    Ok((0..count).filter_map(option_label).collect())
}

/// Normalizes a raw selection into sorted, de-duplicated uppercase letters.
///
/// Whitespace and commas are ignored, so `"c, a"` becomes `"AC"`. Every letter
/// must refer to one of the question's `option_count` options. An empty input
/// yields the empty string, which means "unanswered".
pub fn normalize_selection(raw: &str, option_count: usize) -> Result<String, ExamError> {
    let mut letters = BTreeSet::new();

    for ch in raw.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        match label_index(ch) {
            Some(index) if index < option_count => {
                letters.insert(ch.to_ascii_uppercase());
            }
            _ => {
                return Err(ExamError::InvalidSelection(format!(
                    "'{}' is not one of the {} option letters",
                    ch, option_count
                )));
            }
        }
    }

    Ok(letters.into_iter().collect())
}

/// Splits a stored selection into its set of letters.
pub fn selection_set(selected: &str) -> BTreeSet<char> {
    selected.chars().collect()
}
