//! Edit-distance similarity scores on a 0-100 scale.

/// Weight of the last-name score out of 10; the first name gets the rest.
const LAST_NAME_WEIGHT: u32 = 6;
const FIRST_NAME_WEIGHT: u32 = 10 - LAST_NAME_WEIGHT;

/// Levenshtein similarity of two strings, 0-100.
///
/// Both inputs are trimmed and uppercased. Identical strings score 100. An
/// empty input scores 0, including two empty inputs, so rows with missing
/// names never look alike. Otherwise the score is
/// `round((1 - distance / max_len) * 100)` with lengths counted in chars.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a = a.trim().to_uppercase();
    let b = b.trim().to_uppercase();

    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a == b {
        return 100;
    }

    let max_len = a.chars().count().max(b.chars().count());
    let distance = strsim::levenshtein(&a, &b).min(max_len);
    let kept = max_len - distance;

    // Integer round-half-up of 100 * kept / max_len.
    ((200 * kept + max_len) / (2 * max_len)) as u8
}

/// Weighted similarity of two full names: 60% last name, 40% first name.
pub fn name_similarity(last_a: &str, first_a: &str, last_b: &str, first_b: &str) -> u8 {
    let last = u32::from(similarity(last_a, last_b));
    let first = u32::from(similarity(first_a, first_b));

    ((LAST_NAME_WEIGHT * last + FIRST_NAME_WEIGHT * first + 5) / 10) as u8
}
