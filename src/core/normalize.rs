/// Canonical form used for every case-insensitive comparison
#[inline]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Case-insensitive substring test: does `haystack` contain `needle`?
///
/// An empty needle never matches, so blank preferences cannot match everything.
#[inline]
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = normalize(needle);
    !needle.is_empty() && normalize(haystack).contains(&needle)
}

/// Case-insensitive substring test in either direction
#[inline]
pub fn overlaps_ci(a: &str, b: &str) -> bool {
    contains_ci(a, b) || contains_ci(b, a)
}

/// Append `values` to `target`, skipping blanks and case-insensitive duplicates
pub fn merge_unique(target: &mut Vec<String>, values: impl IntoIterator<Item = String>) {
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = normalize(trimmed);
        if !target.iter().any(|existing| normalize(existing) == key) {
            target.push(trimmed.to_string());
        }
    }
}
