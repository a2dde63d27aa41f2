use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Normalize text for case-insensitive, accent-insensitive comparison.
///
/// Trims, decomposes (NFKD), removes combining marks and lowercases.
/// Punctuation and inner whitespace are kept, so `startsWith`/`endsWith`
/// still line up with what the user sees.
pub fn fold_text(input: &str) -> String {
    input
        .trim()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_lowercase())
        .collect()
}
