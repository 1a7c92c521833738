//! String collation for sort keys.
//!
//! Text is compared first on a folded form (compatibility decomposition,
//! combining marks removed, lowercased) so that "Émile" sorts next to
//! "emile" rather than after "zoe". The original text breaks ties so the
//! ordering stays total.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// A precomputed collation key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    folded: String,
    raw: String,
}

impl CollationKey {
    pub fn new(s: &str) -> Self {
        CollationKey { folded: fold(s), raw: s.to_string() }
    }
}

/// Fold text for primary-strength comparison.
pub fn fold(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_sort_with_their_base_letter() {
        let mut names = vec!["zoe", "Émile", "adam", "emma"];
        names.sort_by_key(|n| CollationKey::new(&n.to_lowercase()));
        assert_eq!(names, vec!["adam", "Émile", "emma", "zoe"]);
    }

    #[test]
    fn folded_equal_strings_still_order() {
        let a = CollationKey::new("resume");
        let b = CollationKey::new("résumé");
        assert_ne!(a, b);
        assert!(a < b);
    }
}
