//! Locale-aware string ordering for dataset sorting.
//!
//! Approximates the default `localeCompare` ordering the published dataset
//! has always used, level by level:
//!
//! 1. Base letters, ignoring case and diacritics (`"Évora"` sorts before
//!    `"Faro"`, `"amsterdam"` before `"Berlin"`).
//! 2. Diacritics: unaccented before accented (`"Zurich"` < `"Zürich"`).
//! 3. Case: lowercase before uppercase at the first differing character
//!    (`"cafe"` < `"Cafe"`).
//! 4. Raw code point order, so the ordering is total.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Compares two strings using the dataset collation.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    primary(a, b)
        .then_with(|| accents(a, b))
        .then_with(|| case(a, b))
        .then_with(|| a.cmp(b))
}

/// Strips diacritics: decomposes to NFD, drops combining marks, and maps
/// letters that have no decomposition (`ł`, `ø`, `ß`, ...) to their base.
#[must_use]
pub fn fold_diacritics(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'ł' => folded.push('l'),
            'Ł' => folded.push('L'),
            'ø' => folded.push('o'),
            'Ø' => folded.push('O'),
            'đ' => folded.push('d'),
            'Đ' => folded.push('D'),
            'ı' => folded.push('i'),
            'ß' => folded.push_str("ss"),
            'æ' => folded.push_str("ae"),
            'Æ' => folded.push_str("AE"),
            'œ' => folded.push_str("oe"),
            'Œ' => folded.push_str("OE"),
            _ => folded.push(c),
        }
    }
    folded
}

fn primary(a: &str, b: &str) -> Ordering {
    fold_diacritics(&a.to_lowercase()).cmp(&fold_diacritics(&b.to_lowercase()))
}

fn accents(a: &str, b: &str) -> Ordering {
    a.to_lowercase().nfd().cmp(b.to_lowercase().nfd())
}

fn case(a: &str, b: &str) -> Ordering {
    for (x, y) in a.nfd().zip(b.nfd()) {
        if x == y {
            continue;
        }
        match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_case_first() {
        assert_eq!(compare("amsterdam", "Berlin"), Ordering::Less);
        assert_eq!(compare("Zurich", "berlin"), Ordering::Greater);
    }

    #[test]
    fn lowercase_before_uppercase_on_tie() {
        assert_eq!(compare("cafe", "Cafe"), Ordering::Less);
        assert_eq!(compare("Cafe", "cafe"), Ordering::Greater);
    }

    #[test]
    fn equal_strings_are_equal() {
        assert_eq!(compare("Paris", "Paris"), Ordering::Equal);
    }

    #[test]
    fn accented_letters_sort_with_their_base() {
        assert_eq!(compare("Évora", "Faro"), Ordering::Less);
        assert_eq!(compare("Zürich", "Zwolle"), Ordering::Less);
        assert_eq!(compare("Óbidos", "Porto"), Ordering::Less);
        assert_eq!(compare("Łódź", "Lyon"), Ordering::Less);
        assert_eq!(compare("Ærø", "Aarhus"), Ordering::Greater);
    }

    #[test]
    fn unaccented_before_accented_on_tie() {
        assert_eq!(compare("Zurich", "Zürich"), Ordering::Less);
        assert_eq!(compare("cafe", "Café"), Ordering::Less);
        assert_eq!(compare("café", "Café"), Ordering::Less);
    }

    #[test]
    fn sorts_european_cities() {
        let mut cities = vec!["Zwolle", "Łódź", "Évora", "Zürich", "Faro", "Lyon", "Óbidos"];
        cities.sort_by(|a, b| compare(a, b));
        assert_eq!(
            cities,
            vec!["Évora", "Faro", "Łódź", "Lyon", "Óbidos", "Zürich", "Zwolle"]
        );
    }

    #[test]
    fn folds_to_base_letters() {
        assert_eq!(fold_diacritics("Café du Marché"), "Cafe du Marche");
        assert_eq!(fold_diacritics("Łódź Straße"), "Lodz Strasse");
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(compare("Roast", "Roastery"), Ordering::Less);
    }
}
