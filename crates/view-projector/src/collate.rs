//! Accent- and case-insensitive, numeric-aware string ordering.

use std::cmp::Ordering;
use std::iter::Peekable;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Compare two strings the way a person would sort them: accents and case
/// are ignored for the primary comparison and runs of digits compare by
/// value, so `"item2"` sorts before `"item10"` and `"Émile"` sorts among
/// the E's.
///
/// Strings that are equal under those rules fall back to plain byte order,
/// which keeps the ordering total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (folded_a, folded_b) = (fold(a), fold(b));
    let mut left = folded_a.iter().copied().peekable();
    let mut right = folded_b.iter().copied().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ordering = compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                left.next();
                right.next();
                let ordering = l.cmp(&r);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Canonical decomposition with combining marks dropped, then lowercased.
fn fold(s: &str) -> Vec<char> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn take_digits<I: Iterator<Item = char>>(chars: &mut Peekable<I>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_case() {
        assert_eq!(natural_cmp("alice", "Bob"), Ordering::Less);
        assert_eq!(natural_cmp("ALICE", "bob"), Ordering::Less);
    }

    #[test]
    fn digit_runs_compare_by_value() {
        assert_eq!(natural_cmp("user2", "user10"), Ordering::Less);
        assert_eq!(natural_cmp("user10", "user9"), Ordering::Greater);
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Greater);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(natural_cmp("Ann", "Anna"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }

    #[test]
    fn case_only_difference_is_still_ordered() {
        assert_ne!(natural_cmp("ann", "Ann"), Ordering::Equal);
        assert_eq!(natural_cmp("ann", "ann"), Ordering::Equal);
    }

    #[test]
    fn handles_very_long_numbers() {
        assert_eq!(
            natural_cmp("n99999999999999999999999", "n100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn accented_letters_sort_with_their_base_letter() {
        assert_eq!(natural_cmp("Émile", "Frank"), Ordering::Less);
        assert_eq!(natural_cmp("Émile", "Zoe"), Ordering::Less);
        assert_eq!(natural_cmp("Émile", "Daniel"), Ordering::Greater);
        assert_eq!(natural_cmp("émile", "Emma"), Ordering::Less);
        assert_eq!(natural_cmp("Zoë", "Zoey"), Ordering::Less);
    }

    #[test]
    fn accent_only_difference_is_still_ordered() {
        assert_eq!(natural_cmp("Emile", "Émile"), Ordering::Less);
        assert_eq!(natural_cmp("Émile", "Emile"), Ordering::Greater);
        assert_eq!(natural_cmp("Émile", "Émile"), Ordering::Equal);
    }

    #[test]
    fn precomposed_and_decomposed_forms_share_a_position() {
        let precomposed = "Ren\u{e9}e";
        let decomposed = "Rene\u{301}e";
        assert_eq!(natural_cmp(precomposed, "Renata"), Ordering::Greater);
        assert_eq!(natural_cmp(decomposed, "Renata"), Ordering::Greater);
        assert_eq!(natural_cmp(precomposed, "Rent"), Ordering::Less);
        assert_eq!(natural_cmp(decomposed, "Rent"), Ordering::Less);
    }

    #[test]
    fn digits_after_accents_still_compare_by_value() {
        assert_eq!(natural_cmp("Élan 9", "elan 10"), Ordering::Less);
    }
}
