//! Name canonicalization.
//!
//! Every comparison the resolver makes goes through the functions in this
//! module, so two surface forms of a name compare equal exactly when their
//! canonical forms do:
//!
//! - [`normalize`]: accents stripped, lowercased, punctuation turned into
//!   spaces, whitespace collapsed.
//! - [`token_key`]: the distinct words of the normalized form, sorted and
//!   rejoined, so word order and repeats stop mattering.
//! - [`comma_flipped_variants`]: the "First Last" reading of a
//!   "Last, First" name.
//!
//! All functions are total and deterministic.

use std::collections::BTreeSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters replaced by a single space during normalization.
pub const PUNCTUATION: &[char] = &[
    ',', '.', ';', ':', '!', '?', '\'', '"', '(', ')', '[', ']', '{', '}', '_', '/', '\\', '|', '-',
];

/// Canonicalizes a raw name into its normalized key.
///
/// # Examples
///
/// ```
/// use namelink::normalize::normalize;
///
/// assert_eq!(normalize("  Penélope   Cruz "), "penelope cruz");
/// assert_eq!(normalize("O'Brien-Smith"), "o brien smith");
/// assert_eq!(normalize(""), "");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    // Lowercasing can reintroduce decomposable characters (e.g. 'İ'), so the
    // strip runs again afterwards to keep the result a fixed point.
    let folded: String = raw
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .map(|ch| if PUNCTUATION.contains(&ch) { ' ' } else { ch })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits the normalized form of `raw` into its set of distinct tokens.
#[must_use]
pub fn tokenize(raw: &str) -> BTreeSet<String> {
    normalize(raw).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect()
}

/// Builds the order-invariant token key of `raw`.
///
/// # Examples
///
/// ```
/// use namelink::normalize::token_key;
///
/// assert_eq!(token_key("John Smith"), token_key("Smith John"));
/// assert_eq!(token_key("la la land"), "la land");
/// ```
#[must_use]
pub fn token_key(raw: &str) -> String {
    join_tokens(&tokenize(raw))
}

/// Joins an already sorted token set into a token key.
#[must_use]
pub fn join_tokens(tokens: &BTreeSet<String>) -> String {
    tokens.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Splits a token key back into its token set.
#[must_use]
pub fn key_tokens(key: &str) -> BTreeSet<&str> {
    key.split(' ').filter(|t| !t.is_empty()).collect()
}

/// Yields the "First Last" reading of a "Last, First" name.
///
/// The split happens at the first comma; both trimmed sides must be
/// non-empty or nothing is produced. The returned iterator is lazy and can be
/// restarted by cloning it before consumption.
///
/// # Examples
///
/// ```
/// use namelink::normalize::comma_flipped_variants;
///
/// let flips: Vec<String> = comma_flipped_variants("Smith, John").collect();
/// assert_eq!(flips, vec!["John Smith".to_string()]);
/// assert_eq!(comma_flipped_variants("Cher").count(), 0);
/// assert_eq!(comma_flipped_variants(", John").count(), 0);
/// ```
#[must_use]
pub fn comma_flipped_variants(raw: &str) -> CommaFlips<'_> {
    CommaFlips { raw, done: false }
}

/// Iterator returned by [`comma_flipped_variants`].
#[derive(Debug, Clone)]
pub struct CommaFlips<'a> {
    raw: &'a str,
    done: bool,
}

impl Iterator for CommaFlips<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.done = true;

        let (left, right) = self.raw.split_once(',')?;
        let (left, right) = (left.trim(), right.trim());
        if left.is_empty() || right.is_empty() {
            return None;
        }
        Some(format!("{right} {left}"))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(usize::from(!self.done)))
    }
}

impl std::iter::FusedIterator for CommaFlips<'_> {}

/// Jaccard similarity of two token sets.
///
/// Defined as 0 when either set is empty.
#[must_use]
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;

    #[allow(clippy::cast_precision_loss)]
    let score = inter as f64 / union as f64;
    score
}
