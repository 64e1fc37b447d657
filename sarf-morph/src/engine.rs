use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::letters::{strip_vowel_marks, Slot};
use crate::rules::{normalize, normalize_vocalized};

/// A word produced by applying a root to one template, in both its bare
/// and vocalized spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivative {
    pub template: String,
    pub generated_word: String,
    pub vocalized: String,
}

impl Derivative {
    /// Applies `root` to `template`. The words are empty when `root` is not
    /// trilateral.
    pub fn new(root: &str, template: &str) -> Self {
        Self {
            template: template.to_string(),
            generated_word: apply_root_to_pattern(root, template),
            vocalized: apply_root_to_pattern_vocalized(root, template),
        }
    }
}

fn is_trilateral(root: &str) -> bool {
    root.chars().count() == 3
}

/// Replaces the slot markers of `pattern` with the radicals of `root`;
/// every other character is copied as is. Returns an empty string unless
/// `root` has exactly three characters.
pub fn substitute(root: &str, pattern: &str) -> String {
    let radicals: Vec<char> = root.chars().collect();
    if radicals.len() != 3 {
        return String::new();
    }

    pattern
        .chars()
        .map(|ch| match Slot::from_marker(ch) {
            Some(slot) => radicals[slot.index()],
            None => ch,
        })
        .collect()
}

/// Generates the unvocalized surface form of `root` in `pattern`.
///
/// ```
/// assert_eq!(sarf_morph::apply_root_to_pattern("كتب", "فَاعِل"), "كاتب");
/// ```
pub fn apply_root_to_pattern(root: &str, pattern: &str) -> String {
    if !is_trilateral(root) {
        return String::new();
    }
    normalize(&substitute(root, pattern), root)
}

/// Like [`apply_root_to_pattern`] but keeps the pattern's vowel marks.
pub fn apply_root_to_pattern_vocalized(root: &str, pattern: &str) -> String {
    if !is_trilateral(root) {
        return String::new();
    }
    normalize_vocalized(&substitute(root, pattern), root)
}

/// Looks for the first template, in the given order, that generates `word`
/// from `root`. Vowel marks on `word` are ignored.
pub fn validate_word<'a, S>(word: &str, root: &str, patterns: &'a [S]) -> Option<&'a str>
where
    S: AsRef<str> + Sync,
{
    if !is_trilateral(root) {
        return None;
    }
    let word = strip_vowel_marks(word);
    patterns
        .par_iter()
        .find_first(|template| apply_root_to_pattern(root, template.as_ref()) == word)
        .map(AsRef::as_ref)
}

/// Applies `root` to every template, keeping non-empty results in template
/// order. Identical words from different templates are all kept.
pub fn generate_derivatives<S>(root: &str, patterns: &[S]) -> Vec<Derivative>
where
    S: AsRef<str> + Sync,
{
    if !is_trilateral(root) {
        return Vec::new();
    }
    patterns
        .par_iter()
        .map(|template| Derivative::new(root, template.as_ref()))
        .filter(|derivative| !derivative.generated_word.is_empty())
        .collect()
}
