//! Phonological normalization applied after root substitution.
//!
//! Rule order matters:
//! 1. Hollow roots: vowel + weak radical collapses into a long vowel
//! 2. Defective roots: a final weak radical becomes alef maqsura
//! 3. Form VIII (افتعل) assimilation of the infixed ت
//! 4. Form VII (انفعل) assimilation of the prefixed ن
//! 5. Doubled shadda collapses into one

use crate::letters::{
    strip_vowel_marks, ALEF, ALEF_MAQSURA, DAMMA, DENTAL, EMPHATIC, FATHA, KASRA, LABIAL, MEEM,
    NOON, SHADDA, TAA, TAH, THAA, WAW, YAA,
};
use crate::weakness::{classify_weakness, Weakness};

/// (vowel, weak radical) → (vowel, long vowel letter), applied after C1.
const HOLLOW_REWRITES: [(char, char, char, char); 6] = [
    (FATHA, WAW, FATHA, ALEF),
    (DAMMA, WAW, DAMMA, WAW),
    (KASRA, WAW, KASRA, YAA),
    (FATHA, YAA, FATHA, ALEF),
    (KASRA, YAA, KASRA, YAA),
    (DAMMA, YAA, DAMMA, WAW),
];

fn root_letters(root: &str) -> Option<[char; 3]> {
    let chars: Vec<char> = root.chars().collect();
    chars.try_into().ok()
}

fn pair(a: char, b: char) -> String {
    [a, b].iter().collect()
}

fn apply_hollow_rules(word: String, [c1, c2, _]: [char; 3]) -> String {
    HOLLOW_REWRITES
        .iter()
        .filter(|(_, weak, _, _)| *weak == c2)
        .fold(word, |word, &(vowel, weak, new_vowel, long)| {
            let from: String = [c1, vowel, weak].iter().collect();
            let to: String = [c1, new_vowel, long].iter().collect();
            word.replace(&from, &to)
        })
}

fn apply_defective_rules(mut word: String, [_, _, c3]: [char; 3]) -> String {
    if word.ends_with(c3) {
        word.pop();
        word.push(ALEF_MAQSURA);
    }
    word
}

fn apply_form_viii_assimilation(word: String, c1: char) -> String {
    if EMPHATIC.contains(&c1) {
        // emphatic spread: ت → ط
        word.replace(&pair(c1, TAA), &pair(c1, TAH))
    } else if DENTAL.contains(&c1) {
        // full assimilation with gemination
        word.replace(&pair(c1, TAA), &pair(c1, SHADDA))
    } else if c1 == THAA {
        word.replace(&pair(THAA, TAA), &pair(THAA, SHADDA))
    } else {
        word
    }
}

fn apply_form_vii_assimilation(word: String, c1: char) -> String {
    if LABIAL.contains(&c1) {
        word.replace(&pair(NOON, c1), &pair(MEEM, c1))
    } else {
        word
    }
}

fn collapse_gemination(word: String) -> String {
    word.replace(&pair(SHADDA, SHADDA), &SHADDA.to_string())
}

/// Runs the normalization pipeline and keeps the vowel marks coming from the
/// pattern. Words for roots that are not trilateral pass through unchanged.
pub fn normalize_vocalized(word: &str, root: &str) -> String {
    let Some(letters) = root_letters(root) else {
        return word.to_string();
    };

    let mut word = word.to_string();
    match classify_weakness(root) {
        Weakness::Hollow => word = apply_hollow_rules(word, letters),
        Weakness::Defective => word = apply_defective_rules(word, letters),
        _ => {}
    }
    let word = apply_form_viii_assimilation(word, letters[0]);
    let word = apply_form_vii_assimilation(word, letters[0]);
    collapse_gemination(word)
}

/// Normalizes and returns the unvocalized surface form (shadda is kept).
pub fn normalize(word: &str, root: &str) -> String {
    strip_vowel_marks(&normalize_vocalized(word, root))
}
