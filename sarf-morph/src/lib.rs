//! Arabic Morphology Engine
//!
//! Derives words from trilateral roots and pattern templates (أوزان) and
//! validates words against a root:
//! - Substitution of root consonants into pattern slots (ف ع ل)
//! - Weak root classification (assimilated, hollow, defective, doubled)
//! - Phonological normalization (weak radicals, Form VII/VIII assimilation)
//! - Brute-force validation and enumeration over a pattern collection

mod engine;
mod letters;
mod rules;
mod weakness;

pub use engine::{
    apply_root_to_pattern, apply_root_to_pattern_vocalized, generate_derivatives, substitute,
    validate_word, Derivative,
};
pub use letters::{is_arabic_text, strip_vowel_marks, Slot};
pub use rules::{normalize, normalize_vocalized};
pub use weakness::{classify_weakness, Weakness};
