//! Arabic letter classes used by the morphological rules.

pub(crate) const WAW: char = '\u{0648}'; // و
pub(crate) const YAA: char = '\u{064A}'; // ي
pub(crate) const ALEF: char = '\u{0627}'; // ا
pub(crate) const ALEF_MAQSURA: char = '\u{0649}'; // ى
pub(crate) const TAA: char = '\u{062A}'; // ت
pub(crate) const TAH: char = '\u{0637}'; // ط
pub(crate) const THAA: char = '\u{062B}'; // ث
pub(crate) const NOON: char = '\u{0646}'; // ن
pub(crate) const MEEM: char = '\u{0645}'; // م

pub(crate) const FATHA: char = '\u{064E}';
pub(crate) const DAMMA: char = '\u{064F}';
pub(crate) const KASRA: char = '\u{0650}';
pub(crate) const SHADDA: char = '\u{0651}';

/// Semivowel radicals that make a root weak.
pub(crate) const WEAK_LETTERS: [char; 2] = [WAW, YAA];

/// ص ض ط ظ
pub(crate) const EMPHATIC: [char; 4] = ['\u{0635}', '\u{0636}', '\u{0637}', '\u{0638}'];

/// د ذ ز
pub(crate) const DENTAL: [char; 3] = ['\u{062F}', '\u{0630}', '\u{0632}'];

/// ب م
pub(crate) const LABIAL: [char; 2] = ['\u{0628}', MEEM];

pub(crate) fn is_weak(ch: char) -> bool {
    WEAK_LETTERS.contains(&ch)
}

/// Root consonant position referenced by a pattern marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
    Third,
}

impl Slot {
    /// Recognizes the standard ف/ع/ل notation, numeric 1/2/3 and the
    /// Latin F/A/L shorthand.
    pub fn from_marker(ch: char) -> Option<Self> {
        match ch {
            '\u{0641}' | '1' | 'F' => Some(Slot::First),
            '\u{0639}' | '2' | 'A' => Some(Slot::Second),
            '\u{0644}' | '3' | 'L' => Some(Slot::Third),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
            Slot::Third => 2,
        }
    }
}

/// Short vowels, tanween and sukun. Shadda is not a vowel mark and is kept.
fn is_vowel_mark(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{0650}' | '\u{0652}')
}

/// Removes vowel marks, leaving consonants, long vowels and shadda.
pub fn strip_vowel_marks(word: &str) -> String {
    word.chars().filter(|&ch| !is_vowel_mark(ch)).collect()
}

/// True when `text` is non-empty and every character lies in the Arabic,
/// Arabic Supplement or Arabic Extended-A blocks.
pub fn is_arabic_text(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|ch| {
            matches!(ch as u32,
                0x0600..=0x06FF | // Arabic
                0x0750..=0x077F | // Arabic Supplement
                0x08A0..=0x08FF   // Arabic Extended-A
            )
        })
}
