use serde::{Deserialize, Serialize};

use crate::letters::is_weak;

/// Weakness class of a trilateral root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weakness {
    /// No weak radical and no doubling.
    Sound,
    /// First radical is و or ي (مثال).
    Assimilated,
    /// Second radical is و or ي (أجوف).
    Hollow,
    /// Third radical is و or ي (ناقص).
    Defective,
    /// Second and third radicals are identical (مضعّف).
    Doubled,
}

impl Weakness {
    /// Radical positions responsible for the classification.
    pub fn positions(self) -> &'static [usize] {
        match self {
            Weakness::Sound => &[],
            Weakness::Assimilated => &[0],
            Weakness::Hollow => &[1],
            Weakness::Defective => &[2],
            Weakness::Doubled => &[1, 2],
        }
    }
}

/// Classifies `root`, checking the first, second and third radicals for a
/// weak letter in that order before testing for doubling. Roots that are not
/// exactly three characters long are reported as sound.
pub fn classify_weakness(root: &str) -> Weakness {
    let chars: Vec<char> = root.chars().collect();
    let &[c1, c2, c3] = chars.as_slice() else {
        return Weakness::Sound;
    };

    if is_weak(c1) {
        Weakness::Assimilated
    } else if is_weak(c2) {
        Weakness::Hollow
    } else if is_weak(c3) {
        Weakness::Defective
    } else if c2 == c3 {
        Weakness::Doubled
    } else {
        Weakness::Sound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(classify_weakness("كتب"), Weakness::Sound);
        assert_eq!(classify_weakness("وعد"), Weakness::Assimilated);
        assert_eq!(classify_weakness("قول"), Weakness::Hollow);
        assert_eq!(classify_weakness("بيع"), Weakness::Hollow);
        assert_eq!(classify_weakness("رمي"), Weakness::Defective);
        assert_eq!(classify_weakness("مدد"), Weakness::Doubled);
    }

    #[test]
    fn test_first_weak_position_wins() {
        // و at position 0 and ي at position 2
        assert_eq!(classify_weakness("وقي"), Weakness::Assimilated);
        // weak second radical takes precedence over doubling
        assert_eq!(classify_weakness("حيي"), Weakness::Hollow);
    }

    #[test]
    fn test_non_trilateral_is_sound() {
        assert_eq!(classify_weakness("كت"), Weakness::Sound);
        assert_eq!(classify_weakness("دحرج"), Weakness::Sound);
        assert_eq!(classify_weakness(""), Weakness::Sound);
        assert!(Weakness::Sound.positions().is_empty());
        assert_eq!(Weakness::Doubled.positions(), &[1, 2]);
    }
}
