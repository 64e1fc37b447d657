use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

pub mod pattern_index;
pub mod root_index;

pub use pattern_index::{
    polynomial_hash, BucketView, ChainEntryView, PatternIndex, PatternIndexError, TableStructure,
    DEFAULT_TABLE_SIZE,
};
pub use root_index::{AvlNode, Iter, RootIndex, RootIndexError, TreeNodeView};

/// A word derived from a root, with the template that produced it and how
/// many times it has been generated or validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedWord {
    pub template: String,
    pub frequency: u64,
}

impl DerivedWord {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            frequency: 1,
        }
    }
}

/// Derived words of a single root, keyed by the word itself.
pub type DerivedWords = BTreeMap<String, DerivedWord>;

/// One root and its derived words, as produced by [`RootIndex::dump_with_words`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    pub root: String,
    #[serde(default)]
    pub derived_words: DerivedWords,
}

/// Key ordering used by [`RootIndex`].
///
/// The default, [`CodePointOrder`], compares roots code point by code point,
/// which is not the traditional abjad order of the Arabic alphabet.
pub trait RootOrder: fmt::Debug + Send + Sync {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodePointOrder;

impl RootOrder for CodePointOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        // UTF-8 byte order coincides with code point order.
        a.cmp(b)
    }
}
