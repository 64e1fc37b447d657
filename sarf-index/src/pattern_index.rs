//! Fixed-size hash table of morphological patterns.
//!
//! Templates are hashed with a polynomial rolling hash and chained per
//! bucket, newest entry first. The table never grows, so its load factor may
//! exceed 1 and lookups degrade to a linear scan of the chain.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE_SIZE: usize = 101;

const HASH_BASE: u64 = 31;
const HASH_MODULUS: u64 = 1_000_000_007;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PatternIndexError {
    #[error("pattern '{0}' already exists")]
    AlreadyExists(String),

    #[error("pattern '{0}' not found")]
    NotFound(String),

    #[error("pattern table size must be positive")]
    InvalidTableSize,
}

/// Polynomial rolling hash over the code points of `template`, modulo
/// 1 000 000 007.
pub fn polynomial_hash(template: &str) -> u64 {
    template.chars().fold(0, |hash, ch| {
        (hash * HASH_BASE + u64::from(u32::from(ch))) % HASH_MODULUS
    })
}

#[derive(Debug, Clone)]
struct HashEntry {
    template: String,
    hash: u64,
    next: Option<Box<HashEntry>>,
}

type Chain = Option<Box<HashEntry>>;

struct ChainIter<'a> {
    cursor: Option<&'a HashEntry>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a HashEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.cursor?;
        self.cursor = entry.next.as_deref();
        Some(entry)
    }
}

fn chain_iter(chain: &Chain) -> ChainIter<'_> {
    ChainIter {
        cursor: chain.as_deref(),
    }
}

fn unlink(link: &mut Chain, template: &str) -> bool {
    match link {
        None => false,
        Some(entry) if entry.template == template => {
            let next = entry.next.take();
            *link = next;
            true
        }
        Some(entry) => unlink(&mut entry.next, template),
    }
}

#[derive(Debug, Clone)]
pub struct PatternIndex {
    buckets: Vec<Chain>,
    count: usize,
}

impl Default for PatternIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternIndex {
    pub fn new() -> Self {
        Self {
            buckets: vec![None; DEFAULT_TABLE_SIZE],
            count: 0,
        }
    }

    pub fn with_table_size(table_size: usize) -> Result<Self, PatternIndexError> {
        if table_size == 0 {
            return Err(PatternIndexError::InvalidTableSize);
        }
        Ok(Self {
            buckets: vec![None; table_size],
            count: 0,
        })
    }

    pub fn table_size(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_index(&self, template: &str) -> usize {
        (polynomial_hash(template) % self.buckets.len() as u64) as usize
    }

    pub fn put(&mut self, template: &str) -> Result<(), PatternIndexError> {
        if self.exists(template) {
            return Err(PatternIndexError::AlreadyExists(template.to_string()));
        }
        let hash = polynomial_hash(template);
        let slot = (hash % self.buckets.len() as u64) as usize;
        let bucket = &mut self.buckets[slot];
        let entry = Box::new(HashEntry {
            template: template.to_string(),
            hash,
            next: bucket.take(),
        });
        *bucket = Some(entry);
        self.count += 1;
        Ok(())
    }

    pub fn exists(&self, template: &str) -> bool {
        chain_iter(&self.buckets[self.bucket_index(template)])
            .any(|entry| entry.template == template)
    }

    pub fn get(&self, template: &str) -> bool {
        self.exists(template)
    }

    pub fn delete(&mut self, template: &str) -> Result<(), PatternIndexError> {
        let index = self.bucket_index(template);
        if unlink(&mut self.buckets[index], template) {
            self.count -= 1;
            Ok(())
        } else {
            Err(PatternIndexError::NotFound(template.to_string()))
        }
    }

    pub fn update(&mut self, old_template: &str, new_template: &str) -> Result<(), PatternIndexError> {
        if !self.exists(old_template) {
            return Err(PatternIndexError::NotFound(old_template.to_string()));
        }
        if old_template != new_template && self.exists(new_template) {
            return Err(PatternIndexError::AlreadyExists(new_template.to_string()));
        }
        self.delete(old_template)?;
        self.put(new_template)
    }

    /// All templates, sorted; bucket order never leaks into the result.
    pub fn get_all_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self
            .buckets
            .iter()
            .flat_map(chain_iter)
            .map(|entry| entry.template.clone())
            .collect();
        patterns.sort();
        patterns
    }

    pub fn size(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.buckets.len() as f64
    }

    /// Length of every chain, indexed by bucket.
    pub fn chain_lengths(&self) -> Vec<usize> {
        self.buckets
            .iter()
            .map(|chain| chain_iter(chain).count())
            .collect()
    }

    pub fn non_empty_buckets(&self) -> usize {
        self.buckets.iter().filter(|chain| chain.is_some()).count()
    }

    /// Entries beyond the first in each chain, summed over all buckets.
    pub fn collisions(&self) -> usize {
        self.chain_lengths()
            .into_iter()
            .map(|len| len.saturating_sub(1))
            .sum()
    }

    pub fn structure(&self) -> TableStructure {
        let buckets: Vec<BucketView> = self
            .buckets
            .iter()
            .enumerate()
            .map(|(index, chain)| {
                let chain: Vec<ChainEntryView> = chain_iter(chain)
                    .map(|entry| ChainEntryView {
                        template: entry.template.clone(),
                        hash_value: entry.hash,
                    })
                    .collect();
                BucketView {
                    index,
                    count: chain.len(),
                    chain,
                }
            })
            .collect();

        TableStructure {
            size: self.buckets.len(),
            count: self.count,
            load_factor: self.load_factor(),
            non_empty_buckets: buckets.iter().filter(|bucket| bucket.count > 0).count(),
            collisions: buckets
                .iter()
                .map(|bucket| bucket.count.saturating_sub(1))
                .sum(),
            buckets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStructure {
    pub size: usize,
    pub count: usize,
    pub load_factor: f64,
    pub non_empty_buckets: usize,
    pub collisions: usize,
    pub buckets: Vec<BucketView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketView {
    pub index: usize,
    pub count: usize,
    pub chain: Vec<ChainEntryView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntryView {
    pub template: String,
    pub hash_value: u64,
}
