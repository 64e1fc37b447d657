use metrics::counter;
use sarf_index::{
    DerivedWords, PatternIndex, PatternIndexError, RootIndex, RootIndexError, RootRecord,
    TableStructure, TreeNodeView,
};
use sarf_morph::{generate_derivatives, is_arabic_text, strip_vowel_marks, validate_word};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use sarf_index::{DerivedWord, DEFAULT_TABLE_SIZE};
pub use sarf_morph::Derivative;

/// Upper bound on the error lines kept in an [`ImportReport`].
pub const MAX_REPORTED_ERRORS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("root '{0}' must be exactly 3 characters (trilateral)")]
    InvalidRootLength(String),

    #[error("root '{0}' must contain only Arabic letters")]
    NonArabicRoot(String),

    #[error("template is required")]
    EmptyTemplate,

    #[error("at least one template is required")]
    NoTemplates,

    #[error(transparent)]
    Root(#[from] RootIndexError),

    #[error(transparent)]
    Pattern(#[from] PatternIndexError),
}

/// Coarse classification of a [`LexiconError`] for callers that map errors
/// onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Invalid,
    NotFound,
    Conflict,
}

impl LexiconError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LexiconError::Root(RootIndexError::NotFound(_))
            | LexiconError::Pattern(PatternIndexError::NotFound(_)) => ErrorKind::NotFound,
            LexiconError::Root(RootIndexError::AlreadyExists(_))
            | LexiconError::Pattern(PatternIndexError::AlreadyExists(_)) => ErrorKind::Conflict,
            _ => ErrorKind::Invalid,
        }
    }
}

/// Checks that `root` is trilateral and written in Arabic script.
pub fn validate_root(root: &str) -> Result<(), LexiconError> {
    if root.chars().count() != 3 {
        return Err(LexiconError::InvalidRootLength(root.to_string()));
    }
    if !is_arabic_text(root) {
        return Err(LexiconError::NonArabicRoot(root.to_string()));
    }
    Ok(())
}

fn ensure_trilateral(root: &str) -> Result<(), LexiconError> {
    if root.chars().count() != 3 {
        return Err(LexiconError::InvalidRootLength(root.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub added: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateManyReport {
    pub derivatives: Vec<Derivative>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconStats {
    pub total_roots: usize,
    pub total_patterns: usize,
    pub avl_height: usize,
    pub hash_load_factor: f64,
}

/// Everything needed to rebuild a [`Lexicon`]: roots in sorted order with
/// their derived words, and templates in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconSnapshot {
    pub roots: Vec<RootRecord>,
    pub patterns: Vec<String>,
}

/// The root and pattern stores, plus the derived-word bookkeeping that ties
/// them together.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    roots: RootIndex,
    patterns: PatternIndex,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_size(table_size: usize) -> Result<Self, LexiconError> {
        Ok(Self {
            roots: RootIndex::new(),
            patterns: PatternIndex::with_table_size(table_size)?,
        })
    }

    pub fn from_snapshot(snapshot: LexiconSnapshot, table_size: usize) -> Result<Self, LexiconError> {
        let mut lexicon = Self::with_table_size(table_size)?;
        for record in snapshot.roots {
            if record.root.is_empty() {
                continue;
            }
            if !lexicon.roots.restore(&record.root, record.derived_words) {
                warn!(root = %record.root, "duplicate root in snapshot, keeping last entry");
            }
        }
        for template in snapshot.patterns {
            if let Err(err) = lexicon.patterns.put(&template) {
                warn!(error = %err, "skipping pattern from snapshot");
            }
        }
        debug!(
            roots = lexicon.roots.size(),
            patterns = lexicon.patterns.size(),
            "lexicon restored"
        );
        Ok(lexicon)
    }

    pub fn snapshot(&self) -> LexiconSnapshot {
        LexiconSnapshot {
            roots: self.roots.dump_with_words(),
            patterns: self.patterns.get_all_patterns(),
        }
    }

    pub fn root_index(&self) -> &RootIndex {
        &self.roots
    }

    pub fn pattern_index(&self) -> &PatternIndex {
        &self.patterns
    }

    pub fn add_root(&mut self, root: &str) -> Result<(), LexiconError> {
        validate_root(root)?;
        self.roots.insert(root)?;
        debug!(%root, total = self.roots.size(), "root added");
        Ok(())
    }

    /// Adds one root per non-blank line of `text`. Lines that fail validation
    /// or already exist are counted as skipped.
    pub fn import_roots(&mut self, text: &str) -> ImportReport {
        let mut report = ImportReport::default();
        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            match self.add_root(line) {
                Ok(()) => report.added += 1,
                Err(err) => {
                    warn!(root = %line, error = %err, "skipping imported root");
                    report.skipped += 1;
                    if report.errors.len() < MAX_REPORTED_ERRORS {
                        report.errors.push(format!("skipped '{line}': {err}"));
                    }
                }
            }
        }
        debug!(added = report.added, skipped = report.skipped, "roots imported");
        report
    }

    pub fn remove_root(&mut self, root: &str) -> Result<DerivedWords, LexiconError> {
        let words = self.roots.delete(root)?;
        debug!(%root, total = self.roots.size(), "root removed");
        Ok(words)
    }

    pub fn rename_root(&mut self, old_root: &str, new_root: &str) -> Result<(), LexiconError> {
        validate_root(new_root)?;
        self.roots.update(old_root, new_root)?;
        debug!(%old_root, %new_root, "root renamed");
        Ok(())
    }

    pub fn contains_root(&self, root: &str) -> bool {
        self.roots.search(root)
    }

    pub fn roots(&self) -> Vec<String> {
        self.roots.in_order()
    }

    pub fn derived_words(&self, root: &str) -> Result<&DerivedWords, LexiconError> {
        self.roots
            .get_derived_words(root)
            .ok_or_else(|| RootIndexError::NotFound(root.to_string()).into())
    }

    pub fn root_tree(&self) -> Option<TreeNodeView> {
        self.roots.structure()
    }

    pub fn add_pattern(&mut self, template: &str) -> Result<(), LexiconError> {
        if template.is_empty() {
            return Err(LexiconError::EmptyTemplate);
        }
        self.patterns.put(template)?;
        debug!(%template, total = self.patterns.size(), "pattern added");
        Ok(())
    }

    pub fn remove_pattern(&mut self, template: &str) -> Result<(), LexiconError> {
        self.patterns.delete(template)?;
        debug!(%template, total = self.patterns.size(), "pattern removed");
        Ok(())
    }

    pub fn rename_pattern(&mut self, old_template: &str, new_template: &str) -> Result<(), LexiconError> {
        if new_template.is_empty() {
            return Err(LexiconError::EmptyTemplate);
        }
        self.patterns.update(old_template, new_template)?;
        debug!(%old_template, %new_template, "pattern renamed");
        Ok(())
    }

    pub fn contains_pattern(&self, template: &str) -> bool {
        self.patterns.exists(template)
    }

    pub fn patterns(&self) -> Vec<String> {
        self.patterns.get_all_patterns()
    }

    pub fn pattern_table(&self) -> TableStructure {
        self.patterns.structure()
    }

    fn ensure_known_root(&self, root: &str) -> Result<(), LexiconError> {
        ensure_trilateral(root)?;
        if !self.roots.search(root) {
            return Err(RootIndexError::NotFound(root.to_string()).into());
        }
        Ok(())
    }

    fn record(&mut self, root: &str, word: &str, template: &str) -> Result<(), LexiconError> {
        self.roots.add_derived_word(root, word, template)?;
        Ok(())
    }

    /// Generates the word for a stored root and template and records its
    /// bare spelling.
    pub fn generate(&mut self, root: &str, template: &str) -> Result<Derivative, LexiconError> {
        self.ensure_known_root(root)?;
        if !self.patterns.exists(template) {
            return Err(PatternIndexError::NotFound(template.to_string()).into());
        }

        let derivative = Derivative::new(root, template);
        if !derivative.generated_word.is_empty() {
            self.record(root, &derivative.generated_word, template)?;
            counter!("sarf_words_generated_total").increment(1);
        }
        debug!(%root, %template, word = %derivative.generated_word, "word generated");
        Ok(derivative)
    }

    /// Generates one word per requested template. Templates that are not
    /// stored are reported back instead of failing the whole request.
    pub fn generate_many(
        &mut self,
        root: &str,
        templates: &[String],
    ) -> Result<GenerateManyReport, LexiconError> {
        ensure_trilateral(root)?;
        if templates.is_empty() {
            return Err(LexiconError::NoTemplates);
        }
        self.ensure_known_root(root)?;

        let (known, skipped): (Vec<String>, Vec<String>) = templates
            .iter()
            .cloned()
            .partition(|template| self.patterns.exists(template));
        let derivatives = generate_derivatives(root, &known);
        self.record_all(root, &derivatives)?;

        Ok(GenerateManyReport {
            derivatives,
            skipped,
        })
    }

    /// Applies `root` to every stored template, in sorted template order.
    pub fn derive_all(&mut self, root: &str) -> Result<Vec<Derivative>, LexiconError> {
        self.ensure_known_root(root)?;
        let templates = self.patterns.get_all_patterns();
        let derivatives = generate_derivatives(root, &templates);
        self.record_all(root, &derivatives)?;
        Ok(derivatives)
    }

    fn record_all(&mut self, root: &str, derivatives: &[Derivative]) -> Result<(), LexiconError> {
        for derivative in derivatives {
            self.record(root, &derivative.generated_word, &derivative.template)?;
        }
        counter!("sarf_words_generated_total").increment(derivatives.len() as u64);
        debug!(%root, count = derivatives.len(), "derivatives generated");
        Ok(())
    }

    /// Returns the first stored template (sorted order) that generates
    /// `word` from `root`, recording the word without vowel marks when one
    /// is found.
    pub fn validate(&mut self, word: &str, root: &str) -> Result<Option<String>, LexiconError> {
        self.ensure_known_root(root)?;
        let templates = self.patterns.get_all_patterns();
        let matched = validate_word(word, root, &templates).map(str::to_string);

        let outcome = if matched.is_some() { "valid" } else { "invalid" };
        counter!("sarf_validations_total", "outcome" => outcome).increment(1);

        if let Some(template) = &matched {
            self.record(root, &strip_vowel_marks(word), template)?;
        }
        debug!(%word, %root, ?matched, "word validated");
        Ok(matched)
    }

    pub fn stats(&self) -> LexiconStats {
        LexiconStats {
            total_roots: self.roots.size(),
            total_patterns: self.patterns.size(),
            avl_height: self.roots.height(),
            hash_load_factor: self.patterns.load_factor(),
        }
    }

    pub fn table_size(&self) -> usize {
        self.patterns.table_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Lexicon {
        let mut lexicon = Lexicon::new();
        for root in ["كتب", "قول", "رمي"] {
            lexicon.add_root(root).unwrap();
        }
        for template in ["فَاعِل", "مَفْعُول", "فعل"] {
            lexicon.add_pattern(template).unwrap();
        }
        lexicon
    }

    #[test]
    fn root_validation() {
        let mut lexicon = Lexicon::new();
        assert!(matches!(
            lexicon.add_root("كت"),
            Err(LexiconError::InvalidRootLength(_))
        ));
        assert!(matches!(
            lexicon.add_root("abc"),
            Err(LexiconError::NonArabicRoot(_))
        ));
        lexicon.add_root("كتب").unwrap();
        let err = lexicon.add_root("كتب").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "root 'كتب' already exists");
    }

    #[test]
    fn import_reports_skips() {
        let mut lexicon = Lexicon::new();
        lexicon.add_root("كتب").unwrap();
        let report = lexicon.import_roots("درس\n\n  علم  \nكتب\nab\r\nكتبة\n");
        assert_eq!(report.added, 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors[0].contains("already exists"));
        assert_eq!(lexicon.roots(), vec!["درس", "علم", "كتب"]);
    }

    #[test]
    fn import_caps_error_lines() {
        let mut lexicon = Lexicon::new();
        let text = (0..25).map(|i| format!("x{i}\n")).collect::<String>();
        let report = lexicon.import_roots(&text);
        assert_eq!(report.skipped, 25);
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
    }

    #[test]
    fn rename_root_keeps_words() {
        let mut lexicon = seeded();
        lexicon.generate("كتب", "فَاعِل").unwrap();
        assert!(matches!(
            lexicon.rename_root("كتب", "x"),
            Err(LexiconError::InvalidRootLength(_))
        ));
        lexicon.rename_root("كتب", "درس").unwrap();
        assert!(!lexicon.contains_root("كتب"));
        assert!(lexicon.derived_words("درس").unwrap().contains_key("كاتب"));
        let err = lexicon.rename_root("درس", "قول").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn generate_records_frequency() {
        let mut lexicon = seeded();
        let derivative = lexicon.generate("كتب", "فَاعِل").unwrap();
        assert_eq!(derivative.generated_word, "كاتب");
        assert_eq!(derivative.vocalized, "كَاتِب");
        assert_eq!(lexicon.generate("كتب", "فَاعِل").unwrap().generated_word, "كاتب");
        let words = lexicon.derived_words("كتب").unwrap();
        assert_eq!(words["كاتب"].frequency, 2);
        assert_eq!(words["كاتب"].template, "فَاعِل");

        let err = lexicon.generate("درس", "فَاعِل").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = lexicon.generate("كتب", "فِعَال").unwrap_err();
        assert_eq!(err.to_string(), "pattern 'فِعَال' not found");
        assert!(matches!(
            lexicon.generate("كتبة", "فَاعِل"),
            Err(LexiconError::InvalidRootLength(_))
        ));
    }

    #[test]
    fn generate_many_reports_unknown_templates() {
        let mut lexicon = seeded();
        let templates = vec!["فَاعِل".to_string(), "فِعَال".to_string(), "فعل".to_string()];
        let report = lexicon.generate_many("قول", &templates).unwrap();
        assert_eq!(report.skipped, vec!["فِعَال"]);
        let words: Vec<_> = report
            .derivatives
            .iter()
            .map(|d| d.generated_word.as_str())
            .collect();
        assert_eq!(words.len(), 2);
        assert_eq!(lexicon.derived_words("قول").unwrap().len(), 2);

        assert!(matches!(
            lexicon.generate_many("قول", &[]),
            Err(LexiconError::NoTemplates)
        ));
    }

    #[test]
    fn derive_all_uses_sorted_templates() {
        let mut lexicon = seeded();
        let derivatives = lexicon.derive_all("كتب").unwrap();
        let templates: Vec<_> = derivatives.iter().map(|d| d.template.clone()).collect();
        assert_eq!(templates, lexicon.patterns());
        assert_eq!(lexicon.derived_words("كتب").unwrap().len(), 3);
    }

    #[test]
    fn validate_records_on_success_only() {
        let mut lexicon = seeded();
        assert_eq!(
            lexicon.validate("مكتوب", "كتب").unwrap().as_deref(),
            Some("مَفْعُول")
        );
        assert_eq!(lexicon.validate("مكتبة", "كتب").unwrap(), None);
        let words = lexicon.derived_words("كتب").unwrap();
        assert_eq!(words.len(), 1);
        assert!(words.contains_key("مكتوب"));

        let err = lexicon.validate("مكتوب", "علم").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn validate_accepts_vocalized_spelling() {
        let mut lexicon = seeded();
        assert_eq!(
            lexicon.validate("كَاتِب", "كتب").unwrap().as_deref(),
            Some("فَاعِل")
        );
        assert_eq!(
            lexicon.validate("كاتب", "كتب").unwrap().as_deref(),
            Some("فَاعِل")
        );
        let words = lexicon.derived_words("كتب").unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words["كاتب"].frequency, 2);
        assert!(!words.contains_key("كَاتِب"));
    }

    #[test]
    fn pattern_management() {
        let mut lexicon = seeded();
        assert!(matches!(
            lexicon.add_pattern(""),
            Err(LexiconError::EmptyTemplate)
        ));
        assert!(matches!(
            lexicon.rename_pattern("فعل", ""),
            Err(LexiconError::EmptyTemplate)
        ));
        lexicon.rename_pattern("فعل", "افتعل").unwrap();
        assert!(lexicon.contains_pattern("افتعل"));
        lexicon.remove_pattern("افتعل").unwrap();
        assert_eq!(
            lexicon.remove_pattern("افتعل").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(lexicon.pattern_table().count, 2);
    }

    #[test]
    fn stats_reflect_contents() {
        let lexicon = seeded();
        let stats = lexicon.stats();
        assert_eq!(stats.total_roots, 3);
        assert_eq!(stats.total_patterns, 3);
        assert_eq!(stats.avl_height, 2);
        assert!((stats.hash_load_factor - 3.0 / 101.0).abs() < 1e-12);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut lexicon = seeded();
        lexicon.derive_all("كتب").unwrap();
        let snapshot = lexicon.snapshot();

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: LexiconSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Lexicon::from_snapshot(decoded, 7).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.table_size(), 7);
        assert!(Lexicon::from_snapshot(LexiconSnapshot::default(), 0).is_err());
    }

    #[test]
    fn removing_root_returns_words() {
        let mut lexicon = seeded();
        lexicon.generate("رمي", "فعل").unwrap();
        let words = lexicon.remove_root("رمي").unwrap();
        assert!(words.contains_key("رمى"));
        assert!(lexicon.root_tree().is_some());
        assert_eq!(lexicon.remove_root("رمي").unwrap_err().kind(), ErrorKind::NotFound);
    }
}
