use metrics::counter;
use sarf_core::{Lexicon, LexiconError, LexiconSnapshot};
use sarf_index::RootRecord;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const ROOTS_FILE: &str = "roots.json";
pub const PATTERNS_FILE: &str = "patterns.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("lexicon error: {0}")]
    Lexicon(#[from] LexiconError),

    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// On-disk shape of `roots.json`. Older data directories hold a bare list of
/// root strings without derived words.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RootsFile {
    Records(Vec<RootRecord>),
    Legacy(Vec<String>),
}

impl From<RootsFile> for Vec<RootRecord> {
    fn from(file: RootsFile) -> Self {
        match file {
            RootsFile::Records(records) => records,
            RootsFile::Legacy(roots) => roots
                .into_iter()
                .map(|root| RootRecord {
                    root,
                    derived_words: Default::default(),
                })
                .collect(),
        }
    }
}

/// JSON snapshot store for a lexicon: one file for roots, one for patterns.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn dir(&self) -> &Path {
        &self.root
    }

    pub fn roots_path(&self) -> PathBuf {
        self.root.join(ROOTS_FILE)
    }

    pub fn patterns_path(&self) -> PathBuf {
        self.root.join(PATTERNS_FILE)
    }

    /// Reads the last saved snapshot. Missing files load as empty.
    pub fn load(&self) -> Result<LexiconSnapshot, StorageError> {
        let roots: Vec<RootRecord> = read_json::<RootsFile>(&self.roots_path())?
            .map(Into::into)
            .unwrap_or_default();
        let patterns: Vec<String> = read_json(&self.patterns_path())?.unwrap_or_default();

        info!(
            roots = roots.len(),
            patterns = patterns.len(),
            dir = %self.root.display(),
            "snapshot loaded"
        );
        Ok(LexiconSnapshot { roots, patterns })
    }

    /// Writes both files; each one is replaced atomically.
    pub fn save(&self, snapshot: &LexiconSnapshot) -> Result<(), StorageError> {
        write_json_atomic(&self.roots_path(), &snapshot.roots)?;
        write_json_atomic(&self.patterns_path(), &snapshot.patterns)?;
        counter!("sarf_snapshots_saved_total").increment(1);
        debug!(
            roots = snapshot.roots.len(),
            patterns = snapshot.patterns.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Rebuilds a lexicon from the saved snapshot.
    pub fn load_lexicon(&self, table_size: usize) -> Result<Lexicon, StorageError> {
        let snapshot = self.load()?;
        Ok(Lexicon::from_snapshot(snapshot, table_size)?)
    }

    pub fn save_lexicon(&self, lexicon: &Lexicon) -> Result<(), StorageError> {
        self.save(&lexicon.snapshot())
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(Some(value))
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp_file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    temp_file.as_file().sync_all()?;
    temp_file
        .persist(path)
        .map_err(|source| StorageError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}
