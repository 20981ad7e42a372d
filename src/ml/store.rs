use crate::error::{AppError, Result};
use crate::ml::classifier::{Classifier, FittedClassifier};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk format version of the model envelope
const STORE_FORMAT: u32 = 1;

/// Persistence for fitted classifiers. Splits are never stored.
pub trait ModelStore: Send + Sync {
    /// Persist a classifier, replacing any previous one
    fn save(&self, classifier: &FittedClassifier) -> Result<()>;

    /// Load the stored classifier, `None` when nothing has been saved
    fn load(&self) -> Result<Option<FittedClassifier>>;

    fn exists(&self) -> bool;
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: u32,
    classifier: &'a FittedClassifier,
}

#[derive(Deserialize)]
struct Envelope {
    format: u32,
    classifier: FittedClassifier,
}

/// Bincode file store
#[derive(Debug, Clone)]
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ModelStore for FileModelStore {
    fn save(&self, classifier: &FittedClassifier) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        let written = (|| -> Result<()> {
            let mut writer = BufWriter::new(fs::File::create(&temp)?);
            bincode::serialize_into(
                &mut writer,
                &EnvelopeRef {
                    format: STORE_FORMAT,
                    classifier,
                },
            )?;
            writer.flush()?;
            Ok(())
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        info!(
            path = %self.path.display(),
            members = classifier.n_members(),
            "Saved classifier"
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<FittedClassifier>> {
        if !self.exists() {
            debug!(path = %self.path.display(), "No stored classifier");
            return Ok(None);
        }

        let file = fs::File::open(&self.path)?;
        let len = file.metadata()?.len();
        // Length prefixes past the file size fail instead of allocating
        let envelope: Envelope = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(len)
            .deserialize_from(BufReader::new(file))?;
        if envelope.format != STORE_FORMAT {
            return Err(AppError::Serialization(format!(
                "unsupported model format {} (expected {})",
                envelope.format, STORE_FORMAT
            )));
        }

        info!(
            path = %self.path.display(),
            trained_at = %envelope.classifier.metadata().trained_at,
            "Loaded classifier"
        );
        Ok(Some(envelope.classifier))
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LabeledDataset;
    use crate::ml::classifier::{BaggedTreeTrainer, Trainer};
    use crate::ml::models::ForestConfig;
    use crate::models::WorkloadRecord;
    use tempfile::TempDir;

    fn trained() -> (LabeledDataset, FittedClassifier) {
        let mut records = Vec::new();
        for i in 0..6 {
            records.push(WorkloadRecord::from_values([1, 30 + i, 3, 1, 0, 0, 1, 8, 0]));
            records.push(WorkloadRecord::from_values([6, 150 + i, 12, 8, 4, 5, 8, 4, 5]));
        }
        let dataset = LabeledDataset::from_records(records);
        let config = ForestConfig {
            n_estimators: 8,
            ..ForestConfig::default()
        };
        let model = BaggedTreeTrainer::new(config, 42)
            .fit(&dataset.feature_matrix(), &dataset.labels())
            .unwrap();
        (dataset, model)
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = FileModelStore::new(dir.path().join("models").join("stress.bin"));
        let (dataset, model) = trained();

        assert!(!store.exists());
        store.save(&model).unwrap();
        assert!(store.exists());
        assert!(!store.temp_path().exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.n_members(), model.n_members());
        assert_eq!(
            loaded.metadata().hyperparameters,
            model.metadata().hyperparameters
        );
        assert_eq!(
            loaded.predict(&dataset.feature_matrix()).unwrap(),
            model.predict(&dataset.feature_matrix()).unwrap()
        );
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileModelStore::new(dir.path().join("absent.bin"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        fs::write(&path, b"not a model").unwrap();

        let result = FileModelStore::new(&path).load();
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[test]
    fn test_load_oversized_length_prefix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("truncated.bin");
        let mut bytes = STORE_FORMAT.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let result = FileModelStore::new(&path).load();
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[test]
    fn test_load_truncated_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stress.bin");
        let store = FileModelStore::new(&path);
        let (_, model) = trained();
        store.save(&model).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(store.load(), Err(AppError::Serialization(_))));
    }
}
