use metrics_exporter_prometheus::PrometheusHandle;
use sdgx::assessment::{
    AnswerValue, AssessmentStore, JsonFileStore, MemoryStore, QuestionCatalog, QuestionId,
    ResponseStore, StorageKey, StoreError,
};
use sdgx::config::{AssessmentConfig, StorageConfig};
use sdgx::error::AppError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store picked at startup: files when a data directory is configured, memory otherwise.
#[derive(Debug)]
pub(crate) enum ConfiguredStore {
    Memory(MemoryStore),
    File(JsonFileStore),
}

impl ConfiguredStore {
    pub(crate) fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        match &config.data_dir {
            Some(dir) => {
                info!(data_dir = %dir.display(), "persisting assessment state to disk");
                JsonFileStore::open(dir).map(Self::File)
            }
            None => {
                info!("no data directory configured, assessment state is kept in memory");
                Ok(Self::Memory(MemoryStore::new()))
            }
        }
    }
}

impl AssessmentStore for ConfiguredStore {
    fn load(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        match self {
            Self::Memory(store) => store.load(key),
            Self::File(store) => store.load(key),
        }
    }

    fn save(&self, key: StorageKey, value: &Value) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.save(key, value),
            Self::File(store) => store.save(key, value),
        }
    }

    fn clear(&self, key: StorageKey) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.clear(key),
            Self::File(store) => store.clear(key),
        }
    }
}

pub(crate) fn load_catalog(config: &AssessmentConfig) -> Result<QuestionCatalog, AppError> {
    load_catalog_from(config.catalog_path.as_deref())
}

pub(crate) fn load_catalog_from(path: Option<&Path>) -> Result<QuestionCatalog, AppError> {
    match path {
        Some(path) => {
            let catalog = QuestionCatalog::from_path(path)?;
            info!(path = %path.display(), questions = catalog.len(), "custom catalog loaded");
            Ok(catalog)
        }
        None => Ok(QuestionCatalog::standard()),
    }
}

/// Read a `{"<question id>": <answer>}` file, checking every entry against the catalog.
pub(crate) fn read_answers(path: &Path, catalog: &QuestionCatalog) -> Result<ResponseStore, AppError> {
    let raw = std::fs::read(path)?;
    let parsed: BTreeMap<QuestionId, AnswerValue> = serde_json::from_slice(&raw)?;
    validate_answers(parsed, catalog)
}

pub(crate) fn validate_answers(
    parsed: BTreeMap<QuestionId, AnswerValue>,
    catalog: &QuestionCatalog,
) -> Result<ResponseStore, AppError> {
    let mut responses = ResponseStore::new();
    for (question_id, value) in parsed {
        responses.record(catalog, question_id, value)?;
    }
    Ok(responses)
}
