use crate::{
    models::{Collection, Record},
    Error, Result,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where search candidates come from.
///
/// The ranking engine never talks to a store; the caller fetches the
/// candidates and hands them over. Keeping this behind a trait lets the
/// CLI read exported documents and tests use an in-memory set.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record in the collection, in store order
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Record>>;
}

/// Reads exported collections from a directory.
///
/// `<data_dir>/<collection>.json` must hold a JSON array of objects;
/// `<data_dir>/<collection>.jsonl` holds one object per line, which is
/// what `mongoexport` writes by default. The array file wins if both exist.
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn array_path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection))
    }

    fn lines_path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(format!("{}.jsonl", collection))
    }
}

#[async_trait::async_trait]
impl RecordStore for JsonFileStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Record>> {
        let array_path = self.array_path(collection);
        let lines_path = self.lines_path(collection);

        let records = if tokio::fs::try_exists(&array_path).await? {
            debug!("Reading {} from {}", collection, array_path.display());
            let contents = tokio::fs::read_to_string(&array_path).await?;
            parse_array(&contents)?
        } else if tokio::fs::try_exists(&lines_path).await? {
            debug!("Reading {} from {}", collection, lines_path.display());
            let contents = tokio::fs::read_to_string(&lines_path).await?;
            parse_lines(&contents)?
        } else {
            return Err(Error::NotFound(format!(
                "no {}.json or {}.jsonl in {}",
                collection,
                collection,
                self.data_dir.display()
            )));
        };

        info!("Fetched {} {}", records.len(), collection);
        Ok(records)
    }
}

fn parse_array(contents: &str) -> Result<Vec<Record>> {
    match serde_json::from_str::<Value>(contents)? {
        Value::Array(items) => items.into_iter().map(Record::try_from).collect(),
        _ => Err(Error::StoreError(
            "collection file must contain a JSON array".into(),
        )),
    }
}

fn parse_lines(contents: &str) -> Result<Vec<Record>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let value: Value = serde_json::from_str(line)
                .map_err(|e| Error::StoreError(format!("line {}: {}", i + 1, e)))?;
            Record::try_from(value)
        })
        .collect()
}

/// Fixed collections held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashMap<Collection, Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: Collection, records: Vec<Record>) -> Self {
        self.collections.insert(collection, records);
        self
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Record>> {
        Ok(self.collections.get(&collection).cloned().unwrap_or_default())
    }
}
