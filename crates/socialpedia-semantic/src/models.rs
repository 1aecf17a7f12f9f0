use serde::{Serialize, Serializer};
use socialpedia_core::Record;

/// Attribute added to every returned record
pub const SIMILARITY_FIELD: &str = "similarity";

/// A ranked record: an independent copy of the input plus its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    record: Record,
    similarity: f32,
}

impl ScoredRecord {
    /// Copy `original` and attach `similarity`, replacing any existing
    /// attribute of that name in the copy
    pub fn new(original: &Record, similarity: f32) -> Self {
        let mut record = original.clone();
        record.insert(SIMILARITY_FIELD, similarity);
        Self { record, similarity }
    }

    pub fn similarity(&self) -> f32 {
        self.similarity
    }

    /// The augmented copy, `similarity` included
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

impl Serialize for ScoredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

/// Counters from one ranking pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankStats {
    /// Records handed in
    pub total: usize,
    /// Records with no comparable text
    pub skipped_empty: usize,
    /// Records whose embedding failed
    pub failed: usize,
    /// Records that met the threshold
    pub matched: usize,
}

impl RankStats {
    /// Records that reached the embedding provider
    pub fn candidates(&self) -> usize {
        self.total - self.skipped_empty
    }

    pub fn failure_ratio(&self) -> f32 {
        match self.candidates() {
            0 => 0.0,
            n => self.failed as f32 / n as f32,
        }
    }
}

/// Everything `RankingEngine::rank` produces
#[derive(Debug, Clone, Default, Serialize)]
pub struct RankOutcome {
    /// Most similar first
    pub results: Vec<ScoredRecord>,
    pub stats: RankStats,
    /// Set when too many records failed to embed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RankOutcome {
    pub fn into_records(self) -> Vec<Record> {
        self.results.into_iter().map(ScoredRecord::into_record).collect()
    }
}
