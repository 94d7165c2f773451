//! Usage Metrics - per-call token records observed on the wire
//!
//! An append-only store of [`UsageRecord`]s with summation queries. It is
//! owned by whoever wires up the transport and shared through an `Arc`;
//! there is no process-global instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Token usage reported by one HTTP response
///
/// `total_tokens` is stored exactly as reported and is not checked against
/// `input_tokens + output_tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// `usage.prompt_tokens`
    pub input_tokens: u32,
    /// `usage.completion_tokens`
    pub output_tokens: u32,
    /// `usage.total_tokens`
    pub total_tokens: u32,
    /// `model` from the response body, empty when absent
    pub model: String,
    /// When the record was built
    pub recorded_at: DateTime<Utc>,
}

impl UsageRecord {
    /// Create a record stamped with the current time
    #[must_use]
    pub fn new(input_tokens: u32, output_tokens: u32, total_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
            model: String::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Set the model name
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Sums over every stored record, taken under one lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Number of records
    pub calls: u64,
    /// Sum of input tokens
    pub input_tokens: u64,
    /// Sum of output tokens
    pub output_tokens: u64,
    /// Sum of total tokens
    pub total_tokens: u64,
}

/// Append-only usage store, safe to share between tasks
#[derive(Debug, Default)]
pub struct UsageMetrics {
    records: RwLock<Vec<UsageRecord>>,
}

impl UsageMetrics {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the end of the sequence
    pub async fn append(&self, record: UsageRecord) {
        self.records.write().await.push(record);
    }

    /// Sum of `input_tokens` over all records (0 when empty)
    pub async fn sum_input(&self) -> u64 {
        self.sum_by(|r| r.input_tokens).await
    }

    /// Sum of `output_tokens` over all records (0 when empty)
    pub async fn sum_output(&self) -> u64 {
        self.sum_by(|r| r.output_tokens).await
    }

    /// Sum of `total_tokens` over all records (0 when empty)
    pub async fn sum_total(&self) -> u64 {
        self.sum_by(|r| r.total_tokens).await
    }

    /// All three sums plus the record count
    pub async fn summary(&self) -> UsageSummary {
        let records = self.records.read().await;
        records.iter().fold(UsageSummary::default(), |mut acc, r| {
            acc.calls += 1;
            acc.input_tokens += u64::from(r.input_tokens);
            acc.output_tokens += u64::from(r.output_tokens);
            acc.total_tokens += u64::from(r.total_tokens);
            acc
        })
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no record has been appended yet
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Snapshot of the records in append order
    pub async fn records(&self) -> Vec<UsageRecord> {
        self.records.read().await.clone()
    }

    async fn sum_by(&self, field: impl Fn(&UsageRecord) -> u32) -> u64 {
        let records = self.records.read().await;
        records.iter().map(|r| u64::from(field(r))).sum()
    }
}
