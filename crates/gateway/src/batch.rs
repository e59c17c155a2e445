//! Multi-symbol batching with per-symbol failure isolation.

use std::collections::BTreeMap;
use std::future::Future;

use futures::future::join_all;
use gateway_core::Result;
use serde::Serialize;
use tracing::debug;

/// Error recorded for one symbol of a batch: `{"error": description}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchError {
    /// Human-readable failure description.
    pub error: String,
}

/// Outcome for one symbol of a batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry<P> {
    /// The symbol's payload.
    Success(P),
    /// The symbol's failure.
    Failure(BatchError),
}

impl<P> BatchEntry<P> {
    /// The payload, if the symbol succeeded.
    #[must_use]
    pub const fn success(&self) -> Option<&P> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure(_) => None,
        }
    }

    /// The error description, if the symbol failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.error),
        }
    }
}

impl<P> From<Result<P>> for BatchEntry<P> {
    fn from(result: Result<P>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(e) => Self::Failure(BatchError {
                error: e.to_string(),
            }),
        }
    }
}

/// Outcomes keyed by the caller's original symbol string.
///
/// Always covers every distinct input symbol, whatever failed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResult<P> {
    entries: BTreeMap<String, BatchEntry<P>>,
}

impl<P> Default for BatchResult<P> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<P> BatchResult<P> {
    /// Outcome for a symbol, looked up by the caller's original string.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&BatchEntry<P>> {
        self.entries.get(symbol)
    }

    /// Number of distinct symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch had no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of failed symbols.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.error().is_some())
            .count()
    }

    /// Iterates outcomes in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BatchEntry<P>)> {
        self.entries.iter().map(|(symbol, entry)| (symbol.as_str(), entry))
    }

    fn record(&mut self, symbol: String, entry: BatchEntry<P>) {
        self.entries.insert(symbol, entry);
    }
}

/// Splits symbol lists into fixed-size chunks and fetches each symbol independently.
///
/// Symbols inside a chunk are fetched concurrently; chunks run one after
/// another. Chunking only paces upstream calls and never changes the
/// result shape.
#[derive(Clone, Copy, Debug)]
pub struct BatchCoordinator {
    chunk_size: usize,
}

impl BatchCoordinator {
    /// Create a coordinator. A zero chunk size is raised to one.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Symbols per chunk.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Runs `fetch` for every symbol and collects each outcome.
    ///
    /// One symbol's failure never aborts or skips the rest. Duplicates are
    /// fetched once per occurrence; the last outcome is the one kept.
    pub async fn fetch_many<P, F, Fut>(&self, symbols: &[String], fetch: F) -> BatchResult<P>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<P>>,
    {
        let mut result = BatchResult::default();

        for (index, chunk) in symbols.chunks(self.chunk_size).enumerate() {
            debug!(chunk = index, size = chunk.len(), "Dispatching batch chunk");

            let outcomes = join_all(chunk.iter().map(|symbol| fetch(symbol.clone()))).await;
            for (symbol, outcome) in chunk.iter().zip(outcomes) {
                result.record(symbol.clone(), BatchEntry::from(outcome));
            }
        }

        debug!(
            symbols = symbols.len(),
            failures = result.failures(),
            "Batch complete"
        );
        result
    }
}
