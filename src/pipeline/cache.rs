//! Trained pipeline cache
//!
//! Keyed by (dataset digest, training params). Identical uploads reuse the
//! fitted model; a changed dataset or changed params is a miss.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use super::{PipelineParams, TrainedPipeline};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub dataset_digest: String,
    pub params: PipelineParams,
}

impl CacheKey {
    pub fn new(dataset_digest: impl Into<String>, params: PipelineParams) -> Self {
        Self {
            dataset_digest: dataset_digest.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Arc<TrainedPipeline>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

/// Bounded cache, evicting the oldest insert first
pub struct PipelineCache {
    capacity: usize,
    inner: RwLock<Inner>,
}

impl PipelineCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<TrainedPipeline>> {
        let mut inner = self.inner.write();
        let found = inner.entries.get(key).cloned();
        match found {
            Some(hit) => {
                inner.hits += 1;
                Some(hit)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, key: CacheKey, pipeline: Arc<TrainedPipeline>) {
        let mut inner = self.inner.write();
        if inner.entries.insert(key.clone(), pipeline).is_none() {
            inner.order.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            tracing::debug!("Evicted cached pipeline for dataset {}", oldest.dataset_digest);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            entries: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}
