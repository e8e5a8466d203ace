use crate::job::Job;
use crate::types::JobId;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Lookup table of jobs keyed by id. No durability: jobs live as long as the registry does.
pub trait JobRegistry: Send + Sync {
    fn get(&self, id: &JobId) -> Option<Arc<Job>>;
    fn put(&self, job: Arc<Job>);
    fn list(&self) -> Vec<Arc<Job>>;
}

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    jobs: RwLock<HashMap<JobId, Arc<Job>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRegistry for InMemoryRegistry {
    fn get(&self, id: &JobId) -> Option<Arc<Job>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn put(&self, job: Arc<Job>) {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.id(), job);
    }

    fn list(&self) -> Vec<Arc<Job>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
