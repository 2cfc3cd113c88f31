use std::sync::Arc;

use dashmap::DashMap;

use crate::admission::MemoryAdmission;
use crate::config::Config;
use crate::store::MemoryStore;
use crate::types::import::{BatchTally, UserId};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<MemoryStore>,
    pub admission: Arc<MemoryAdmission>,
    last_tallies: Arc<DashMap<UserId, BatchTally>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            admission: Arc::new(MemoryAdmission::new(config.bulk_job_ttl)),
            config: Arc::new(config),
            store: Arc::new(MemoryStore::new()),
            last_tallies: Arc::new(DashMap::new()),
        }
    }

    pub fn record_tally(&self, user_id: UserId, tally: BatchTally) {
        self.last_tallies.insert(user_id, tally);
    }

    pub fn last_tally(&self, user_id: UserId) -> Option<BatchTally> {
        self.last_tallies.get(&user_id).map(|entry| entry.clone())
    }
}
