use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::types::import::UserId;

/// Identifies one acquisition of a user's flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionToken(Uuid);

impl AdmissionToken {
    fn issue() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Per-user "bulk job running" flag. `release` must be idempotent and only
/// clears the flag while `token` still owns it.
pub trait JobAdmission: Send + Sync {
    fn try_acquire(&self, user_id: UserId) -> Option<AdmissionToken>;
    fn release(&self, user_id: UserId, token: AdmissionToken);
    fn is_active(&self, user_id: UserId) -> bool;
}

struct Flag {
    token: AdmissionToken,
    acquired_at: Instant,
}

impl Flag {
    fn new() -> Self {
        Self {
            token: AdmissionToken::issue(),
            acquired_at: Instant::now(),
        }
    }
}

/// Flags expire after `ttl` so a job that never released cannot lock a user out.
pub struct MemoryAdmission {
    flags: DashMap<UserId, Flag>,
    ttl: Duration,
}

impl MemoryAdmission {
    pub fn new(ttl: Duration) -> Self {
        Self {
            flags: DashMap::new(),
            ttl,
        }
    }

    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.flags.retain(|_, flag| flag.acquired_at.elapsed() < ttl);
        tracing::info!("Admission eviction complete. Active bulk jobs: {}", self.flags.len());
    }
}

impl JobAdmission for MemoryAdmission {
    fn try_acquire(&self, user_id: UserId) -> Option<AdmissionToken> {
        match self.flags.entry(user_id) {
            Entry::Occupied(mut slot) => {
                if slot.get().acquired_at.elapsed() < self.ttl {
                    return None;
                }
                tracing::warn!("Bulk job flag for user {} expired, taking it over", user_id);
                let flag = Flag::new();
                let token = flag.token;
                slot.insert(flag);
                Some(token)
            }
            Entry::Vacant(slot) => {
                let flag = Flag::new();
                let token = flag.token;
                slot.insert(flag);
                Some(token)
            }
        }
    }

    fn release(&self, user_id: UserId, token: AdmissionToken) {
        if self.flags.remove_if(&user_id, |_, flag| flag.token == token).is_none() {
            tracing::debug!("Flag for user {} no longer held by this job", user_id);
        }
    }

    fn is_active(&self, user_id: UserId) -> bool {
        self.flags
            .get(&user_id)
            .map(|flag| flag.acquired_at.elapsed() < self.ttl)
            .unwrap_or(false)
    }
}

/// Holds a user's admission flag and releases it on drop, including unwinds.
pub struct AdmissionGuard {
    admission: Arc<dyn JobAdmission>,
    user_id: UserId,
    token: AdmissionToken,
}

impl AdmissionGuard {
    pub fn acquire(admission: Arc<dyn JobAdmission>, user_id: UserId) -> Option<Self> {
        let token = admission.try_acquire(user_id)?;
        Some(Self {
            admission,
            user_id,
            token,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.admission.release(self.user_id, self.token);
        tracing::debug!("Released bulk job flag for user {}", self.user_id);
    }
}
