//! In-memory user repository

use async_trait::async_trait;
use chrono::Utc;
use rankr_common::{RankrError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::UserRepository;
use crate::models::{User, UserId};

#[derive(Debug, Default)]
struct Store {
    users: HashMap<UserId, User>,
    next_address_id: i64,
}

/// Process-local repository backed by a `HashMap`
///
/// Mirrors the PostgreSQL adapter's observable behaviour: upserts replace
/// the address list, keep the original `created_at`, and assign address
/// ids in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    store: Mutex<Store>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored user, ordered by id
    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.lock().users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        users
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert_user(&self, mut user: User) -> Result<()> {
        if user.id == 0 {
            return Err(RankrError::InvalidId("id must be greater than zero".to_string()));
        }

        let now = Utc::now();
        let mut store = self.lock();

        let created_at = store
            .users
            .get(&user.id)
            .and_then(|existing| existing.created_at)
            .or(user.created_at)
            .unwrap_or(now);
        user.created_at = Some(created_at);
        user.updated_at = Some(now);

        for address in &mut user.addresses {
            store.next_address_id += 1;
            address.id = Some(store.next_address_id);
            address.created_at = Some(address.created_at.unwrap_or(now));
            address.updated_at = Some(now);
        }

        store.users.insert(user.id, user);
        Ok(())
    }

    async fn get_by_id(&self, id: UserId) -> Result<User> {
        self.lock()
            .users
            .get(&id)
            .cloned()
            .ok_or(RankrError::UserNotFound(id))
    }
}
