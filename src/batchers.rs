//! [`BatchFn`] adapters over a [`Store`].
//!
//! Each adapter turns the unordered rows of one bulk query into one value
//! per requested key: `Option<T>` for lookups by id, `Vec<T>` for
//! one-to-many relationships (empty when a parent has no children).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::{PracticeTest, Term, TermConfusionPair, TermProgress, User};
use crate::store::Store;
use crate::BatchFn;

/// Lines rows up with `keys`, `None` where no row matched.
pub fn align<K, T>(keys: &[K], rows: Vec<T>, key_of: impl Fn(&T) -> K) -> Vec<Option<T>>
where
    K: Eq + Hash,
    T: Clone,
{
    let by_key: HashMap<K, T> = rows.into_iter().map(|row| (key_of(&row), row)).collect();
    keys.iter().map(|key| by_key.get(key).cloned()).collect()
}

/// Groups rows under `keys`, keeping the rows' relative order.
pub fn group<K, T>(keys: &[K], rows: Vec<T>, key_of: impl Fn(&T) -> K) -> Vec<Vec<T>>
where
    K: Eq + Hash,
    T: Clone,
{
    let mut groups: HashMap<K, Vec<T>> = HashMap::new();
    for row in rows {
        groups.entry(key_of(&row)).or_default().push(row);
    }
    keys.iter()
        .map(|key| groups.get(key).cloned().unwrap_or_default())
        .collect()
}

pub struct UserBatcher {
    store: Arc<dyn Store>,
}

impl UserBatcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchFn<Uuid, Option<User>> for UserBatcher {
    type Error = StoreError;

    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Option<User>>> {
        let users = self.store.users_by_ids(keys).await?;
        Ok(align(keys, users, |user| user.id))
    }
}

pub struct TermBatcher {
    store: Arc<dyn Store>,
}

impl TermBatcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchFn<Uuid, Option<Term>> for TermBatcher {
    type Error = StoreError;

    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Option<Term>>> {
        let terms = self.store.terms_by_ids(keys).await?;
        Ok(align(keys, terms, |term| term.id))
    }
}

/// Terms of each studyset, in `sort_order`.
pub struct StudysetTermsBatcher {
    store: Arc<dyn Store>,
}

impl StudysetTermsBatcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchFn<Uuid, Vec<Term>> for StudysetTermsBatcher {
    type Error = StoreError;

    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Vec<Term>>> {
        let mut terms = self.store.terms_by_studyset_ids(keys).await?;
        terms.sort_by_key(|term| term.sort_order);
        Ok(group(keys, terms, |term| term.studyset_id))
    }
}

/// Term count of each studyset; studysets without terms count 0.
pub struct TermCountBatcher {
    store: Arc<dyn Store>,
}

impl TermCountBatcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchFn<Uuid, i64> for TermCountBatcher {
    type Error = StoreError;

    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<i64>> {
        let counts = self.store.term_counts_by_studyset_ids(keys).await?;
        Ok(align(keys, counts, |count| count.studyset_id)
            .into_iter()
            .map(|count| count.map_or(0, |count| count.count))
            .collect())
    }
}

/// The requesting user's progress on each term. Anonymous requests get no
/// progress and never reach the store.
pub struct TermProgressBatcher {
    store: Arc<dyn Store>,
    user_id: Option<Uuid>,
}

impl TermProgressBatcher {
    pub fn new(store: Arc<dyn Store>, user_id: Option<Uuid>) -> Self {
        Self { store, user_id }
    }
}

#[async_trait]
impl BatchFn<Uuid, Option<TermProgress>> for TermProgressBatcher {
    type Error = StoreError;

    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Option<TermProgress>>> {
        let user_id = match self.user_id {
            Some(user_id) => user_id,
            None => {
                debug!(keys = keys.len(), "anonymous request, no term progress");
                return Ok(vec![None; keys.len()]);
            }
        };
        let progress = self.store.term_progress(user_id, keys).await?;
        Ok(align(keys, progress, |row| row.term_id))
    }
}

/// The requesting user's confusion pairs per term, most confused first.
pub struct ConfusionPairBatcher {
    store: Arc<dyn Store>,
    user_id: Option<Uuid>,
}

impl ConfusionPairBatcher {
    pub fn new(store: Arc<dyn Store>, user_id: Option<Uuid>) -> Self {
        Self { store, user_id }
    }
}

#[async_trait]
impl BatchFn<Uuid, Vec<TermConfusionPair>> for ConfusionPairBatcher {
    type Error = StoreError;

    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Vec<TermConfusionPair>>> {
        let user_id = match self.user_id {
            Some(user_id) => user_id,
            None => {
                debug!(keys = keys.len(), "anonymous request, no confusion pairs");
                return Ok(vec![Vec::new(); keys.len()]);
            }
        };
        let mut pairs = self.store.term_confusion_pairs(user_id, keys).await?;
        pairs.sort_by(|a, b| b.confused_count.cmp(&a.confused_count));
        Ok(group(keys, pairs, |pair| pair.term_id))
    }
}

/// The requesting user's practice tests per studyset, newest first.
pub struct PracticeTestBatcher {
    store: Arc<dyn Store>,
    user_id: Option<Uuid>,
}

impl PracticeTestBatcher {
    pub fn new(store: Arc<dyn Store>, user_id: Option<Uuid>) -> Self {
        Self { store, user_id }
    }
}

#[async_trait]
impl BatchFn<Uuid, Vec<PracticeTest>> for PracticeTestBatcher {
    type Error = StoreError;

    async fn load(&self, keys: &[Uuid]) -> StoreResult<Vec<Vec<PracticeTest>>> {
        let user_id = match self.user_id {
            Some(user_id) => user_id,
            None => {
                debug!(keys = keys.len(), "anonymous request, no practice tests");
                return Ok(vec![Vec::new(); keys.len()]);
            }
        };
        let mut tests = self.store.practice_tests(user_id, keys).await?;
        // RFC 3339 text in one offset sorts chronologically
        tests.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(group(keys, tests, |test| test.studyset_id))
    }
}
