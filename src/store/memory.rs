//! In-memory store for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use super::Store;
use crate::error::{StoreError, StoreResult};
use crate::model::{PracticeTest, Term, TermConfusionPair, TermCount, TermProgress, User};

/// The queries a [`MemoryStore`] counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Users,
    TermsByIds,
    TermsByStudysetIds,
    TermCounts,
    TermProgress,
    ConfusionPairs,
    PracticeTests,
}

const QUERY_KINDS: usize = 7;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    terms: HashMap<Uuid, Term>,
    progress: Vec<TermProgress>,
    confusion_pairs: Vec<TermConfusionPair>,
    practice_tests: Vec<PracticeTest>,
}

/// Keeps every table in hash maps and vectors behind one lock. Rows come
/// back in no particular order, like an unordered SQL query would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    calls: [AtomicUsize; QUERY_KINDS],
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn insert_user(&self, user: User) {
        self.write().users.insert(user.id, user);
    }

    pub fn insert_term(&self, term: Term) {
        self.write().terms.insert(term.id, term);
    }

    pub fn insert_progress(&self, progress: TermProgress) {
        self.write().progress.push(progress);
    }

    pub fn insert_confusion_pair(&self, pair: TermConfusionPair) {
        self.write().confusion_pairs.push(pair);
    }

    pub fn insert_practice_test(&self, test: PracticeTest) {
        self.write().practice_tests.push(test);
    }

    /// While set, every query fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of times `query` ran, failed runs included.
    pub fn calls(&self, query: Query) -> usize {
        self.calls[query as usize].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .iter()
            .map(|calls| calls.load(Ordering::SeqCst))
            .sum()
    }

    fn begin(&self, query: Query) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.calls[query as usize].fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: format!("{:?} query refused", query),
            });
        }
        self.tables.read().map_err(|_| StoreError::Query {
            message: "tables lock poisoned".to_string(),
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    #[instrument(skip_all, fields(keys = ids.len()))]
    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let tables = self.begin(Query::Users)?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    #[instrument(skip_all, fields(keys = ids.len()))]
    async fn terms_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Term>> {
        let tables = self.begin(Query::TermsByIds)?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.terms.get(id).cloned())
            .collect())
    }

    #[instrument(skip_all, fields(keys = studyset_ids.len()))]
    async fn terms_by_studyset_ids(&self, studyset_ids: &[Uuid]) -> StoreResult<Vec<Term>> {
        let tables = self.begin(Query::TermsByStudysetIds)?;
        Ok(tables
            .terms
            .values()
            .filter(|term| studyset_ids.contains(&term.studyset_id))
            .cloned()
            .collect())
    }

    #[instrument(skip_all, fields(keys = studyset_ids.len()))]
    async fn term_counts_by_studyset_ids(
        &self,
        studyset_ids: &[Uuid],
    ) -> StoreResult<Vec<TermCount>> {
        let tables = self.begin(Query::TermCounts)?;
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for term in tables.terms.values() {
            if studyset_ids.contains(&term.studyset_id) {
                *counts.entry(term.studyset_id).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(studyset_id, count)| TermCount { studyset_id, count })
            .collect())
    }

    #[instrument(skip_all, fields(user_id = %user_id, keys = term_ids.len()))]
    async fn term_progress(
        &self,
        user_id: Uuid,
        term_ids: &[Uuid],
    ) -> StoreResult<Vec<TermProgress>> {
        let tables = self.begin(Query::TermProgress)?;
        Ok(tables
            .progress
            .iter()
            .filter(|row| row.user_id == user_id && term_ids.contains(&row.term_id))
            .cloned()
            .collect())
    }

    #[instrument(skip_all, fields(user_id = %user_id, keys = term_ids.len()))]
    async fn term_confusion_pairs(
        &self,
        user_id: Uuid,
        term_ids: &[Uuid],
    ) -> StoreResult<Vec<TermConfusionPair>> {
        let tables = self.begin(Query::ConfusionPairs)?;
        Ok(tables
            .confusion_pairs
            .iter()
            .filter(|row| row.user_id == user_id && term_ids.contains(&row.term_id))
            .cloned()
            .collect())
    }

    #[instrument(skip_all, fields(user_id = %user_id, keys = studyset_ids.len()))]
    async fn practice_tests(
        &self,
        user_id: Uuid,
        studyset_ids: &[Uuid],
    ) -> StoreResult<Vec<PracticeTest>> {
        let tables = self.begin(Query::PracticeTests)?;
        Ok(tables
            .practice_tests
            .iter()
            .filter(|row| row.user_id == user_id && studyset_ids.contains(&row.studyset_id))
            .cloned()
            .collect())
    }
}
