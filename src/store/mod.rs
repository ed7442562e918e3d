//! The bulk queries behind the loaders.
//!
//! A [`Store`] answers each query with whatever rows it finds, in any order.
//! Missing rows are simply absent; lining rows up with the requested keys is
//! the job of the [`batchers`](crate::batchers).

mod memory;

pub use memory::{MemoryStore, Query};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::model::{PracticeTest, Term, TermConfusionPair, TermCount, TermProgress, User};

#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    async fn terms_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Term>>;

    async fn terms_by_studyset_ids(&self, studyset_ids: &[Uuid]) -> StoreResult<Vec<Term>>;

    /// Studysets without terms may be left out.
    async fn term_counts_by_studyset_ids(
        &self,
        studyset_ids: &[Uuid],
    ) -> StoreResult<Vec<TermCount>>;

    /// Progress rows of `user_id` only.
    async fn term_progress(
        &self,
        user_id: Uuid,
        term_ids: &[Uuid],
    ) -> StoreResult<Vec<TermProgress>>;

    /// Confusion pairs of `user_id` only.
    async fn term_confusion_pairs(
        &self,
        user_id: Uuid,
        term_ids: &[Uuid],
    ) -> StoreResult<Vec<TermConfusionPair>>;

    /// Practice tests taken by `user_id` only.
    async fn practice_tests(
        &self,
        user_id: Uuid,
        studyset_ids: &[Uuid],
    ) -> StoreResult<Vec<PracticeTest>>;
}
