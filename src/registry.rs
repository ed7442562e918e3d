//! One lazily built loader per entity or relationship type, per request.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;
use uuid::Uuid;

use crate::batchers::{
    ConfusionPairBatcher, PracticeTestBatcher, StudysetTermsBatcher, TermBatcher,
    TermCountBatcher, TermProgressBatcher, UserBatcher,
};
use crate::cancel::CancelSignal;
use crate::config::LoaderConfig;
use crate::model::{PracticeTest, Term, TermConfusionPair, TermProgress, User};
use crate::store::Store;
use crate::Loader;

pub type UserLoader = Loader<Uuid, Option<User>, UserBatcher>;
pub type TermLoader = Loader<Uuid, Option<Term>, TermBatcher>;
pub type StudysetTermsLoader = Loader<Uuid, Vec<Term>, StudysetTermsBatcher>;
pub type TermCountLoader = Loader<Uuid, i64, TermCountBatcher>;
pub type TermProgressLoader = Loader<Uuid, Option<TermProgress>, TermProgressBatcher>;
pub type ConfusionPairLoader = Loader<Uuid, Vec<TermConfusionPair>, ConfusionPairBatcher>;
pub type PracticeTestLoader = Loader<Uuid, Vec<PracticeTest>, PracticeTestBatcher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderKind {
    Users,
    Terms,
    StudysetTerms,
    StudysetTermCounts,
    TermProgress,
    TermConfusionPairs,
    PracticeTests,
}

impl LoaderKind {
    pub const ALL: [LoaderKind; 7] = [
        LoaderKind::Users,
        LoaderKind::Terms,
        LoaderKind::StudysetTerms,
        LoaderKind::StudysetTermCounts,
        LoaderKind::TermProgress,
        LoaderKind::TermConfusionPairs,
        LoaderKind::PracticeTests,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LoaderKind::Users => "users",
            LoaderKind::Terms => "terms",
            LoaderKind::StudysetTerms => "studyset_terms",
            LoaderKind::StudysetTermCounts => "studyset_term_counts",
            LoaderKind::TermProgress => "term_progress",
            LoaderKind::TermConfusionPairs => "term_confusion_pairs",
            LoaderKind::PracticeTests => "practice_tests",
        }
    }
}

/// The loaders of one request.
///
/// Every accessor builds its loader on first use and hands out the same
/// instance afterwards. Loaders scoped to the requesting user are wired to
/// the principal the registry was created with.
pub struct Loaders {
    store: Arc<dyn Store>,
    config: LoaderConfig,
    cancel: CancelSignal,
    user_id: Option<Uuid>,
    users: OnceLock<UserLoader>,
    terms: OnceLock<TermLoader>,
    studyset_terms: OnceLock<StudysetTermsLoader>,
    studyset_term_counts: OnceLock<TermCountLoader>,
    term_progress: OnceLock<TermProgressLoader>,
    term_confusion_pairs: OnceLock<ConfusionPairLoader>,
    practice_tests: OnceLock<PracticeTestLoader>,
}

impl Loaders {
    pub(crate) fn new(
        store: Arc<dyn Store>,
        config: LoaderConfig,
        cancel: CancelSignal,
        user_id: Option<Uuid>,
    ) -> Self {
        Loaders {
            store,
            config,
            cancel,
            user_id,
            users: OnceLock::new(),
            terms: OnceLock::new(),
            studyset_terms: OnceLock::new(),
            studyset_term_counts: OnceLock::new(),
            term_progress: OnceLock::new(),
            term_confusion_pairs: OnceLock::new(),
            practice_tests: OnceLock::new(),
        }
    }

    pub fn users(&self) -> &UserLoader {
        self.users.get_or_init(|| {
            self.build(LoaderKind::Users, UserBatcher::new(self.store.clone()))
        })
    }

    pub fn terms(&self) -> &TermLoader {
        self.terms.get_or_init(|| {
            self.build(LoaderKind::Terms, TermBatcher::new(self.store.clone()))
        })
    }

    pub fn studyset_terms(&self) -> &StudysetTermsLoader {
        self.studyset_terms.get_or_init(|| {
            self.build(
                LoaderKind::StudysetTerms,
                StudysetTermsBatcher::new(self.store.clone()),
            )
        })
    }

    pub fn studyset_term_counts(&self) -> &TermCountLoader {
        self.studyset_term_counts.get_or_init(|| {
            self.build(
                LoaderKind::StudysetTermCounts,
                TermCountBatcher::new(self.store.clone()),
            )
        })
    }

    pub fn term_progress(&self) -> &TermProgressLoader {
        self.term_progress.get_or_init(|| {
            self.build(
                LoaderKind::TermProgress,
                TermProgressBatcher::new(self.store.clone(), self.user_id),
            )
        })
    }

    pub fn term_confusion_pairs(&self) -> &ConfusionPairLoader {
        self.term_confusion_pairs.get_or_init(|| {
            self.build(
                LoaderKind::TermConfusionPairs,
                ConfusionPairBatcher::new(self.store.clone(), self.user_id),
            )
        })
    }

    pub fn practice_tests(&self) -> &PracticeTestLoader {
        self.practice_tests.get_or_init(|| {
            self.build(
                LoaderKind::PracticeTests,
                PracticeTestBatcher::new(self.store.clone(), self.user_id),
            )
        })
    }

    /// Kinds whose loader has been built so far.
    pub fn initialized(&self) -> Vec<LoaderKind> {
        LoaderKind::ALL
            .into_iter()
            .filter(|kind| self.is_initialized(*kind))
            .collect()
    }

    pub fn is_initialized(&self, kind: LoaderKind) -> bool {
        match kind {
            LoaderKind::Users => self.users.get().is_some(),
            LoaderKind::Terms => self.terms.get().is_some(),
            LoaderKind::StudysetTerms => self.studyset_terms.get().is_some(),
            LoaderKind::StudysetTermCounts => self.studyset_term_counts.get().is_some(),
            LoaderKind::TermProgress => self.term_progress.get().is_some(),
            LoaderKind::TermConfusionPairs => self.term_confusion_pairs.get().is_some(),
            LoaderKind::PracticeTests => self.practice_tests.get().is_some(),
        }
    }

    fn build<K, V, F>(&self, kind: LoaderKind, batcher: F) -> Loader<K, V, F>
    where
        K: Eq + std::hash::Hash + Clone + fmt::Debug,
        V: Clone,
        F: crate::BatchFn<K, V>,
        F::Error: Clone + fmt::Debug,
    {
        debug!(loader = kind.name(), "building loader");
        Loader::with_config(batcher, self.config.clone())
            .with_cancel(self.cancel.clone())
            .with_name(kind.name())
    }
}

impl fmt::Debug for Loaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loaders")
            .field("user_id", &self.user_id)
            .field("initialized", &self.initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::store::MemoryStore;

    #[test]
    fn loaders_are_built_on_first_access_only() {
        let (_handle, cancel) = cancel_pair();
        let loaders = Loaders::new(
            MemoryStore::new_shared(),
            LoaderConfig::default(),
            cancel,
            None,
        );
        assert!(loaders.initialized().is_empty());

        let first: *const UserLoader = loaders.users();
        let second: *const UserLoader = loaders.users();
        assert_eq!(first, second);
        loaders.practice_tests();

        assert_eq!(
            vec![LoaderKind::Users, LoaderKind::PracticeTests],
            loaders.initialized()
        );
    }
}
