#![allow(dead_code)]

use std::sync::Arc;

use fake::faker::internet::en::Username;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::Name;
use fake::{Dummy, Fake, Faker};
use rand::seq::SliceRandom;
use studyloader::model::{
    AnswerWith, AuthedUser, PracticeTest, Term, TermConfusionPair, TermProgress, User,
};
use studyloader::{LoaderLayer, MemoryStore};
use uuid::Uuid;

pub const TERMS_PER_STUDYSET: usize = 5;

#[derive(Debug, Dummy)]
pub struct Card {
    #[dummy(faker = "Word()")]
    pub term: String,
    #[dummy(faker = "Sentence(3..6)")]
    pub def: String,
}

/// Two users, a studyset with terms and one without, plus per-user rows
/// for the scoped loaders.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub alice: AuthedUser,
    pub bob: AuthedUser,
    pub studyset: Uuid,
    pub other_studyset: Uuid,
    pub empty_studyset: Uuid,
    /// Terms of `studyset`, in sort order.
    pub terms: Vec<Term>,
}

impl Fixture {
    pub fn new() -> Fixture {
        let store = MemoryStore::new_shared();
        let alice = principal();
        let bob = principal();
        store.insert_user(user(&alice));
        store.insert_user(user(&bob));

        let studyset = Uuid::new_v4();
        let other_studyset = Uuid::new_v4();
        let empty_studyset = Uuid::new_v4();

        let terms: Vec<Term> = (0..TERMS_PER_STUDYSET as i32)
            .map(|sort_order| term(studyset, sort_order))
            .collect();
        let mut shuffled = terms.clone();
        shuffled.shuffle(&mut rand::thread_rng());
        for term in shuffled {
            store.insert_term(term);
        }
        store.insert_term(term(other_studyset, 0));
        store.insert_term(term(other_studyset, 1));

        store.insert_progress(progress(terms[0].id, alice.id, 3));
        store.insert_progress(progress(terms[1].id, alice.id, 1));
        store.insert_progress(progress(terms[0].id, bob.id, 7));

        store.insert_confusion_pair(confusion(&terms[0], &terms[1], alice.id, 1));
        store.insert_confusion_pair(confusion(&terms[0], &terms[2], alice.id, 4));
        store.insert_confusion_pair(confusion(&terms[0], &terms[3], bob.id, 9));

        store.insert_practice_test(practice_test(studyset, alice.id, "2025-03-01T10:00:00.000+00:00"));
        store.insert_practice_test(practice_test(studyset, alice.id, "2025-03-02T10:00:00.000+00:00"));
        store.insert_practice_test(practice_test(studyset, bob.id, "2025-03-03T10:00:00.000+00:00"));

        Fixture {
            store,
            alice,
            bob,
            studyset,
            other_studyset,
            empty_studyset,
            terms,
        }
    }

    pub fn layer(&self) -> LoaderLayer {
        LoaderLayer::new(self.store.clone())
    }
}

pub fn principal() -> AuthedUser {
    AuthedUser {
        id: Uuid::new_v4(),
        username: Username().fake(),
        display_name: Name().fake(),
    }
}

pub fn user(principal: &AuthedUser) -> User {
    User {
        id: principal.id,
        username: principal.username.clone(),
        display_name: principal.display_name.clone(),
    }
}

pub fn term(studyset_id: Uuid, sort_order: i32) -> Term {
    let card: Card = Faker.fake();
    Term {
        id: Uuid::new_v4(),
        studyset_id,
        term: card.term,
        def: card.def,
        sort_order,
        created_at: "2025-01-01T00:00:00.000+00:00".to_string(),
        updated_at: "2025-01-01T00:00:00.000+00:00".to_string(),
    }
}

pub fn progress(term_id: Uuid, user_id: Uuid, term_review_count: i32) -> TermProgress {
    TermProgress {
        id: Uuid::new_v4(),
        term_id,
        user_id,
        term_first_reviewed_at: Some("2025-02-01T00:00:00.000+00:00".to_string()),
        term_last_reviewed_at: Some("2025-02-02T00:00:00.000+00:00".to_string()),
        term_review_count,
        def_first_reviewed_at: None,
        def_last_reviewed_at: None,
        def_review_count: 0,
        term_leitner_system_box: (1..6).fake(),
        def_leitner_system_box: 1,
        term_correct_count: (0..20).fake(),
        term_incorrect_count: (0..20).fake(),
        def_correct_count: 0,
        def_incorrect_count: 0,
    }
}

pub fn confusion(
    term: &Term,
    confused_with: &Term,
    user_id: Uuid,
    confused_count: i32,
) -> TermConfusionPair {
    TermConfusionPair {
        id: Uuid::new_v4(),
        term_id: term.id,
        user_id,
        confused_term_id: confused_with.id,
        answered_with: AnswerWith::Def,
        confused_count,
        last_confused_at: "2025-02-03T00:00:00.000+00:00".to_string(),
    }
}

pub fn practice_test(studyset_id: Uuid, user_id: Uuid, timestamp: &str) -> PracticeTest {
    let questions_total = 10;
    PracticeTest {
        id: Uuid::new_v4(),
        studyset_id,
        user_id,
        timestamp: timestamp.to_string(),
        questions_correct: (0..=questions_total).fake(),
        questions_total,
    }
}
