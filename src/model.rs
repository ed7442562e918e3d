//! Records served by the loaders.
//!
//! Timestamps are kept as the RFC 3339 text the store renders them in.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
}

/// The authenticated principal of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub id: Uuid,
    pub studyset_id: Uuid,
    pub term: String,
    pub def: String,
    pub sort_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Number of terms in one studyset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermCount {
    pub studyset_id: Uuid,
    pub count: i64,
}

/// A user's review history for one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermProgress {
    pub id: Uuid,
    pub term_id: Uuid,
    pub user_id: Uuid,
    pub term_first_reviewed_at: Option<String>,
    pub term_last_reviewed_at: Option<String>,
    pub term_review_count: i32,
    pub def_first_reviewed_at: Option<String>,
    pub def_last_reviewed_at: Option<String>,
    pub def_review_count: i32,
    pub term_leitner_system_box: i32,
    pub def_leitner_system_box: i32,
    pub term_correct_count: i32,
    pub term_incorrect_count: i32,
    pub def_correct_count: i32,
    pub def_incorrect_count: i32,
}

/// Which side of a term the user answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerWith {
    Term,
    Def,
}

/// A term the user confused with another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermConfusionPair {
    pub id: Uuid,
    pub term_id: Uuid,
    pub user_id: Uuid,
    pub confused_term_id: Uuid,
    pub answered_with: AnswerWith,
    pub confused_count: i32,
    pub last_confused_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeTest {
    pub id: Uuid,
    pub studyset_id: Uuid,
    pub user_id: Uuid,
    pub timestamp: String,
    pub questions_correct: i32,
    pub questions_total: i32,
}
