mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Choice, NewQuestion, Question};

/// Persistence for questions and their choices.
///
/// Lookups return `Ok(None)` for missing rows; `Err` is reserved for storage
/// failures, which the handlers treat as fatal to the request.
#[async_trait]
pub trait PollStore: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;

    /// Published questions, newest first, at most `limit` of them.
    async fn latest_published(&self, now: DateTime<Utc>, limit: i64)
    -> anyhow::Result<Vec<Question>>;

    /// A question that is absent and one scheduled after `now` look the same.
    async fn published_question(&self, id: i64, now: DateTime<Utc>)
    -> anyhow::Result<Option<Question>>;

    async fn question(&self, id: i64) -> anyhow::Result<Option<Question>>;
    async fn question_by_text(&self, text: &str) -> anyhow::Result<Option<Question>>;
    async fn create_question(&self, question: NewQuestion) -> anyhow::Result<Question>;

    /// Stores a question together with its choices, or nothing at all.
    async fn create_poll(
        &self,
        question: NewQuestion,
        choices: &[String],
    ) -> anyhow::Result<(Question, Vec<Choice>)>;

    /// Leaves `pub_date` untouched.
    async fn update_question_text(&self, id: i64, text: &str) -> anyhow::Result<Option<Question>>;

    /// Removes the question and all of its choices.
    async fn delete_question(&self, id: i64) -> anyhow::Result<bool>;

    async fn choices(&self, question_id: i64) -> anyhow::Result<Vec<Choice>>;
    async fn choice_for_question(&self, question_id: i64, choice_id: i64)
    -> anyhow::Result<Option<Choice>>;
    async fn create_choice(&self, question_id: i64, text: &str) -> anyhow::Result<Choice>;

    /// Adds one vote relative to the stored count.
    async fn increment_votes(&self, choice_id: i64) -> anyhow::Result<()>;
}
