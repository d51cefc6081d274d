use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};

use super::PollStore;
use crate::models::{Choice, NewQuestion, Question};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to the database")?;
        Ok(Self::new(db))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("failed to run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl PollStore for PgStore {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn latest_published(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Question>> {
        let questions: Vec<Question> = sqlx::query_as(
            "SELECT id, question_text, pub_date FROM questions
             WHERE pub_date <= $1
             ORDER BY pub_date DESC
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(questions)
    }

    async fn published_question(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Question>> {
        let question: Option<Question> = sqlx::query_as(
            "SELECT id, question_text, pub_date FROM questions
             WHERE id = $1 AND pub_date <= $2",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;
        Ok(question)
    }

    async fn question(&self, id: i64) -> anyhow::Result<Option<Question>> {
        let question: Option<Question> =
            sqlx::query_as("SELECT id, question_text, pub_date FROM questions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(question)
    }

    async fn question_by_text(&self, text: &str) -> anyhow::Result<Option<Question>> {
        let question: Option<Question> = sqlx::query_as(
            "SELECT id, question_text, pub_date FROM questions
             WHERE question_text = $1
             ORDER BY id
             LIMIT 1",
        )
        .bind(text)
        .fetch_optional(&self.db)
        .await?;
        Ok(question)
    }

    async fn create_question(&self, question: NewQuestion) -> anyhow::Result<Question> {
        let question: Question = sqlx::query_as(
            "INSERT INTO questions (question_text, pub_date) VALUES ($1, $2)
             RETURNING id, question_text, pub_date",
        )
        .bind(&question.question_text)
        .bind(question.pub_date)
        .fetch_one(&self.db)
        .await?;
        Ok(question)
    }

    async fn create_poll(
        &self,
        question: NewQuestion,
        choices: &[String],
    ) -> anyhow::Result<(Question, Vec<Choice>)> {
        let mut tx = self.db.begin().await?;

        let question: Question = sqlx::query_as(
            "INSERT INTO questions (question_text, pub_date) VALUES ($1, $2)
             RETURNING id, question_text, pub_date",
        )
        .bind(&question.question_text)
        .bind(question.pub_date)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(choices.len());
        for text in choices {
            let choice: Choice = sqlx::query_as(
                "INSERT INTO choices (question_id, choice_text, votes) VALUES ($1, $2, 0)
                 RETURNING id, question_id, choice_text, votes",
            )
            .bind(question.id)
            .bind(text)
            .fetch_one(&mut *tx)
            .await?;
            created.push(choice);
        }

        // dropping `tx` on an early return rolls the question back
        tx.commit().await?;
        Ok((question, created))
    }

    async fn update_question_text(&self, id: i64, text: &str) -> anyhow::Result<Option<Question>> {
        let question: Option<Question> = sqlx::query_as(
            "UPDATE questions SET question_text = $2 WHERE id = $1
             RETURNING id, question_text, pub_date",
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.db)
        .await?;
        Ok(question)
    }

    async fn delete_question(&self, id: i64) -> anyhow::Result<bool> {
        // choices go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn choices(&self, question_id: i64) -> anyhow::Result<Vec<Choice>> {
        let choices: Vec<Choice> = sqlx::query_as(
            "SELECT id, question_id, choice_text, votes FROM choices
             WHERE question_id = $1
             ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.db)
        .await?;
        Ok(choices)
    }

    async fn choice_for_question(
        &self,
        question_id: i64,
        choice_id: i64,
    ) -> anyhow::Result<Option<Choice>> {
        let choice: Option<Choice> = sqlx::query_as(
            "SELECT id, question_id, choice_text, votes FROM choices
             WHERE id = $1 AND question_id = $2",
        )
        .bind(choice_id)
        .bind(question_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(choice)
    }

    async fn create_choice(&self, question_id: i64, text: &str) -> anyhow::Result<Choice> {
        let choice: Choice = sqlx::query_as(
            "INSERT INTO choices (question_id, choice_text, votes) VALUES ($1, $2, 0)
             RETURNING id, question_id, choice_text, votes",
        )
        .bind(question_id)
        .bind(text)
        .fetch_one(&self.db)
        .await?;
        Ok(choice)
    }

    async fn increment_votes(&self, choice_id: i64) -> anyhow::Result<()> {
        // Relative update so concurrent votes never overwrite each other.
        sqlx::query("UPDATE choices SET votes = votes + 1 WHERE id = $1")
            .bind(choice_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

// These need a reachable Postgres: `DATABASE_URL=... cargo test -- --ignored`
#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    async fn question(store: &PgStore, text: &str, pub_date: DateTime<Utc>) -> Question {
        store
            .create_question(NewQuestion {
                question_text: text.into(),
                pub_date,
            })
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn latest_published_filters_orders_and_limits(pool: PgPool) {
        let store = PgStore::new(pool);
        let now = Utc::now();
        for days in (1..=7).rev() {
            question(&store, &format!("past {days}"), now - Duration::days(days)).await;
        }
        let future = question(&store, "future", now + Duration::days(1)).await;

        let latest = store.latest_published(now, 5).await.unwrap();
        let texts: Vec<_> = latest.iter().map(|q| q.question_text.as_str()).collect();
        assert_eq!(texts, ["past 1", "past 2", "past 3", "past 4", "past 5"]);

        assert!(store.published_question(future.id, now).await.unwrap().is_none());
        assert!(store.question(future.id).await.unwrap().is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn delete_cascades_to_choices(pool: PgPool) {
        let store = PgStore::new(pool.clone());
        let doomed = question(&store, "doomed", Utc::now()).await;
        let kept = question(&store, "kept", Utc::now()).await;
        store.create_choice(doomed.id, "a").await.unwrap();
        store.create_choice(doomed.id, "b").await.unwrap();
        store.create_choice(kept.id, "c").await.unwrap();

        assert!(store.delete_question(doomed.id).await.unwrap());
        assert!(!store.delete_question(doomed.id).await.unwrap());

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM choices WHERE question_id = $1")
                .bind(doomed.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(store.choices(kept.id).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn choice_lookup_is_scoped_to_question(pool: PgPool) {
        let store = PgStore::new(pool);
        let first = question(&store, "first", Utc::now()).await;
        let second = question(&store, "second", Utc::now()).await;
        let choice = store.create_choice(first.id, "yes").await.unwrap();

        let found = store.choice_for_question(first.id, choice.id).await.unwrap();
        assert_eq!(found, Some(choice.clone()));
        assert!(store.choice_for_question(second.id, choice.id).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn concurrent_increments_are_not_lost(pool: PgPool) {
        let store = PgStore::new(pool);
        let q = question(&store, "race", Utc::now()).await;
        let choice = store.create_choice(q.id, "only").await.unwrap();
        let other = store.create_choice(q.id, "other").await.unwrap();
        let choice_id = choice.id;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_votes(choice_id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let choices = store.choices(q.id).await.unwrap();
        let votes: Vec<_> = choices.iter().map(|c| (c.id, c.votes)).collect();
        assert_eq!(votes, [(choice_id, 20), (other.id, 0)]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn create_poll_rolls_back_on_bad_choice(pool: PgPool) {
        let store = PgStore::new(pool);
        let choices = ["fine".to_string(), "x".repeat(201)];

        let result = store
            .create_poll(
                NewQuestion {
                    question_text: "half a poll".into(),
                    pub_date: Utc::now(),
                },
                &choices,
            )
            .await;

        assert!(result.is_err());
        assert!(store.question_by_text("half a poll").await.unwrap().is_none());
    }
}
