use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::PollStore;
use crate::models::{Choice, NewQuestion, Question};

#[derive(Default)]
struct Inner {
    questions: BTreeMap<i64, Question>,
    choices: BTreeMap<i64, Choice>,
    next_question_id: i64,
    next_choice_id: i64,
}

/// Keeps everything in process. Every mutation takes the single write lock,
/// which is what makes `increment_votes` atomic here.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Ok(read) => write!(
                f,
                "MemoryStore(questions: {}, choices: {})",
                read.questions.len(),
                read.choices.len()
            ),
            Err(_) => write!(f, "MemoryStore: <locked>"),
        }
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn latest_published(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Question>> {
        let read = self.inner.read().await;
        let mut questions: Vec<Question> = read
            .questions
            .values()
            .filter(|q| q.is_published(now))
            .cloned()
            .collect();
        questions.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        questions.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(questions)
    }

    async fn published_question(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Question>> {
        let read = self.inner.read().await;
        Ok(read
            .questions
            .get(&id)
            .filter(|q| q.is_published(now))
            .cloned())
    }

    async fn question(&self, id: i64) -> anyhow::Result<Option<Question>> {
        Ok(self.inner.read().await.questions.get(&id).cloned())
    }

    async fn question_by_text(&self, text: &str) -> anyhow::Result<Option<Question>> {
        let read = self.inner.read().await;
        Ok(read
            .questions
            .values()
            .find(|q| q.question_text == text)
            .cloned())
    }

    async fn create_question(&self, question: NewQuestion) -> anyhow::Result<Question> {
        let mut write = self.inner.write().await;
        write.next_question_id += 1;
        let question = Question {
            id: write.next_question_id,
            question_text: question.question_text,
            pub_date: question.pub_date,
        };
        write.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn create_poll(
        &self,
        question: NewQuestion,
        choices: &[String],
    ) -> anyhow::Result<(Question, Vec<Choice>)> {
        let mut write = self.inner.write().await;
        write.next_question_id += 1;
        let question = Question {
            id: write.next_question_id,
            question_text: question.question_text,
            pub_date: question.pub_date,
        };

        let mut created = Vec::with_capacity(choices.len());
        for text in choices {
            write.next_choice_id += 1;
            created.push(Choice {
                id: write.next_choice_id,
                question_id: question.id,
                choice_text: text.clone(),
                votes: 0,
            });
        }

        write.questions.insert(question.id, question.clone());
        for choice in &created {
            write.choices.insert(choice.id, choice.clone());
        }
        Ok((question, created))
    }

    async fn update_question_text(&self, id: i64, text: &str) -> anyhow::Result<Option<Question>> {
        let mut write = self.inner.write().await;
        Ok(write.questions.get_mut(&id).map(|q| {
            q.question_text = text.to_string();
            q.clone()
        }))
    }

    async fn delete_question(&self, id: i64) -> anyhow::Result<bool> {
        let mut write = self.inner.write().await;
        if write.questions.remove(&id).is_none() {
            return Ok(false);
        }
        write.choices.retain(|_, c| c.question_id != id);
        Ok(true)
    }

    async fn choices(&self, question_id: i64) -> anyhow::Result<Vec<Choice>> {
        let read = self.inner.read().await;
        Ok(read
            .choices
            .values()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn choice_for_question(
        &self,
        question_id: i64,
        choice_id: i64,
    ) -> anyhow::Result<Option<Choice>> {
        let read = self.inner.read().await;
        Ok(read
            .choices
            .get(&choice_id)
            .filter(|c| c.question_id == question_id)
            .cloned())
    }

    async fn create_choice(&self, question_id: i64, text: &str) -> anyhow::Result<Choice> {
        let mut write = self.inner.write().await;
        if !write.questions.contains_key(&question_id) {
            anyhow::bail!("question {question_id} does not exist");
        }
        write.next_choice_id += 1;
        let choice = Choice {
            id: write.next_choice_id,
            question_id,
            choice_text: text.to_string(),
            votes: 0,
        };
        write.choices.insert(choice.id, choice.clone());
        Ok(choice)
    }

    async fn increment_votes(&self, choice_id: i64) -> anyhow::Result<()> {
        let mut write = self.inner.write().await;
        if let Some(choice) = write.choices.get_mut(&choice_id) {
            choice.votes += 1;
        }
        Ok(())
    }
}
