use crate::models::Question;

/// Observes newly created questions. Called once per creation, after the row
/// is stored; an error here never undoes the creation.
pub trait QuestionNotifier: Send + Sync {
    fn question_created(&self, question: &Question) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl QuestionNotifier for LogNotifier {
    fn question_created(&self, question: &Question) -> anyhow::Result<()> {
        tracing::info!(id = question.id, "New question created: {}", question.question_text);
        Ok(())
    }
}

/// Best-effort delivery: failures are logged and swallowed.
pub fn notify_created(notifier: &dyn QuestionNotifier, question: &Question) {
    if let Err(err) = notifier.question_created(question) {
        tracing::warn!(id = question.id, "question created hook failed: {:?}", err);
    }
}
