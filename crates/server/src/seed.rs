use chrono::{DateTime, Utc};

use crate::{
    models::{NewQuestion, clean_text},
    notify::{QuestionNotifier, notify_created},
    store::PollStore,
};

#[derive(Debug, PartialEq)]
pub struct SeedPoll {
    pub question_text: String,
    pub choices: Vec<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct SeedReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Parses one `question | choice | choice ...` line. Blank lines, comments
/// and lines whose text fails validation yield `None`.
pub fn parse_line(line: &str) -> Option<SeedPoll> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut parts = line.split('|');
    let question_text = clean_text(parts.next()?).ok()?;
    let choices = parts.filter_map(|c| clean_text(c).ok()).collect();
    Some(SeedPoll {
        question_text,
        choices,
    })
}

/// Loads every poll in `content`, skipping questions whose text is already
/// stored. New questions are published at `now`.
pub async fn load_polls(
    store: &dyn PollStore,
    notifier: &dyn QuestionNotifier,
    content: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    for poll in content.lines().filter_map(parse_line) {
        if store.question_by_text(&poll.question_text).await?.is_some() {
            println!("⊘ Skipped (duplicate): {}", poll.question_text);
            report.skipped += 1;
            continue;
        }

        let (question, _) = store
            .create_poll(
                NewQuestion {
                    question_text: poll.question_text,
                    pub_date: now,
                },
                &poll.choices,
            )
            .await?;
        notify_created(notifier, &question);

        report.loaded += 1;
        println!("✓ Loaded: {}", question.question_text);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{models::Question, store::MemoryStore};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl QuestionNotifier for Recorder {
        fn question_created(&self, question: &Question) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(question.question_text.clone());
            Ok(())
        }
    }

    #[test]
    fn parse_line_splits_choices() {
        assert_eq!(
            parse_line(" Favorite color? | Red |  | Blue "),
            Some(SeedPoll {
                question_text: "Favorite color?".into(),
                choices: vec!["Red".into(), "Blue".into()],
            })
        );
        assert_eq!(parse_line("# comment"), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line(" | orphan choice"), None);
    }

    #[tokio::test]
    async fn load_polls_skips_duplicates() {
        let store = MemoryStore::new();
        let recorder = Recorder::default();
        let content = "# seed\nFavorite color? | Red | Blue\n\nBest pet? | Cat\nFavorite color? | Green\n";

        let report = load_polls(&store, &recorder, content, Utc::now()).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                loaded: 2,
                skipped: 1
            }
        );
        assert_eq!(*recorder.0.lock().unwrap(), ["Favorite color?", "Best pet?"]);

        let color = store.question_by_text("Favorite color?").await.unwrap().unwrap();
        let choices: Vec<_> = store
            .choices(color.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.choice_text)
            .collect();
        assert_eq!(choices, ["Red", "Blue"]);

        let again = load_polls(&store, &recorder, content, Utc::now()).await.unwrap();
        assert_eq!(
            again,
            SeedReport {
                loaded: 0,
                skipped: 3
            }
        );
    }
}
