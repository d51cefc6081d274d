use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TEXT_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

impl Question {
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }

    /// Published within the last day. Questions scheduled in the future are
    /// never recent.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    pub votes: i32,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

// ===== Forms =====

#[derive(Debug, Default, Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub question_text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChoiceForm {
    #[serde(default)]
    pub choice_text: String,
}

/// `choice` is kept as raw text so a missing or garbled value reaches the
/// handler instead of being rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct VoteForm {
    pub choice: Option<String>,
}

impl VoteForm {
    pub fn choice_id(&self) -> Option<i64> {
        self.choice.as_deref()?.trim().parse().ok()
    }
}

/// Validates a required text field, returning the trimmed value or the
/// messages to show next to the field.
pub fn clean_text(raw: &str) -> Result<String, Vec<String>> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(vec!["This field is required.".to_string()]);
    }
    let len = value.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(vec![format!(
            "Ensure this value has at most {MAX_TEXT_LEN} characters (it has {len})."
        )]);
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_at(pub_date: DateTime<Utc>) -> Question {
        Question {
            id: 1,
            question_text: "Favorite color?".into(),
            pub_date,
        }
    }

    #[test]
    fn future_question_is_not_recent() {
        let now = Utc::now();
        let q = question_at(now + Duration::days(30));
        assert!(!q.was_published_recently(now));
        assert!(!q.is_published(now));
    }

    #[test]
    fn old_question_is_not_recent() {
        let now = Utc::now();
        let q = question_at(now - Duration::days(1) - Duration::seconds(1));
        assert!(!q.was_published_recently(now));
        assert!(q.is_published(now));
    }

    #[test]
    fn recent_question_is_recent() {
        let now = Utc::now();
        let q = question_at(now - Duration::hours(23) - Duration::minutes(59));
        assert!(q.was_published_recently(now));
    }

    #[test]
    fn question_published_exactly_now_is_visible() {
        let now = Utc::now();
        assert!(question_at(now).is_published(now));
    }

    #[test]
    fn clean_text_trims_and_rejects_blank() {
        assert_eq!(clean_text("  Red  ").unwrap(), "Red");
        assert_eq!(clean_text("   ").unwrap_err(), vec!["This field is required."]);
    }

    #[test]
    fn clean_text_enforces_length() {
        assert!(clean_text(&"a".repeat(MAX_TEXT_LEN)).is_ok());
        let errors = clean_text(&"a".repeat(MAX_TEXT_LEN + 1)).unwrap_err();
        assert_eq!(
            errors,
            vec!["Ensure this value has at most 200 characters (it has 201)."]
        );
    }

    #[test]
    fn vote_form_parses_choice() {
        let form = VoteForm {
            choice: Some("7".into()),
        };
        assert_eq!(form.choice_id(), Some(7));
        let form = VoteForm {
            choice: Some("blue".into()),
        };
        assert_eq!(form.choice_id(), None);
        assert_eq!(VoteForm::default().choice_id(), None);
    }
}
