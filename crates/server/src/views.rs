use askama::Template;
use axum::response::Html;

use crate::{
    error::AppError,
    models::{Choice, Question},
};

pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}

pub struct QuestionRow {
    pub id: i64,
    pub question_text: String,
    pub recent: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub questions: Vec<QuestionRow>,
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct DetailTemplate<'a> {
    pub question: &'a Question,
    pub choices: &'a [Choice],
    pub error_message: Option<&'a str>,
    /// Text echoed back into the add-choice form.
    pub choice_text: &'a str,
    pub choice_errors: &'a [String],
}

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate<'a> {
    pub question: &'a Question,
    pub choices: &'a [Choice],
}

#[derive(Template)]
#[template(path = "question_form.html")]
pub struct QuestionFormTemplate<'a> {
    pub heading: &'a str,
    pub action: String,
    pub cancel_url: String,
    pub question_text: &'a str,
    pub errors: &'a [String],
}

#[derive(Template)]
#[template(path = "question_confirm_delete.html")]
pub struct ConfirmDeleteTemplate<'a> {
    pub question: &'a Question,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate;

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn detail_escapes_user_text() {
        let question = Question {
            id: 3,
            question_text: "<script>alert(1)</script>".into(),
            pub_date: Utc::now(),
        };
        let html = DetailTemplate {
            question: &question,
            choices: &[],
            error_message: None,
            choice_text: "",
            choice_errors: &[],
        }
        .render()
        .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn results_pluralizes_votes() {
        let question = Question {
            id: 1,
            question_text: "Favorite color?".into(),
            pub_date: Utc::now(),
        };
        let choices = [
            Choice {
                id: 1,
                question_id: 1,
                choice_text: "Red".into(),
                votes: 1,
            },
            Choice {
                id: 2,
                question_id: 1,
                choice_text: "Blue".into(),
                votes: 2,
            },
        ];
        let html = ResultsTemplate {
            question: &question,
            choices: &choices,
        }
        .render()
        .unwrap();
        assert!(html.contains("Red -- 1 vote</li>"));
        assert!(html.contains("Blue -- 2 votes</li>"));
    }
}
