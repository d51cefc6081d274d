use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::{
    AppState,
    error::AppError,
    extract::QuestionId,
    models::{ChoiceForm, NewQuestion, Question, QuestionForm, VoteForm, clean_text},
    notify::notify_created,
    views::{
        ConfirmDeleteTemplate, DetailTemplate, IndexTemplate, QuestionFormTemplate, QuestionRow,
        ResultsTemplate, render,
    },
};

/// How many questions the list page shows.
pub const LATEST_LIMIT: i64 = 5;

pub const NO_CHOICE_MESSAGE: &str = "You didn't select a choice.";

fn detail_url(id: i64) -> String {
    format!("/polls/{id}")
}

fn results_url(id: i64) -> String {
    format!("/polls/{id}/results")
}

// ===== Reads =====

pub async fn root() -> Redirect {
    Redirect::to("/polls")
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(_) => Json(serde_json::json!({
            "status": "ok",
            "database": "connected"
        })),
        Err(_) => Json(serde_json::json!({
            "status": "error",
            "database": "disconnected"
        })),
    }
}

pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let now = Utc::now();
    let questions = state
        .store
        .latest_published(now, LATEST_LIMIT)
        .await?
        .into_iter()
        .map(|q| QuestionRow {
            recent: q.was_published_recently(now),
            id: q.id,
            question_text: q.question_text,
        })
        .collect();

    Ok(render(&IndexTemplate { questions })?.into_response())
}

async fn published_or_404(state: &AppState, id: i64) -> Result<Question, AppError> {
    state
        .store
        .published_question(id, Utc::now())
        .await?
        .ok_or(AppError::NotFound)
}

async fn existing_or_404(state: &AppState, id: i64) -> Result<Question, AppError> {
    state.store.question(id).await?.ok_or(AppError::NotFound)
}

async fn render_detail(
    state: &AppState,
    question: &Question,
    error_message: Option<&str>,
    choice_text: &str,
    choice_errors: &[String],
) -> Result<Response, AppError> {
    let choices = state.store.choices(question.id).await?;
    let page = render(&DetailTemplate {
        question,
        choices: &choices,
        error_message,
        choice_text,
        choice_errors,
    })?;
    Ok(page.into_response())
}

pub async fn detail(
    State(state): State<AppState>,
    QuestionId(id): QuestionId,
) -> Result<Response, AppError> {
    let question = published_or_404(&state, id).await?;
    render_detail(&state, &question, None, "", &[]).await
}

pub async fn results(
    State(state): State<AppState>,
    QuestionId(id): QuestionId,
) -> Result<Response, AppError> {
    let question = published_or_404(&state, id).await?;
    let choices = state.store.choices(question.id).await?;
    Ok(render(&ResultsTemplate {
        question: &question,
        choices: &choices,
    })?
    .into_response())
}

// ===== Writes =====

pub async fn add_choice(
    State(state): State<AppState>,
    QuestionId(id): QuestionId,
    Form(form): Form<ChoiceForm>,
) -> Result<Response, AppError> {
    let question = published_or_404(&state, id).await?;

    match clean_text(&form.choice_text) {
        Ok(text) => {
            let choice = state.store.create_choice(question.id, &text).await?;
            tracing::debug!(question = question.id, choice = choice.id, "choice added");
            Ok(Redirect::to(&detail_url(question.id)).into_response())
        }
        Err(errors) => render_detail(&state, &question, None, &form.choice_text, &errors).await,
    }
}

/// Voting looks the question up without the publish filter, so a question
/// that is hidden from the read paths still accepts votes.
pub async fn vote(
    State(state): State<AppState>,
    QuestionId(id): QuestionId,
    form: Result<Form<VoteForm>, FormRejection>,
) -> Result<Response, AppError> {
    let question = existing_or_404(&state, id).await?;

    // An unreadable submission carries no usable choice either.
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(question = question.id, "vote form rejected: {rejection}");
            VoteForm::default()
        }
    };

    let selected = match form.choice_id() {
        Some(choice_id) => {
            state
                .store
                .choice_for_question(question.id, choice_id)
                .await?
        }
        None => None,
    };

    let Some(choice) = selected else {
        return render_detail(&state, &question, Some(NO_CHOICE_MESSAGE), "", &[]).await;
    };

    state.store.increment_votes(choice.id).await?;
    tracing::debug!(question = question.id, choice = choice.id, "vote recorded");

    // Redirect so a refresh or back navigation cannot resubmit the vote.
    Ok(Redirect::to(&results_url(question.id)).into_response())
}

// ===== Question CRUD =====

fn question_form(
    heading: &str,
    action: String,
    cancel_url: String,
    question_text: &str,
    errors: &[String],
) -> Result<Response, AppError> {
    Ok(render(&QuestionFormTemplate {
        heading,
        action,
        cancel_url,
        question_text,
        errors,
    })?
    .into_response())
}

pub async fn new_question() -> Result<Response, AppError> {
    question_form("Add Question", "/polls/new".into(), "/polls".into(), "", &[])
}

pub async fn create_question(
    State(state): State<AppState>,
    Form(form): Form<QuestionForm>,
) -> Result<Response, AppError> {
    let text = match clean_text(&form.question_text) {
        Ok(text) => text,
        Err(errors) => {
            return question_form(
                "Add Question",
                "/polls/new".into(),
                "/polls".into(),
                &form.question_text,
                &errors,
            );
        }
    };

    let question = state
        .store
        .create_question(NewQuestion {
            question_text: text,
            pub_date: Utc::now(),
        })
        .await?;
    notify_created(state.notifier.as_ref(), &question);

    Ok(Redirect::to(&detail_url(question.id)).into_response())
}

pub async fn edit_question(
    State(state): State<AppState>,
    QuestionId(id): QuestionId,
) -> Result<Response, AppError> {
    let question = existing_or_404(&state, id).await?;
    question_form(
        "Edit Question",
        format!("/polls/{id}/edit"),
        detail_url(id),
        &question.question_text,
        &[],
    )
}

pub async fn update_question(
    State(state): State<AppState>,
    QuestionId(id): QuestionId,
    Form(form): Form<QuestionForm>,
) -> Result<Response, AppError> {
    let question = existing_or_404(&state, id).await?;

    let text = match clean_text(&form.question_text) {
        Ok(text) => text,
        Err(errors) => {
            return question_form(
                "Edit Question",
                format!("/polls/{id}/edit"),
                detail_url(id),
                &form.question_text,
                &errors,
            );
        }
    };

    let question = state
        .store
        .update_question_text(question.id, &text)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Redirect::to(&detail_url(question.id)).into_response())
}

pub async fn confirm_delete(
    State(state): State<AppState>,
    QuestionId(id): QuestionId,
) -> Result<Response, AppError> {
    let question = existing_or_404(&state, id).await?;
    Ok(render(&ConfirmDeleteTemplate {
        question: &question,
    })?
    .into_response())
}

pub async fn delete_question(
    State(state): State<AppState>,
    QuestionId(id): QuestionId,
) -> Result<Response, AppError> {
    if !state.store.delete_question(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(id, "question deleted");
    Ok(Redirect::to("/polls").into_response())
}
