//! Handlers for community questions.
//!
//! Anyone may ask (an authenticated user or an anonymous device). Staff with
//! `can_view_questions` list them; staff with `can_answer_questions` answer,
//! which notifies only the author.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use masjid_core::capabilities::Capability;
use masjid_core::error::CoreError;
use masjid_core::permissions::PermissionCheck;
use masjid_core::types::DbId;
use masjid_core::validation::{validate_message, MAX_BODY_LEN};
use masjid_db::models::question::{CreateQuestion, Question};
use masjid_db::repositories::QuestionRepo;
use masjid_events::DomainEvent;
use serde::Deserialize;

use crate::authz::{authorize, find_active_masjid, load_actor};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::middleware::device::{resolve_recipient, DeviceHeaders};
use crate::query::PaginationParams;
use crate::response::{created, DataResponse};
use crate::state::AppState;

/// Request body for `POST /masjids/{id}/questions`.
#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Request body for `POST /questions/{id}/answer`.
#[derive(Debug, Deserialize)]
pub struct AnswerQuestionRequest {
    pub answer: String,
}

/// POST /api/v1/masjids/{id}/questions
pub async fn create_question(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    device: DeviceHeaders,
    Path(masjid_id): Path<DbId>,
    Json(input): Json<CreateQuestionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Question>>)> {
    validate_message(&input.title, &input.body)?;
    find_active_masjid(&state.pool, masjid_id).await?;
    if let Some(auth) = auth {
        load_actor(&state.pool, auth).await?;
    }
    let author = resolve_recipient(auth, &device, None)?;

    let dto = CreateQuestion {
        title: input.title.trim().to_string(),
        body: input.body,
    };
    let question = QuestionRepo::create(&state.pool, masjid_id, &author, &dto).await?;

    state.event_bus.publish(DomainEvent::QuestionCreated {
        masjid_id,
        question_id: question.id,
        title: question.title.clone(),
    });

    Ok(created(question))
}

/// GET /api/v1/masjids/{id}/questions
pub async fn list_questions(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    Path(masjid_id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Question>>>> {
    authorize(
        &state.pool,
        auth,
        masjid_id,
        PermissionCheck::Capability(Capability::ViewQuestions),
    )
    .await?;
    let questions =
        QuestionRepo::list_for_masjid(&state.pool, masjid_id, page.limit(), page.offset()).await?;
    Ok(Json(DataResponse { data: questions }))
}

/// POST /api/v1/questions/{id}/answer
pub async fn answer_question(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(question_id): Path<DbId>,
    Json(input): Json<AnswerQuestionRequest>,
) -> AppResult<Json<DataResponse<Question>>> {
    let answer = input.answer.trim();
    if answer.is_empty() || answer.chars().count() > MAX_BODY_LEN {
        return Err(CoreError::Validation(format!(
            "Answer must be between 1 and {MAX_BODY_LEN} characters"
        ))
        .into());
    }
    let question = find_question(&state, question_id).await?;
    let user = authorize(
        &state.pool,
        Some(auth),
        question.masjid_id,
        PermissionCheck::Capability(Capability::AnswerQuestions),
    )
    .await?;

    let answered = QuestionRepo::answer(&state.pool, question_id, answer, user.id)
        .await?
        .ok_or_else(|| question_not_found(question_id))?;

    state.event_bus.publish(DomainEvent::QuestionAnswered {
        masjid_id: answered.masjid_id,
        question_id: answered.id,
        title: answered.title.clone(),
        author: answered.author(),
    });

    Ok(Json(DataResponse { data: answered }))
}

async fn find_question(state: &AppState, id: DbId) -> AppResult<Question> {
    QuestionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| question_not_found(id))
}

fn question_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Question",
        id,
    })
}
