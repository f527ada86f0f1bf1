use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions::get_quiz_candidates, Question},
    server::{app::AppState, deserializers::LooseI64},
    telemetry::QUIZ_QUESTIONS_CNTR,
};

use super::{success, ApiError, ApiResponse};

/// Category id that stands for "questions of every category".
const ANY_CATEGORY: i64 = 0;

#[derive(Deserialize, Debug)]
struct QuizCategory {
    id: LooseI64,
}

#[derive(Serialize, Debug)]
struct NextQuestion {
    question: Option<Question>,
}

/// Reads the two required keys. Their absence is a bad request, a wrong shape is unprocessable.
fn parse_quiz_request(body: &Map<String, Value>) -> Result<(Option<i64>, Vec<i64>), ApiError> {
    let (Some(category), Some(previous)) =
        (body.get("quiz_category"), body.get("previous_questions"))
    else {
        return Err(ApiError::BadRequest);
    };
    let category = QuizCategory::deserialize(category).map_err(|_| ApiError::Unprocessable)?;
    let previous =
        Vec::<LooseI64>::deserialize(previous).map_err(|_| ApiError::Unprocessable)?;
    let category = Some(category.id.0).filter(|id| *id != ANY_CATEGORY);
    Ok((category, previous.into_iter().map(|id| id.0).collect()))
}

async fn next_question(
    State(pool): State<SqlitePool>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResponse<NextQuestion> {
    let Json(body) = payload.map_err(|_| ApiError::BadRequest)?;
    let (category, previous) = parse_quiz_request(&body)?;

    let candidates = get_quiz_candidates(&pool, category, &previous)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to load quiz candidates: {e}");
            ApiError::Unprocessable
        })?;
    let question = candidates.choose(&mut rand::thread_rng()).cloned();

    if let Some(question) = &question {
        QUIZ_QUESTIONS_CNTR
            .with_label_values(&[question.category.to_string().as_str()])
            .inc();
    }
    success(NextQuestion { question })
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_question))
        .with_state(state)
}
