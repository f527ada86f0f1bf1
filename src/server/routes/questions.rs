use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::get_categories_map,
            questions::{self, count_questions, get_questions_page},
        },
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        deserializers::{deserialize_lenient_i64, LooseI64},
    },
    telemetry::{CREATED_QUESTIONS_CNTR, DELETED_QUESTIONS_CNTR},
};

use super::{success, ApiError, ApiResponse};

#[derive(Deserialize, Default, Debug)]
struct ListQuery {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    category: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct QuestionBody {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    category: Option<LooseI64>,
    #[serde(default)]
    difficulty: Option<LooseI64>,
}

impl QuestionBody {
    // every field is required; empty text and zero count as missing
    fn validate(self) -> Result<NewQuestion, ApiError> {
        let text = |value: Option<String>| value.filter(|v| !v.is_empty());
        let number = |value: Option<LooseI64>| value.map(|v| v.0).filter(|v| *v != 0);
        match (
            text(self.question),
            text(self.answer),
            number(self.category),
            number(self.difficulty),
        ) {
            (Some(question), Some(answer), Some(category), Some(difficulty)) => Ok(NewQuestion {
                question,
                answer,
                category,
                difficulty,
            }),
            _ => Err(ApiError::BadRequest),
        }
    }
}

#[derive(Deserialize, Debug)]
struct SearchBody {
    #[serde(rename = "searchTerm", default)]
    search_term: Option<String>,
}

#[derive(Serialize, Debug)]
struct QuestionsPage {
    questions: Vec<Question>,
    categories: BTreeMap<i64, String>,
    total_questions: i64,
    current_category: i64,
}

#[derive(Serialize, Debug)]
struct SearchResults {
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize, Debug)]
struct Deleted {
    deleted: i64,
}

#[derive(Serialize, Debug)]
struct Created {
    created: i64,
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResponse<QuestionsPage> {
    let ListQuery { page, category } = query.map(|Query(q)| q).unwrap_or_default();
    let total_questions = count_questions(&pool).await?;
    let questions = get_questions_page(&pool, page.unwrap_or(1)).await?;
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    success(QuestionsPage {
        questions,
        categories: get_categories_map(&pool).await?,
        total_questions,
        current_category: category.unwrap_or(1),
    })
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<Deleted> {
    let Path(id) = id.map_err(|_| ApiError::NotFound)?;
    // a missing row is reported by the delete itself
    match questions::delete_question(&pool, id).await {
        Ok(false) => Err(ApiError::NotFound),
        Ok(true) => {
            DELETED_QUESTIONS_CNTR.inc();
            tracing::info!("Deleted question {id}");
            success(Deleted { deleted: id })
        }
        Err(e) => {
            tracing::warn!("Failed to delete question {id}: {e}");
            Err(ApiError::Unprocessable)
        }
    }
}

async fn create_question(
    State(pool): State<SqlitePool>,
    payload: Result<Json<QuestionBody>, JsonRejection>,
) -> ApiResponse<Created> {
    let Json(body) = payload.map_err(|e| {
        tracing::debug!("Rejected question body: {e}");
        ApiError::BadRequest
    })?;
    let question = body.validate()?;
    match questions::create_question(&pool, &question).await {
        Ok(id) => {
            CREATED_QUESTIONS_CNTR.inc();
            tracing::info!("Created question {id}");
            success(Created { created: id })
        }
        Err(e) => {
            tracing::warn!("Failed to create question: {e}");
            Err(ApiError::Unprocessable)
        }
    }
}

// every failure, including "nothing found", is reported as unprocessable
async fn search_questions(
    State(pool): State<SqlitePool>,
    payload: Result<Json<SearchBody>, JsonRejection>,
) -> ApiResponse<SearchResults> {
    let term = payload
        .ok()
        .and_then(|Json(body)| body.search_term)
        .ok_or(ApiError::Unprocessable)?;
    let questions = questions::search_questions(&pool, &term)
        .await
        .map_err(|e| {
            tracing::warn!("Search for {term:?} failed: {e}");
            ApiError::Unprocessable
        })?;
    if questions.is_empty() {
        return Err(ApiError::Unprocessable);
    }
    success(SearchResults {
        total_questions: questions.len(),
        questions,
    })
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/search", post(search_questions))
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}
