use std::collections::BTreeMap;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_categories_map, questions::get_questions_for_category},
        Question,
    },
    server::app::AppState,
};

use super::{success, ApiError, ApiResponse};

#[derive(Serialize, Debug)]
struct CategoryList {
    categories: BTreeMap<i64, String>,
}

#[derive(Serialize, Debug)]
struct CategoryQuestions {
    questions: Vec<Question>,
    total_questions: usize,
    current_category: i64,
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<CategoryList> {
    let categories = get_categories_map(&pool).await?;
    if categories.is_empty() {
        return Err(ApiError::NotFound);
    }
    success(CategoryList { categories })
}

async fn questions_for_category(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<CategoryQuestions> {
    let Path(id) = id.map_err(|_| ApiError::NotFound)?;
    let questions = get_questions_for_category(&pool, id).await?;
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    success(CategoryQuestions {
        total_questions: questions.len(),
        questions,
        current_category: id,
    })
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/{id}/questions", get(questions_for_category))
        .with_state(state)
}
