use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use crate::db::QUESTIONS_PER_PAGE;

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

/// A validated question that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

pub async fn get_question_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await
}

/// One page of questions ordered by id. Pages are 1-based; anything below 1 is empty.
pub async fn get_questions_page(pool: &SqlitePool, page: i64) -> sqlx::Result<Vec<Question>> {
    if page < 1 {
        return Ok(vec![]);
    }
    let offset = (page - 1).saturating_mul(QUESTIONS_PER_PAGE);
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        ORDER BY id
        LIMIT ?1 OFFSET ?2
        "#,
    )
    .bind(QUESTIONS_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE questions.category = ?1
        ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

// LIKE wildcards in the user's term must match literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Questions whose text contains `term`. Case-insensitive for ASCII, as SQLite's LIKE is.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> sqlx::Result<Vec<Question>> {
    let pattern = format!("%{}%", escape_like(term));
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE questions.question LIKE ?1 ESCAPE '\'
        ORDER BY id
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
}

/// Quiz candidates: questions of `category` (or of every category when `None`)
/// whose id is not in `exclude`.
pub async fn get_quiz_candidates(
    pool: &SqlitePool,
    category: Option<i64>,
    exclude: &[i64],
) -> sqlx::Result<Vec<Question>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, question, answer, category, difficulty FROM questions WHERE 1 = 1",
    );
    if let Some(category) = category {
        builder.push(" AND category = ").push_bind(category);
    }
    if !exclude.is_empty() {
        builder.push(" AND id NOT IN (");
        let mut ids = builder.separated(", ");
        for id in exclude {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    builder.push(" ORDER BY id");
    builder
        .build_query_as::<Question>()
        .fetch_all(pool)
        .await
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> sqlx::Result<i64> {
    let mut conn = pool.acquire().await?;

    let id = sqlx::query(
        r#"
        INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Deletes a question, returning whether a row was removed.
pub async fn delete_question<'e, E>(executor: E, id: i64) -> sqlx::Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn insert_question_with_id<'e, E>(executor: E, question: &Question) -> sqlx::Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO questions (id, question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(question.id)
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .execute(executor)
    .await?;
    Ok(())
}

async fn update_question<'e, E>(executor: E, question: &Question) -> sqlx::Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE questions SET question = ?1, answer = ?2, category = ?3, difficulty = ?4
        WHERE questions.id = ?5
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .bind(question.id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Makes the question table match `questions`, keyed by id.
/// Runs in one transaction: any failing row leaves the table as it was.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    let existing_ids: HashSet<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM questions")
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();
    let new_ids: HashSet<i64> = questions.iter().map(|q| q.id).collect();
    for id in existing_ids.difference(&new_ids) {
        delete_question(&mut *tx, *id).await?;
    }
    for question in questions {
        if existing_ids.contains(&question.id) {
            update_question(&mut *tx, &question).await?;
        } else {
            insert_question_with_id(&mut *tx, &question).await?;
        }
    }
    tx.commit().await
}
