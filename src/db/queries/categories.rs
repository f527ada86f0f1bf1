use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

/// Categories every fresh installation starts with.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Science",
    "Art",
    "Geography",
    "History",
    "Entertainment",
    "Sports",
];

pub async fn get_all_categories(pool: &SqlitePool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, "type" FROM categories ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// All categories keyed by id, the shape the API hands out.
pub async fn get_categories_map(pool: &SqlitePool) -> sqlx::Result<BTreeMap<i64, String>> {
    let categories = get_all_categories(pool).await?;
    Ok(categories.into_iter().map(|c| (c.id, c.kind)).collect())
}

pub async fn create_category<'e, E>(executor: E, id: Option<i64>, kind: &str) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query(
        r#"
        INSERT INTO categories (id, "type") VALUES (?1, ?2)
        "#,
    )
    .bind(id)
    .bind(kind)
    .execute(executor)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_category<'e, E>(executor: E, category: &Category) -> sqlx::Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE categories SET "type" = ?1 WHERE categories.id = ?2
        "#,
    )
    .bind(&category.kind)
    .bind(category.id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_category<'e, E>(executor: E, id: i64) -> sqlx::Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        DELETE FROM categories WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Inserts [`DEFAULT_CATEGORIES`] unless some category already exists.
/// Returns how many rows were inserted.
pub async fn seed_default_categories(pool: &SqlitePool) -> sqlx::Result<usize> {
    if !get_all_categories(pool).await?.is_empty() {
        return Ok(0);
    }
    for (n, kind) in DEFAULT_CATEGORIES.iter().enumerate() {
        create_category(pool, Some(n as i64 + 1), kind).await?;
    }
    Ok(DEFAULT_CATEGORIES.len())
}

/// Makes the category table match `categories`: unknown ids are inserted, known ids updated.
/// Categories missing from the import are deleted only when no question still references them.
/// Runs in one transaction: a failed insert or update leaves the table untouched.
pub async fn import_categories(pool: &SqlitePool, categories: Vec<Category>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    let existing_ids: HashSet<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM categories")
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();
    let new_ids: HashSet<i64> = categories.iter().map(|c| c.id).collect();
    for category in categories {
        if existing_ids.contains(&category.id) {
            update_category(&mut *tx, &category).await?;
        } else {
            create_category(&mut *tx, Some(category.id), &category.kind).await?;
        }
    }
    for id in existing_ids.difference(&new_ids) {
        if let Err(e) = delete_category(&mut *tx, *id).await {
            tracing::warn!("Keeping category {id}, still referenced: {e}");
        }
    }
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn seeds_only_empty_table() {
        let pool = test_pool().await;
        assert_eq!(seed_default_categories(&pool).await.unwrap(), 6);
        assert_eq!(seed_default_categories(&pool).await.unwrap(), 0);

        let map = get_categories_map(&pool).await.unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map[&1], "Science");
        assert_eq!(map[&6], "Sports");
    }

    #[tokio::test]
    async fn import_replaces_categories() {
        let pool = test_pool().await;
        seed_default_categories(&pool).await.unwrap();

        import_categories(
            &pool,
            vec![
                Category {
                    id: 1,
                    kind: "Physics".to_owned(),
                },
                Category {
                    id: 9,
                    kind: "Music".to_owned(),
                },
            ],
        )
        .await
        .unwrap();

        let categories = get_all_categories(&pool).await.unwrap();
        assert_eq!(
            categories,
            vec![
                Category {
                    id: 1,
                    kind: "Physics".to_owned()
                },
                Category {
                    id: 9,
                    kind: "Music".to_owned()
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_import_keeps_categories() {
        let pool = test_pool().await;
        seed_default_categories(&pool).await.unwrap();

        let duplicate = Category {
            id: 9,
            kind: "Music".to_owned(),
        };
        let result = import_categories(
            &pool,
            vec![
                Category {
                    id: 1,
                    kind: "Physics".to_owned(),
                },
                duplicate.clone(),
                duplicate,
            ],
        )
        .await;
        assert!(result.is_err());

        let map = get_categories_map(&pool).await.unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map[&1], "Science");
        assert!(!map.contains_key(&9));
    }

    #[test]
    fn serializes_kind_as_type() {
        let value = serde_json::to_value(Category {
            id: 2,
            kind: "Art".to_owned(),
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"id": 2, "type": "Art"}));
    }
}
