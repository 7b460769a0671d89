use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Item {
    pub async fn create(
        pool: &PgPool,
        req: CreateItemRequest,
        owner_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (title, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(owner_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        skip: i64,
        limit: i64,
        title: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match title {
            Some(title) => {
                sqlx::query_as::<_, Item>(
                    r#"
                    SELECT * FROM items
                    WHERE title ILIKE $1
                    ORDER BY id OFFSET $2 LIMIT $3
                    "#,
                )
                .bind(format!("%{}%", title))
                .bind(skip)
                .bind(limit)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY id OFFSET $1 LIMIT $2")
                    .bind(skip)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// 只更新请求中出现的字段
    pub async fn update(
        pool: &PgPool,
        id: i64,
        req: &UpdateItemRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
