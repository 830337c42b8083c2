/// Movie reviews (create and read)
use crate::{
    catalog::{MovieRepository, Page, PageRequest},
    db,
    error::{CatalogError, CatalogResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

const REVIEW_COLUMNS: &str = "r.id, r.movie_id, r.user_id, r.title, r.content, r.rating, r.created_at";

/// Review record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

/// Create request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewRequest {
    pub movie_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(range(min = 1, max = 10))]
    pub rating: i64,
}

/// List filters
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewFilter {
    pub movie_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Review manager
#[derive(Clone)]
pub struct ReviewManager {
    db: SqlitePool,
    movies: MovieRepository,
}

impl ReviewManager {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            movies: MovieRepository::new(db.clone()),
            db,
        }
    }

    /// Create a review of a live movie; one per movie and user
    pub async fn create(&self, user_id: i64, request: &ReviewRequest) -> CatalogResult<Review> {
        if !self.movies.exists(request.movie_id).await? {
            return Err(CatalogError::not_found("movie", "id", request.movie_id));
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (movie_id, user_id, title, content, rating, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(request.movie_id)
        .bind(user_id)
        .bind(&request.title)
        .bind(&request.content)
        .bind(request.rating)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                CatalogError::already_exists("review", "movie_id", request.movie_id)
            } else if db::is_foreign_key_violation(&e) {
                CatalogError::not_found("user", "id", user_id)
            } else {
                e.into()
            }
        })?;

        tracing::info!(review_id = id, movie_id = request.movie_id, user_id, "review created");

        self.get_by_id(id).await
    }

    /// Get review by id
    pub async fn get_by_id(&self, id: i64) -> CatalogResult<Review> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {} FROM reviews r WHERE r.id = ?1 AND r.deleted_at IS NULL",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| CatalogError::not_found("review", "id", id))
    }

    /// Reviews ordered by id
    pub async fn get_reviews_paginated(
        &self,
        filter: ReviewFilter,
        page: PageRequest,
    ) -> CatalogResult<Page<Review>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM reviews r");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM reviews r", REVIEW_COLUMNS));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY r.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = select.build_query_as::<Review>().fetch_all(&self.db).await?;

        Ok(Page::new(page, total, items))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: ReviewFilter) {
    builder.push(" WHERE r.deleted_at IS NULL");
    if let Some(movie_id) = filter.movie_id {
        builder.push(" AND r.movie_id = ").push_bind(movie_id);
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND r.user_id = ").push_bind(user_id);
    }
}
