/// Star management and the movie cast link rows
use crate::{
    catalog::{Page, PageRequest},
    error::{CatalogError, CatalogResult},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use validator::Validate;

const STAR_COLUMNS: &str = "s.id, s.first_name, s.middle_name, s.last_name, s.birth_date, \
                            s.birth_place, s.death_date, s.bio, s.created_at, s.deleted_at";

/// Star record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Star {
    pub id: i64,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A star credited in a movie under a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieCredit {
    pub star: Star,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Link between a movie and a star under one role, positioned by `order_no`
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CastRelation {
    pub movie_id: i64,
    pub star_id: i64,
    pub role: String,
    pub details: Option<String>,
    pub order_no: i64,
}

impl CastRelation {
    pub fn key(&self) -> (i64, i64, String) {
        (self.movie_id, self.star_id, self.role.clone())
    }
}

/// Create / update request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StarRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(max = 50))]
    pub middle_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[validate(length(max = 100))]
    pub birth_place: Option<String>,
    pub death_date: Option<NaiveDate>,
    pub bio: Option<String>,
}

/// Star manager
#[derive(Clone)]
pub struct StarManager {
    db: SqlitePool,
}

impl StarManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a star
    pub async fn create(&self, request: &StarRequest) -> CatalogResult<Star> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO stars (first_name, middle_name, last_name, birth_date, birth_place, death_date, bio, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id
            "#,
        )
        .bind(&request.first_name)
        .bind(&request.middle_name)
        .bind(&request.last_name)
        .bind(request.birth_date)
        .bind(&request.birth_place)
        .bind(request.death_date)
        .bind(&request.bio)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(star_id = id, "star created");

        self.get_by_id(id).await
    }

    /// Get star by id
    pub async fn get_by_id(&self, id: i64) -> CatalogResult<Star> {
        sqlx::query_as::<_, Star>(&format!(
            "SELECT {} FROM stars s WHERE s.id = ?1 AND s.deleted_at IS NULL",
            STAR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| CatalogError::not_found("star", "id", id))
    }

    /// Stars ordered by id, optionally only those credited in `movie_id`
    pub async fn get_stars_paginated(
        &self,
        movie_id: Option<i64>,
        page: PageRequest,
    ) -> CatalogResult<Page<Star>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM stars s");
        push_filters(&mut count, movie_id);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM stars s", STAR_COLUMNS));
        push_filters(&mut select, movie_id);
        select
            .push(" ORDER BY s.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = select.build_query_as::<Star>().fetch_all(&self.db).await?;

        Ok(Page::new(page, total, items))
    }

    /// Replace a star's attributes
    pub async fn update(&self, id: i64, request: &StarRequest) -> CatalogResult<Star> {
        let result = sqlx::query(
            r#"
            UPDATE stars
            SET first_name = ?1, middle_name = ?2, last_name = ?3, birth_date = ?4,
                birth_place = ?5, death_date = ?6, bio = ?7
            WHERE id = ?8 AND deleted_at IS NULL
            "#,
        )
        .bind(&request.first_name)
        .bind(&request.middle_name)
        .bind(&request.last_name)
        .bind(request.birth_date)
        .bind(&request.birth_place)
        .bind(request.death_date)
        .bind(&request.bio)
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("star", "id", id));
        }

        tracing::info!(star_id = id, "star updated");

        self.get_by_id(id).await
    }

    /// Soft-delete a star
    pub async fn delete(&self, id: i64) -> CatalogResult<()> {
        let result =
            sqlx::query("UPDATE stars SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("star", "id", id));
        }

        tracing::info!(star_id = id, "star deleted");

        Ok(())
    }

    /// Credits of a movie in cast order
    pub async fn get_by_movie_id(&self, movie_id: i64) -> CatalogResult<Vec<MovieCredit>> {
        #[derive(FromRow)]
        struct CreditRow {
            #[sqlx(flatten)]
            star: Star,
            role: String,
            details: Option<String>,
        }

        let rows = sqlx::query_as::<_, CreditRow>(&format!(
            r#"
            SELECT {}, ms.role, ms.details
            FROM movie_stars ms
            JOIN stars s ON s.id = ms.star_id
            WHERE ms.movie_id = ?1 AND s.deleted_at IS NULL
            ORDER BY ms.order_no
            "#,
            STAR_COLUMNS
        ))
        .bind(movie_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MovieCredit {
                star: row.star,
                role: row.role,
                details: row.details,
            })
            .collect())
    }

    /// Stored cast rows of a movie in cast order, read through `conn`
    pub async fn get_relations_by_movie_id(
        conn: &mut SqliteConnection,
        movie_id: i64,
    ) -> CatalogResult<Vec<CastRelation>> {
        let relations = sqlx::query_as::<_, CastRelation>(
            r#"
            SELECT movie_id, star_id, role, details, order_no
            FROM movie_stars
            WHERE movie_id = ?1
            ORDER BY order_no
            "#,
        )
        .bind(movie_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(relations)
    }

    pub(crate) async fn insert_relation(
        conn: &mut SqliteConnection,
        relation: &CastRelation,
    ) -> CatalogResult<()> {
        // Soft-deleted stars cannot be credited
        let result = sqlx::query(
            r#"
            INSERT INTO movie_stars (movie_id, star_id, role, details, order_no)
            SELECT ?1, id, ?3, ?4, ?5 FROM stars WHERE id = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(relation.movie_id)
        .bind(relation.star_id)
        .bind(&relation.role)
        .bind(&relation.details)
        .bind(relation.order_no)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::Validation(format!(
                "star {} does not exist",
                relation.star_id
            )));
        }

        Ok(())
    }

    pub(crate) async fn delete_relation(
        conn: &mut SqliteConnection,
        relation: &CastRelation,
    ) -> CatalogResult<()> {
        sqlx::query("DELETE FROM movie_stars WHERE movie_id = ?1 AND star_id = ?2 AND role = ?3")
            .bind(relation.movie_id)
            .bind(relation.star_id)
            .bind(&relation.role)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, movie_id: Option<i64>) {
    builder.push(" WHERE s.deleted_at IS NULL");
    if let Some(movie_id) = movie_id {
        builder
            .push(" AND s.id IN (SELECT star_id FROM movie_stars WHERE movie_id = ")
            .push_bind(movie_id)
            .push(")");
    }
}
