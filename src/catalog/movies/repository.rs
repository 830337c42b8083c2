/// Movie persistence and the transactional aggregate write protocol
use super::{CastInput, Movie, MovieInput, UpdateMovieInput};
use crate::{
    catalog::{
        genres::{GenreManager, GenreRelation},
        stars::{CastRelation, StarManager},
        Page, PageRequest,
    },
    db::relations::diff_relations,
    error::{CatalogError, CatalogResult},
};
use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const MOVIE_COLUMNS: &str = "m.id, m.title, m.release_date, m.created_at, m.deleted_at";

/// Stored movie row, without relations
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MovieRecord {
    #[sqlx(flatten)]
    pub movie: Movie,
    pub description: String,
    pub version: i64,
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    /// Only movies crediting this star
    pub star_id: Option<i64>,
    /// Free-text search over title and description
    pub search: Option<String>,
}

/// Movie repository
#[derive(Clone)]
pub struct MovieRepository {
    db: SqlitePool,
}

impl MovieRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a movie and its relation rows in one transaction
    pub async fn create(&self, input: &MovieInput) -> CatalogResult<MovieRecord> {
        let mut tx = self.db.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO movies (title, description, release_date, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.release_date)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sync_genres(&mut tx, &[], &GenreRelation::from_ids(id, &input.genre_ids)).await?;
        sync_cast(&mut tx, &[], &cast_relations(id, &input.cast)).await?;

        let record = fetch_record(&mut tx, id)
            .await?
            .ok_or_else(|| CatalogError::internal(format!("movie {} vanished during insert", id)))?;

        tx.commit().await?;

        Ok(record)
    }

    /// Replace a movie's attributes and relations if `input.version` is current
    ///
    /// Fails with `NotFound` when the movie is absent or deleted and with
    /// `VersionMismatch` when it was modified since `input.version`. Nothing
    /// is written unless every step succeeds.
    pub async fn update(&self, id: i64, input: &UpdateMovieInput) -> CatalogResult<MovieRecord> {
        let movie = &input.movie;
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE movies
            SET version = version + 1, title = ?1, description = ?2, release_date = ?3
            WHERE id = ?4 AND version = ?5 AND deleted_at IS NULL
            "#,
        )
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(movie.release_date)
        .bind(id)
        .bind(input.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Re-read through the transaction to tell a missing movie from a stale version
            return Err(match fetch_record(&mut tx, id).await? {
                None => CatalogError::not_found("movie", "id", id),
                Some(_) => CatalogError::version_mismatch("movie", "id", id, input.version),
            });
        }

        let previous = GenreManager::get_relations_by_movie_id(&mut tx, id).await?;
        sync_genres(&mut tx, &previous, &GenreRelation::from_ids(id, &movie.genre_ids)).await?;

        let previous = StarManager::get_relations_by_movie_id(&mut tx, id).await?;
        sync_cast(&mut tx, &previous, &cast_relations(id, &movie.cast)).await?;

        let record = fetch_record(&mut tx, id)
            .await?
            .ok_or_else(|| CatalogError::not_found("movie", "id", id))?;

        tx.commit().await?;

        Ok(record)
    }

    /// Soft-delete a movie; relation rows are kept
    pub async fn delete(&self, id: i64) -> CatalogResult<()> {
        let result =
            sqlx::query("UPDATE movies SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("movie", "id", id));
        }

        Ok(())
    }

    /// Get a live movie by id
    pub async fn get_by_id(&self, id: i64) -> CatalogResult<MovieRecord> {
        let mut conn = self.db.acquire().await?;

        fetch_record(&mut conn, id)
            .await?
            .ok_or_else(|| CatalogError::not_found("movie", "id", id))
    }

    /// Live movies matching `filter`
    ///
    /// Ordered by id, or with a search term by relevance (title matches
    /// before description-only matches) and then id.
    pub async fn get_movies_paginated(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> CatalogResult<Page<Movie>> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM movies m");
        push_filters(&mut count, filter.star_id, pattern.as_deref());
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM movies m", MOVIE_COLUMNS));
        push_filters(&mut select, filter.star_id, pattern.as_deref());
        match pattern.as_deref() {
            Some(pattern) => {
                select
                    .push(" ORDER BY CASE WHEN m.title LIKE ")
                    .push_bind(pattern.to_string())
                    .push(" ESCAPE '\\' THEN 0 ELSE 1 END, m.id");
            }
            None => {
                select.push(" ORDER BY m.id");
            }
        }
        select
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = select.build_query_as::<Movie>().fetch_all(&self.db).await?;

        Ok(Page::new(page, total, items))
    }

    /// Whether a live movie with this id exists
    pub async fn exists(&self, id: i64) -> CatalogResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM movies WHERE id = ?1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        Ok(count > 0)
    }
}

async fn fetch_record(conn: &mut SqliteConnection, id: i64) -> CatalogResult<Option<MovieRecord>> {
    let record = sqlx::query_as::<_, MovieRecord>(&format!(
        "SELECT {}, m.description, m.version FROM movies m WHERE m.id = ?1 AND m.deleted_at IS NULL",
        MOVIE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record)
}

fn cast_relations(movie_id: i64, cast: &[CastInput]) -> Vec<CastRelation> {
    cast.iter()
        .zip(0..)
        .map(|(credit, order_no)| CastRelation {
            movie_id,
            star_id: credit.star_id,
            role: credit.role.clone(),
            details: credit.details.clone(),
            order_no,
        })
        .collect()
}

async fn sync_genres(
    conn: &mut SqliteConnection,
    previous: &[GenreRelation],
    next: &[GenreRelation],
) -> CatalogResult<()> {
    let diff = diff_relations(previous, next, GenreRelation::key)?;

    for relation in &diff.removed {
        GenreManager::delete_relation(conn, relation).await?;
    }
    for relation in &diff.added {
        GenreManager::insert_relation(conn, relation).await?;
    }

    tracing::debug!(
        removed = diff.removed.len(),
        added = diff.added.len(),
        "genre links reconciled"
    );

    Ok(())
}

async fn sync_cast(
    conn: &mut SqliteConnection,
    previous: &[CastRelation],
    next: &[CastRelation],
) -> CatalogResult<()> {
    let diff = diff_relations(previous, next, CastRelation::key)?;

    for relation in &diff.removed {
        StarManager::delete_relation(conn, relation).await?;
    }
    for relation in &diff.added {
        StarManager::insert_relation(conn, relation).await?;
    }

    tracing::debug!(
        removed = diff.removed.len(),
        added = diff.added.len(),
        "cast links reconciled"
    );

    Ok(())
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, star_id: Option<i64>, pattern: Option<&str>) {
    builder.push(" WHERE m.deleted_at IS NULL");

    if let Some(star_id) = star_id {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM movie_stars ms JOIN stars s ON s.id = ms.star_id \
                 WHERE ms.movie_id = m.id AND s.deleted_at IS NULL AND ms.star_id = ",
            )
            .push_bind(star_id)
            .push(")");
    }

    if let Some(pattern) = pattern {
        builder
            .push(" AND (m.title LIKE ")
            .push_bind(pattern.to_string())
            .push(" ESCAPE '\\' OR m.description LIKE ")
            .push_bind(pattern.to_string())
            .push(" ESCAPE '\\')");
    }
}

/// Substring LIKE pattern with wildcards in `term` escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
