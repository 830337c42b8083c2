/// Genre management and the movie/genre link rows
use crate::{
    db,
    error::{CatalogError, CatalogResult},
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use validator::Validate;

/// Genre record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Link between a movie and a genre, positioned by `order_no`
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GenreRelation {
    pub movie_id: i64,
    pub genre_id: i64,
    pub order_no: i64,
}

impl GenreRelation {
    pub fn key(&self) -> (i64, i64) {
        (self.movie_id, self.genre_id)
    }

    /// Relation rows for an ordered list of genre ids
    pub fn from_ids(movie_id: i64, genre_ids: &[i64]) -> Vec<Self> {
        genre_ids
            .iter()
            .zip(0..)
            .map(|(&genre_id, order_no)| GenreRelation {
                movie_id,
                genre_id,
                order_no,
            })
            .collect()
    }
}

/// Create / rename request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenreRequest {
    #[validate(length(min = 3, max = 32))]
    pub name: String,
}

/// Genre manager
#[derive(Clone)]
pub struct GenreManager {
    db: SqlitePool,
}

impl GenreManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a genre
    pub async fn create(&self, name: &str) -> CatalogResult<Genre> {
        let id: i64 = sqlx::query_scalar("INSERT INTO genres (name) VALUES (?1) RETURNING id")
            .bind(name)
            .fetch_one(&self.db)
            .await
            .map_err(|e| duplicate_name(e, name))?;

        tracing::info!(genre_id = id, name, "genre created");

        Ok(Genre {
            id,
            name: name.to_string(),
        })
    }

    /// All genres ordered by id
    pub async fn get_all(&self) -> CatalogResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        Ok(genres)
    }

    /// Get genre by id
    pub async fn get_by_id(&self, id: i64) -> CatalogResult<Genre> {
        sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| CatalogError::not_found("genre", "id", id))
    }

    /// Rename a genre
    pub async fn update(&self, id: i64, name: &str) -> CatalogResult<Genre> {
        let result = sqlx::query("UPDATE genres SET name = ?1 WHERE id = ?2")
            .bind(name)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| duplicate_name(e, name))?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("genre", "id", id));
        }

        tracing::info!(genre_id = id, name, "genre updated");

        Ok(Genre {
            id,
            name: name.to_string(),
        })
    }

    /// Delete a genre; its movie links cascade away
    pub async fn delete(&self, id: i64) -> CatalogResult<()> {
        let result = sqlx::query("DELETE FROM genres WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("genre", "id", id));
        }

        tracing::info!(genre_id = id, "genre deleted");

        Ok(())
    }

    /// Genres of a movie in link order
    pub async fn get_by_movie_id(&self, movie_id: i64) -> CatalogResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM movie_genres mg
            JOIN genres g ON g.id = mg.genre_id
            WHERE mg.movie_id = ?1
            ORDER BY mg.order_no
            "#,
        )
        .bind(movie_id)
        .fetch_all(&self.db)
        .await?;

        Ok(genres)
    }

    /// Stored link rows of a movie in link order, read through `conn`
    pub async fn get_relations_by_movie_id(
        conn: &mut SqliteConnection,
        movie_id: i64,
    ) -> CatalogResult<Vec<GenreRelation>> {
        let relations = sqlx::query_as::<_, GenreRelation>(
            "SELECT movie_id, genre_id, order_no FROM movie_genres WHERE movie_id = ?1 ORDER BY order_no",
        )
        .bind(movie_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(relations)
    }

    pub(crate) async fn insert_relation(
        conn: &mut SqliteConnection,
        relation: &GenreRelation,
    ) -> CatalogResult<()> {
        sqlx::query("INSERT INTO movie_genres (movie_id, genre_id, order_no) VALUES (?1, ?2, ?3)")
            .bind(relation.movie_id)
            .bind(relation.genre_id)
            .bind(relation.order_no)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                if db::is_foreign_key_violation(&e) {
                    CatalogError::Validation(format!("genre {} does not exist", relation.genre_id))
                } else {
                    e.into()
                }
            })?;

        Ok(())
    }

    pub(crate) async fn delete_relation(
        conn: &mut SqliteConnection,
        relation: &GenreRelation,
    ) -> CatalogResult<()> {
        sqlx::query("DELETE FROM movie_genres WHERE movie_id = ?1 AND genre_id = ?2")
            .bind(relation.movie_id)
            .bind(relation.genre_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

fn duplicate_name(e: sqlx::Error, name: &str) -> CatalogError {
    if db::is_unique_violation(&e) {
        CatalogError::already_exists("genre", "name", name)
    } else {
        e.into()
    }
}
