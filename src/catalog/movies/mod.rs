/// Movie aggregate: a movie plus its ordered genre and cast links
///
/// The repository owns the transactional write protocol (optimistic version
/// check, relation reconciliation); the service validates input and
/// re-assembles the detailed aggregate from the genre and star managers.

mod repository;
mod service;

pub use repository::{MovieFilter, MovieRepository, MovieRecord};
pub use service::MovieService;

use crate::catalog::{Genre, MovieCredit};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Movie summary used in list responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Full movie aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    pub description: String,
    pub version: i64,
    pub genres: Vec<Genre>,
    pub cast: Vec<MovieCredit>,
}

/// One cast entry as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CastInput {
    pub star_id: i64,
    #[validate(length(min = 1, max = 32))]
    pub role: String,
    pub details: Option<String>,
}

/// Movie attributes and complete relation lists, in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MovieInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    #[validate(nested)]
    pub cast: Vec<CastInput>,
}

/// Update request: the full replacement plus the version it was read at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateMovieInput {
    #[validate(range(min = 0))]
    pub version: i64,
    #[serde(flatten)]
    #[validate(nested)]
    pub movie: MovieInput,
}
