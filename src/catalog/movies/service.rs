/// Movie service: input checks, repository calls and aggregate assembly
use super::{
    MovieDetails, MovieFilter, MovieInput, MovieRecord, MovieRepository, UpdateMovieInput,
};
use crate::{
    catalog::{genres::GenreManager, stars::StarManager, Movie, Page, PageRequest},
    error::{CatalogError, CatalogResult},
};
use std::collections::HashSet;

/// Movie service
#[derive(Clone)]
pub struct MovieService {
    repository: MovieRepository,
    genres: GenreManager,
    stars: StarManager,
}

impl MovieService {
    pub fn new(repository: MovieRepository, genres: GenreManager, stars: StarManager) -> Self {
        Self {
            repository,
            genres,
            stars,
        }
    }

    /// Create a movie and return the assembled aggregate
    pub async fn create(&self, input: &MovieInput) -> CatalogResult<MovieDetails> {
        check_unique_relations(input)?;

        let record = self.repository.create(input).await?;

        tracing::info!(movie_id = record.movie.id, title = %record.movie.title, "movie created");

        self.assemble(record).await
    }

    /// Get the assembled aggregate of a live movie
    pub async fn get_by_id(&self, id: i64) -> CatalogResult<MovieDetails> {
        let record = self.repository.get_by_id(id).await?;
        self.assemble(record).await
    }

    /// Replace a movie, guarded by `input.version`
    pub async fn update(&self, id: i64, input: &UpdateMovieInput) -> CatalogResult<MovieDetails> {
        check_unique_relations(&input.movie)?;

        let record = self.repository.update(id, input).await?;

        tracing::info!(movie_id = id, version = record.version, "movie updated");

        self.assemble(record).await
    }

    /// Soft-delete a movie
    pub async fn delete(&self, id: i64) -> CatalogResult<()> {
        self.repository.delete(id).await?;

        tracing::info!(movie_id = id, "movie deleted");

        Ok(())
    }

    pub async fn get_movies_paginated(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> CatalogResult<Page<Movie>> {
        self.repository.get_movies_paginated(filter, page).await
    }

    async fn assemble(&self, record: MovieRecord) -> CatalogResult<MovieDetails> {
        let genres = self.genres.get_by_movie_id(record.movie.id).await?;
        let cast = self.stars.get_by_movie_id(record.movie.id).await?;

        Ok(MovieDetails {
            movie: record.movie,
            description: record.description,
            version: record.version,
            genres,
            cast,
        })
    }
}

/// Reject repeated genre ids and repeated (star, role) credits
fn check_unique_relations(input: &MovieInput) -> CatalogResult<()> {
    let mut genres = HashSet::new();
    for genre_id in &input.genre_ids {
        if !genres.insert(genre_id) {
            return Err(CatalogError::Validation(format!(
                "genre {} is listed more than once",
                genre_id
            )));
        }
    }

    let mut credits = HashSet::new();
    for credit in &input.cast {
        if !credits.insert((credit.star_id, credit.role.as_str())) {
            return Err(CatalogError::Validation(format!(
                "star {} is credited as {} more than once",
                credit.star_id, credit.role
            )));
        }
    }

    Ok(())
}
