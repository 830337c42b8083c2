/// Movie endpoints
use crate::{
    api::extract::{ApiPath, ApiQuery, ValidatedJson},
    auth::EditorAuthContext,
    catalog::{
        movies::{MovieFilter, MovieInput, UpdateMovieInput},
        Movie, MovieDetails, Page, PageRequest,
    },
    context::AppContext,
    error::CatalogResult,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/:id",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
}

#[derive(Debug, Deserialize)]
struct ListMoviesQuery {
    page: Option<u32>,
    size: Option<u32>,
    star_id: Option<i64>,
    /// Search term
    q: Option<String>,
}

async fn create_movie(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ValidatedJson(req): ValidatedJson<MovieInput>,
) -> CatalogResult<(StatusCode, Json<MovieDetails>)> {
    let movie = ctx.movie_service.create(&req).await?;

    Ok((StatusCode::CREATED, Json(movie)))
}

async fn list_movies(
    State(ctx): State<AppContext>,
    ApiQuery(query): ApiQuery<ListMoviesQuery>,
) -> CatalogResult<Json<Page<Movie>>> {
    let page = PageRequest::resolve(query.page, query.size, &ctx.config.pagination)?;
    let filter = MovieFilter {
        star_id: query.star_id,
        search: query.q,
    };

    Ok(Json(ctx.movie_service.get_movies_paginated(&filter, page).await?))
}

async fn get_movie(
    State(ctx): State<AppContext>,
    ApiPath(id): ApiPath<i64>,
) -> CatalogResult<Json<MovieDetails>> {
    Ok(Json(ctx.movie_service.get_by_id(id).await?))
}

/// Replace a movie; `version` must be the one last read
async fn update_movie(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateMovieInput>,
) -> CatalogResult<Json<MovieDetails>> {
    Ok(Json(ctx.movie_service.update(id, &req).await?))
}

async fn delete_movie(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ApiPath(id): ApiPath<i64>,
) -> CatalogResult<StatusCode> {
    ctx.movie_service.delete(id).await?;

    Ok(StatusCode::OK)
}
