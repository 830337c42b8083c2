/// Star endpoints
use crate::{
    api::extract::{ApiPath, ApiQuery, ValidatedJson},
    auth::EditorAuthContext,
    catalog::{stars::StarRequest, Page, PageRequest, Star},
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
        .route("/stars", get(list_stars).post(create_star))
        .route(
            "/stars/:id",
            get(get_star).put(update_star).delete(delete_star),
        )
}

#[derive(Debug, Deserialize)]
struct ListStarsQuery {
    page: Option<u32>,
    size: Option<u32>,
    movie_id: Option<i64>,
}

async fn create_star(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ValidatedJson(req): ValidatedJson<StarRequest>,
) -> CatalogResult<(StatusCode, Json<Star>)> {
    let star = ctx.star_manager.create(&req).await?;

    Ok((StatusCode::CREATED, Json(star)))
}

async fn list_stars(
    State(ctx): State<AppContext>,
    ApiQuery(query): ApiQuery<ListStarsQuery>,
) -> CatalogResult<Json<Page<Star>>> {
    let page = PageRequest::resolve(query.page, query.size, &ctx.config.pagination)?;

    Ok(Json(ctx.star_manager.get_stars_paginated(query.movie_id, page).await?))
}

async fn get_star(State(ctx): State<AppContext>, ApiPath(id): ApiPath<i64>) -> CatalogResult<Json<Star>> {
    Ok(Json(ctx.star_manager.get_by_id(id).await?))
}

async fn update_star(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<StarRequest>,
) -> CatalogResult<Json<Star>> {
    Ok(Json(ctx.star_manager.update(id, &req).await?))
}

async fn delete_star(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ApiPath(id): ApiPath<i64>,
) -> CatalogResult<StatusCode> {
    ctx.star_manager.delete(id).await?;

    Ok(StatusCode::OK)
}
