/// Review read endpoints (creation lives under `/users/:id/reviews`)
use crate::{
    api::extract::{ApiPath, ApiQuery},
    catalog::{reviews::ReviewFilter, Page, PageRequest, Review},
    context::AppContext,
    error::CatalogResult,
};
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/reviews/:id", get(get_review))
}

#[derive(Debug, Deserialize)]
struct ListReviewsQuery {
    page: Option<u32>,
    size: Option<u32>,
    movie_id: Option<i64>,
    user_id: Option<i64>,
}

async fn list_reviews(
    State(ctx): State<AppContext>,
    ApiQuery(query): ApiQuery<ListReviewsQuery>,
) -> CatalogResult<Json<Page<Review>>> {
    let page = PageRequest::resolve(query.page, query.size, &ctx.config.pagination)?;
    let filter = ReviewFilter {
        movie_id: query.movie_id,
        user_id: query.user_id,
    };

    Ok(Json(ctx.review_manager.get_reviews_paginated(filter, page).await?))
}

async fn get_review(State(ctx): State<AppContext>, ApiPath(id): ApiPath<i64>) -> CatalogResult<Json<Review>> {
    Ok(Json(ctx.review_manager.get_by_id(id).await?))
}
