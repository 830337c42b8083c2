/// Genre endpoints
use crate::{
    api::extract::{ApiPath, ValidatedJson},
    auth::EditorAuthContext,
    catalog::{genres::GenreRequest, Genre},
    context::AppContext,
    error::CatalogResult,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/genres", get(list_genres).post(create_genre))
        .route(
            "/genres/:id",
            get(get_genre).put(update_genre).delete(delete_genre),
        )
}

async fn create_genre(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ValidatedJson(req): ValidatedJson<GenreRequest>,
) -> CatalogResult<(StatusCode, Json<Genre>)> {
    let genre = ctx.genre_manager.create(&req.name).await?;

    Ok((StatusCode::CREATED, Json(genre)))
}

async fn list_genres(State(ctx): State<AppContext>) -> CatalogResult<Json<Vec<Genre>>> {
    Ok(Json(ctx.genre_manager.get_all().await?))
}

async fn get_genre(State(ctx): State<AppContext>, ApiPath(id): ApiPath<i64>) -> CatalogResult<Json<Genre>> {
    Ok(Json(ctx.genre_manager.get_by_id(id).await?))
}

async fn update_genre(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<GenreRequest>,
) -> CatalogResult<Json<Genre>> {
    Ok(Json(ctx.genre_manager.update(id, &req.name).await?))
}

async fn delete_genre(
    State(ctx): State<AppContext>,
    _auth: EditorAuthContext,
    ApiPath(id): ApiPath<i64>,
) -> CatalogResult<StatusCode> {
    ctx.genre_manager.delete(id).await?;

    Ok(StatusCode::OK)
}
