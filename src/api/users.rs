/// User profile and role endpoints
use crate::{
    account::{Role, UpdateBioRequest, User},
    api::extract::{ApiPath, ValidatedJson},
    auth::{AdminAuthContext, AuthContext},
    catalog::{reviews::ReviewRequest, Review},
    context::AppContext,
    error::CatalogResult,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users/username/:username", get(get_user_by_username))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/role/:role", put(update_role))
        .route("/users/:id/reviews", post(create_review))
}

async fn get_user(State(ctx): State<AppContext>, ApiPath(id): ApiPath<i64>) -> CatalogResult<Json<User>> {
    Ok(Json(ctx.account_manager.get_account(id).await?))
}

async fn get_user_by_username(
    State(ctx): State<AppContext>,
    ApiPath(username): ApiPath<String>,
) -> CatalogResult<Json<User>> {
    Ok(Json(ctx.account_manager.get_account_by_username(&username).await?))
}

/// Update the caller's own profile (or any profile, as admin)
async fn update_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateBioRequest>,
) -> CatalogResult<Json<User>> {
    auth.ensure_self_or_admin(id)?;

    Ok(Json(ctx.account_manager.update_bio(id, req.bio.as_deref()).await?))
}

async fn update_role(
    State(ctx): State<AppContext>,
    AdminAuthContext(auth): AdminAuthContext,
    ApiPath((id, role)): ApiPath<(i64, String)>,
) -> CatalogResult<Json<User>> {
    let role = Role::parse(&role)?;
    let user = ctx.account_manager.update_role(id, role).await?;

    tracing::info!(admin_id = auth.user_id, user_id = id, role = role.as_str(), "role changed");

    Ok(Json(user))
}

async fn delete_user(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> CatalogResult<StatusCode> {
    auth.ensure_self_or_admin(id)?;
    ctx.account_manager.delete_account(id).await?;

    Ok(StatusCode::OK)
}

/// Post a review as the path user
async fn create_review(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiPath(user_id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<ReviewRequest>,
) -> CatalogResult<(StatusCode, Json<Review>)> {
    auth.ensure_self_or_admin(user_id)?;

    let review = ctx.review_manager.create(user_id, &req).await?;

    Ok((StatusCode::CREATED, Json(review)))
}
