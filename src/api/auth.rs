/// Registration and login endpoints
use crate::{
    account::{LoginRequest, LoginResponse, RegisterRequest, Role, User},
    api::extract::ValidatedJson,
    context::AppContext,
    error::CatalogResult,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Register a new account with the `user` role
async fn register(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> CatalogResult<(StatusCode, Json<User>)> {
    let user = ctx
        .account_manager
        .create_account(&req.username, &req.email, &req.password, Role::User)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for an access token
async fn login(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> CatalogResult<Json<LoginResponse>> {
    let user = ctx.account_manager.login(&req.email, &req.password).await?;
    let access_token = ctx.token_issuer.issue(&user)?;

    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(LoginResponse { access_token }))
}
