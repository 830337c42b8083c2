/// API routes and handlers
pub mod auth;
pub mod extract;
pub mod genres;
pub mod movies;
pub mod reviews;
pub mod stars;
pub mod users;

use crate::context::AppContext;
use axum::Router;

/// Build API routes, mounted under `/api`
pub fn routes() -> Router<AppContext> {
    let api = Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(genres::routes())
        .merge(stars::routes())
        .merge(movies::routes())
        .merge(reviews::routes());

    Router::new().nest("/api", api)
}
