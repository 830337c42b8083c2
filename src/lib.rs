/// Cinelog - movie review catalog
///
/// REST API over a SQLite catalog of movies, genres, stars, reviews and
/// users, with JWT authentication and user/editor/admin roles.

pub mod account;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod server;

pub use context::AppContext;
pub use error::{CatalogError, CatalogResult};
