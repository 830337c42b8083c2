/// Application context and dependency injection
use crate::{
    account::{AccountManager, RegisterRequest, Role, User},
    auth::TokenIssuer,
    catalog::{GenreManager, MovieRepository, MovieService, ReviewManager, StarManager},
    config::ServerConfig,
    db,
    error::{CatalogError, CatalogResult},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub token_issuer: Arc<TokenIssuer>,
    // Catalog
    pub genre_manager: Arc<GenreManager>,
    pub star_manager: Arc<StarManager>,
    pub movie_service: Arc<MovieService>,
    pub review_manager: Arc<ReviewManager>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> CatalogResult<Self> {
        // Validate configuration
        config.validate()?;

        let db = db::create_pool(
            &config.storage.database,
            db::DatabaseOptions {
                max_connections: config.storage.max_connections,
                ..Default::default()
            },
        )
        .await?;

        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let token_issuer = Arc::new(TokenIssuer::new(
            &config.authentication.jwt_secret,
            config.authentication.access_expiration,
        ));

        let genre_manager = GenreManager::new(db.clone());
        let star_manager = StarManager::new(db.clone());
        let movie_service = MovieService::new(
            MovieRepository::new(db.clone()),
            genre_manager.clone(),
            star_manager.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            account_manager: Arc::new(AccountManager::new(db.clone())),
            token_issuer,
            genre_manager: Arc::new(genre_manager),
            star_manager: Arc::new(star_manager),
            movie_service: Arc::new(movie_service),
            review_manager: Arc::new(ReviewManager::new(db.clone())),
            db,
        })
    }

    /// Register the configured administrator, if any
    ///
    /// An administrator that already exists is left alone.
    pub async fn bootstrap_admin(&self) -> CatalogResult<Option<User>> {
        let Some(admin) = &self.config.admin else {
            return Ok(None);
        };

        let name_len = admin.name.chars().count();
        if !(5..=16).contains(&name_len) {
            return Err(CatalogError::Validation(
                "Admin name must be 5 to 16 characters".to_string(),
            ));
        }

        let request = RegisterRequest {
            username: admin.name.clone(),
            email: admin.email.clone(),
            password: admin.password.clone(),
        };
        request.validate()?;

        match self
            .account_manager
            .create_account(&request.username, &request.email, &request.password, Role::Admin)
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = user.id, username = %user.username, "admin user created");
                Ok(Some(user))
            }
            Err(CatalogError::AlreadyExists { .. }) => {
                tracing::info!(username = %admin.name, "admin user already exists");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
