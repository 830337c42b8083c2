/// Authentication extractors and token utilities
use crate::{
    account::{Role, User},
    context::AppContext,
    error::{CatalogError, CatalogResult},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Issues and verifies HS256 access tokens
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiration: i64,
}

impl TokenIssuer {
    pub fn new(jwt_secret: &str, access_expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            access_expiration: i64::try_from(access_expiration_secs).unwrap_or(i64::MAX),
        }
    }

    /// Generate an access token for a user
    pub fn issue(&self, user: &User) -> CatalogResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            user_id: user.id,
            role: user.role,
            iat: now,
            exp: now.saturating_add(self.access_expiration),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CatalogError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> CatalogResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT verification failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        CatalogError::Authentication("Token has expired".to_string())
                    }
                    _ => CatalogError::Authentication("unauthorized user".to_string()),
                }
            })
    }
}

/// Authenticated context - any valid bearer token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Role,
}

impl AuthContext {
    /// Allow the subject itself or an admin
    pub fn ensure_self_or_admin(&self, user_id: i64) -> CatalogResult<()> {
        if self.user_id == user_id || self.role.can_act_as(Role::Admin) {
            Ok(())
        } else {
            Err(forbidden())
        }
    }

    fn require(self, required: Role) -> CatalogResult<Self> {
        if self.role.can_act_as(required) {
            Ok(self)
        } else {
            tracing::debug!(
                user_id = self.user_id,
                role = self.role.as_str(),
                required = required.as_str(),
                "insufficient role"
            );
            Err(forbidden())
        }
    }
}

fn forbidden() -> CatalogError {
    CatalogError::Authorization("not enough permissions".to_string())
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = CatalogError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| CatalogError::Authentication("unauthorized user".to_string()))?;

        let claims = state.token_issuer.verify(bearer.token())?;

        Ok(AuthContext {
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}

/// Editor authentication context - requires editor role or higher
#[derive(Debug, Clone)]
pub struct EditorAuthContext(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppContext> for EditorAuthContext {
    type Rejection = CatalogError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;
        Ok(EditorAuthContext(auth.require(Role::Editor)?))
    }
}

/// Admin authentication context - requires admin role
#[derive(Debug, Clone)]
pub struct AdminAuthContext(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuthContext {
    type Rejection = CatalogError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;
        Ok(AdminAuthContext(auth.require(Role::Admin)?))
    }
}
