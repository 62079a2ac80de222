//! JWT authentication module.
//!
//! Login issues an HS256 access token; logout puts its `jti` on the
//! revocation list kept by the user repository. Protected handlers take an
//! [`AuthUser`] argument, which rejects missing, invalid, expired and revoked
//! tokens with 401.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use sloths_core::User;

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub username: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID, the key of the revocation list
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// A freshly signed token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(secret: &str, access_lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    /// Generate an access token for a user.
    pub fn issue(&self, user: &User) -> Result<IssuedToken, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    /// Validate signature and expiry, then decode the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "Rejected token");
                ApiError::unauthorized("Invalid or expired token")
            })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The authenticated caller of a protected route.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Expected a Bearer token"))?;

        let claims = state.jwt.validate(token)?;

        let users = state.db.users();
        if users.is_token_revoked(&claims.jti).await? {
            debug!(user_id = %claims.sub, "Revoked token presented");
            return Err(ApiError::unauthorized("Token has been revoked"));
        }

        let user = match users.get(&claims.sub).await {
            Ok(user) => user,
            Err(sloths_db::DbError::NotFound { .. }) => {
                warn!(user_id = %claims.sub, "Token for deleted user");
                return Err(ApiError::unauthorized("Invalid or expired token"));
            }
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            warn!(username = %user.username, "Token for inactive user");
            return Err(ApiError::unauthorized("User account is disabled"));
        }

        Ok(AuthUser { user, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "user-001".to_string(),
            username: "admin".to_string(),
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600);

        let issued = manager.issue(&user()).unwrap();
        let claims = manager.validate(&issued.token).unwrap();

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, "user-001");
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_each_token_has_its_own_jti() {
        let manager = JwtManager::new("test-secret", 3600);
        let a = manager.issue(&user()).unwrap();
        let b = manager.issue(&user()).unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = JwtManager::new("secret-a", 3600).issue(&user()).unwrap();
        let err = JwtManager::new("secret-b", 3600)
            .validate(&issued.token)
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new("test-secret", -3600);
        let issued = manager.issue(&user()).unwrap();
        assert!(manager.validate(&issued.token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
