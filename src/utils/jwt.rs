use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::models::User;

/// Access token claims, inserted into request extensions by `AuthMiddleware`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub username: String,
    pub fullname: String,
    pub exp: usize, // expiration time
    pub iat: usize, // issued at
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn issued_window(ttl_seconds: i64) -> (usize, usize) {
    let now = chrono::Utc::now().timestamp();
    (now as usize, (now + ttl_seconds) as usize)
}

fn user_id_of(user: &User) -> Result<String, ApiError> {
    user.id
        .map(|oid| oid.to_hex())
        .ok_or_else(|| ApiError::internal("Cannot issue a token for an unsaved user"))
}

pub fn create_access_token(user: &User, config: &AuthConfig) -> Result<String, ApiError> {
    let (iat, exp) = issued_window(config.access_token_expiry);
    let claims = Claims {
        sub: user_id_of(user)?,
        email: user.email.clone(),
        username: user.username.clone(),
        fullname: user.fullname.clone(),
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.access_token_secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to create access token: {}", e)))
}

pub fn create_refresh_token(user: &User, config: &AuthConfig) -> Result<String, ApiError> {
    let (iat, exp) = issued_window(config.refresh_token_expiry);
    let claims = RefreshClaims {
        sub: user_id_of(user)?,
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to create refresh token: {}", e)))
}

pub fn issue_token_pair(user: &User, config: &AuthConfig) -> Result<TokenPair, ApiError> {
    Ok(TokenPair {
        access_token: create_access_token(user, config)?,
        refresh_token: create_refresh_token(user, config)?,
    })
}

pub fn verify_access_token(token: &str, config: &AuthConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.access_token_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn verify_refresh_token(
    token: &str,
    config: &AuthConfig,
) -> Result<RefreshClaims, jsonwebtoken::errors::Error> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access".to_string(),
            access_token_expiry: 3600,
            refresh_token_secret: "refresh".to_string(),
            refresh_token_expiry: 7200,
        }
    }

    fn saved_user() -> User {
        let mut user = User::new("jane", "jane@example.com", "Jane Doe", "a".into(), "".into(), "hash".into());
        user.id = Some(ObjectId::new());
        user
    }

    #[test]
    fn test_access_token_round_trip_carries_profile() {
        let user = saved_user();
        let token = create_access_token(&user, &config()).unwrap();
        let claims = verify_access_token(&token, &config()).unwrap();

        assert_eq!(claims.sub, user.id.unwrap().to_hex());
        assert_eq!(claims.username, "jane");
        assert_eq!(claims.fullname, "Jane Doe");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let pair = issue_token_pair(&saved_user(), &config()).unwrap();
        assert!(verify_access_token(&pair.refresh_token, &config()).is_err());
        assert!(verify_refresh_token(&pair.access_token, &config()).is_err());
        assert!(verify_refresh_token(&pair.refresh_token, &config()).is_ok());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = RefreshClaims {
            sub: ObjectId::new().to_hex(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"refresh"),
        )
        .unwrap();

        assert!(verify_refresh_token(&token, &config()).is_err());
    }

    #[test]
    fn test_unsaved_user_cannot_get_token() {
        let user = User::new("x", "x@example.com", "X", "a".into(), "".into(), "hash".into());
        assert!(create_access_token(&user, &config()).is_err());
    }
}
