use crate::config::tokens::JwtSettings;
use crate::utils::auth::errors::AuthError;
use anyhow::Context;
use axum::extract::{FromRef, FromRequestParts};
use axum::{async_trait, RequestPartsExt};
use axum_extra::extract::CookieJar;
use http::header::AUTHORIZATION;
use http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

pub const ACCESS_COOKIE: &str = "jwt";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub jti: Uuid,
    pub user_id: Uuid,
    pub exp: u64,
}

impl Claims {
    pub fn new(user_id: Uuid, duration: Duration) -> Self {
        Self {
            jti: Uuid::new_v4(),
            user_id,
            exp: jsonwebtoken::get_current_timestamp() + duration.whole_seconds().unsigned_abs(),
        }
    }

    pub fn generate_jwt(&self, key: &Secret<String>) -> Result<String, AuthError> {
        Ok(encode(
            &Header::default(),
            &self,
            &EncodingKey::from_secret(key.expose_secret().as_bytes()),
        )
        .context("Failed to encrypt token")?)
    }

    pub fn decode_jwt(token: &str, key: &Secret<String>) -> Result<Self, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 5;

        let data = decode::<Self>(
            token,
            &DecodingKey::from_secret(key.expose_secret().as_bytes()),
            &validation,
        )
        .map_err(|_e| AuthError::InvalidToken)?;

        Ok(data.claims)
    }
}

/// `Authorization: Bearer` wins over the cookie when both are sent.
async fn find_token(parts: &mut Parts) -> Result<Option<String>, AuthError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::InvalidToken)?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;
        return Ok(Some(token.trim().to_string()));
    }

    let jar = parts
        .extract::<CookieJar>()
        .await
        .context("Failed to fetch cookie jar")?;
    Ok(jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()))
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    JwtSettings: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jwt = JwtSettings::from_ref(state);
        let token = find_token(parts).await?.ok_or(AuthError::MissingToken)?;
        Claims::decode_jwt(&token, &jwt.access)
    }
}
